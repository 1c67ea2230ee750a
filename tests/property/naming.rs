// Copyright (c) 2025 - Cowboy AI, Inc.
//! Properties of naming conventions

use proptest::prelude::*;

use range_orchestrator::domain::naming::{pad, NamingConvention};

proptest! {
    /// Padding never loses information: the padded string parses back
    #[test]
    fn pad_round_trips(value in 0u32..1_000_000, width in 0usize..6) {
        let padded = pad(value, width);
        prop_assert!(padded.len() >= width);
        prop_assert_eq!(padded.parse::<u32>().unwrap(), value);
    }

    /// A master name always carries the prefix and is recognized as one
    #[test]
    fn master_names_are_recognizable(service in "[a-z][a-z0-9-]{0,20}") {
        let naming = NamingConvention::default();
        let name = naming.master_name(&service);
        prop_assert!(naming.is_master_name(&name));
        prop_assert!(name.ends_with(&service));
    }

    /// Singleton deployments never get a numeric suffix; multiples always do
    #[test]
    fn instance_suffix_matches_multiplicity(base in "[a-z]{1,10}", total in 2u32..50) {
        let naming = NamingConvention::default();
        prop_assert_eq!(naming.instance_name(&base, 0, 1), base.clone());
        for index in [0, total - 1] {
            let name = naming.instance_name(&base, index, total);
            prop_assert!(name.starts_with(&base));
            prop_assert!(name.len() > base.len());
        }
    }
}
