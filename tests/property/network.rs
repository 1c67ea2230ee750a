// Copyright (c) 2025 - Cowboy AI, Inc.
//! Properties of network value objects

use proptest::prelude::*;

use range_orchestrator::domain::{SubnetCidr, VlanId};

proptest! {
    /// Every syntactically valid IPv4 CIDR parses, and its canonical display
    /// form parses back to the same subnet
    #[test]
    fn cidr_display_round_trips(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255, prefix in 0u8..=32) {
        let subnet = SubnetCidr::new(format!("{a}.{b}.{c}.{d}/{prefix}")).unwrap();
        let reparsed = SubnetCidr::new(subnet.to_string()).unwrap();
        prop_assert_eq!(subnet, reparsed);
    }

    /// Canonicalization masks host bits: the network address is always
    /// contained in the stated prefix
    #[test]
    fn network_address_has_no_host_bits(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255, prefix in 0u8..=32) {
        let subnet = SubnetCidr::new(format!("{a}.{b}.{c}.{d}/{prefix}")).unwrap();
        let addr = u32::from(subnet.network());
        if prefix < 32 {
            let host_mask = u32::MAX >> prefix;
            prop_assert_eq!(addr & host_mask, 0);
        }
    }

    /// RFC 1918 private space is always provisionable
    #[test]
    fn private_subnets_are_usable(b in 0u8..=255, c in 0u8..=255, prefix in 8u8..=30) {
        let subnet = SubnetCidr::new(format!("10.{b}.{c}.0/{prefix}")).unwrap();
        prop_assert!(subnet.is_private());
        prop_assert!(!subnet.is_unusable());
    }

    /// Prefixes above 32 never parse
    #[test]
    fn oversized_prefixes_rejected(prefix in 33u32..1000) {
        let result = SubnetCidr::new(format!("10.0.0.0/{prefix}"));
        prop_assert!(result.is_err());
    }

    /// VLAN construction accepts exactly the 802.1Q range, and the platform
    /// ceiling splits it at 2000
    #[test]
    fn vlan_range_and_ceiling(id in 0u64..=8000) {
        match VlanId::new(id) {
            Ok(vlan) => {
                prop_assert!(id <= 4094);
                prop_assert_eq!(vlan.exceeds_platform_ceiling(), id >= 2000);
            }
            Err(_) => prop_assert!(id > 4094),
        }
    }
}
