// Copyright (c) 2025 - Cowboy AI, Inc.
//! Naming Conventions for Deployed Entities
//!
//! Master VMs, master folders, and numbered clone instances all follow a
//! fixed naming scheme so they can be located again on re-invocation and
//! recognized during cleanup. The scheme is carried as an explicit
//! configuration value rather than process-wide constants, so two
//! orchestrators with different conventions can coexist.

use serde::{Deserialize, Serialize};

/// Naming rules for masters and deployed instances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConvention {
    /// Prefix applied to master VM and master folder names
    pub master_prefix: String,
    /// Name of the folder holding all master instances
    pub master_root: String,
    /// Width instance numbers are zero-padded to
    pub instance_pad_width: usize,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            master_prefix: "(MASTER) ".to_string(),
            master_root: "MASTER_FOLDERS".to_string(),
            instance_pad_width: 2,
        }
    }
}

impl NamingConvention {
    /// Name of the master VM for a service
    pub fn master_name(&self, service: &str) -> String {
        format!("{}{}", self.master_prefix, service)
    }

    /// Name of a numbered instance
    ///
    /// The padded suffix is only appended when more than one instance is
    /// being deployed, so a singleton keeps its bare name.
    pub fn instance_name(&self, base: &str, index: u32, total: u32) -> String {
        if total > 1 {
            format!("{} {}", base, pad(index, self.instance_pad_width))
        } else {
            base.to_string()
        }
    }

    /// True when a deployed entity name carries the master prefix
    pub fn is_master_name(&self, name: &str) -> bool {
        name.starts_with(&self.master_prefix)
    }
}

/// Zero-pad a value to the given width
pub fn pad(value: u32, width: usize) -> String {
    format!("{value:0width$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad() {
        assert_eq!(pad(3, 2), "03");
        assert_eq!(pad(42, 2), "42");
        assert_eq!(pad(7, 3), "007");
        assert_eq!(pad(123, 2), "123");
    }

    #[test]
    fn test_master_name() {
        let naming = NamingConvention::default();
        assert_eq!(naming.master_name("web-server"), "(MASTER) web-server");
        assert!(naming.is_master_name("(MASTER) web-server"));
        assert!(!naming.is_master_name("web-server"));
    }

    #[test]
    fn test_instance_name_suffix_only_when_multiple() {
        let naming = NamingConvention::default();
        assert_eq!(naming.instance_name("workstation", 0, 5), "workstation 00");
        assert_eq!(naming.instance_name("workstation", 3, 5), "workstation 03");
        assert_eq!(naming.instance_name("workstation", 0, 1), "workstation");
    }
}
