// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Section Validator
//!
//! Per-network-class checks over the `networks` section. A network
//! collection must contain at least one recognized class; each named subnet
//! definition is then checked for subnet validity and address-space safety,
//! VLAN legality, and increment-flag legality.
//!
//! # Rules
//!
//! - `subnet` absent: warning (late-bound subnets are allowed)
//! - `subnet` malformed: error
//! - `subnet` in loopback/multicast/reserved space: error (unsafe to provision)
//! - `subnet` public but routable: warning (legal but discouraged)
//! - `vlan` only meaningful under `unique-networks`, and must be below the
//!   platform ceiling; present under any other class it is always an error
//! - `increment` only meaningful outside `unique-networks`, and must be a
//!   boolean; present under `unique-networks` it is always an error

use serde_yaml::{Mapping, Value};

use crate::diagnostics::ValidationReport;
use crate::domain::{SubnetCidr, VlanId};
use crate::spec::document::{self, Document};

/// Recognized network classes
pub const NETWORK_CLASSES: [&str; 3] = ["unique-networks", "generic-networks", "base-networks"];

/// Class of networks that exist once for the whole environment
pub const UNIQUE_NETWORKS: &str = "unique-networks";

/// Verify the syntax of the `networks` section
pub fn verify_networks(value: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(networks) = document::as_mapping(value) else {
        report.error("networks", "networks must be a mapping");
        return report;
    };

    if !NETWORK_CLASSES
        .into_iter()
        .any(|class| document::contains(networks, class))
    {
        report.error("networks", "Network specification exists but is empty!");
        return report;
    }

    for (key, value) in networks {
        let Some(class) = document::key_str(key) else {
            report.error("networks", "Network class keys must be strings");
            continue;
        };
        if !NETWORK_CLASSES.contains(&class) {
            report.warning(
                format!("networks/{class}"),
                format!("Unknown network class: {class}"),
            );
            continue;
        }
        match document::as_mapping(value) {
            Some(entries) => verify_class(&mut report, class, entries),
            None => report.error(
                format!("networks/{class}"),
                format!("Network class {class} must be a mapping"),
            ),
        }
    }
    report
}

fn verify_class(report: &mut ValidationReport, class: &str, entries: &Mapping) {
    for (key, value) in entries {
        let name = document::key_str(key).unwrap_or("<non-string>");
        let path = format!("networks/{class}/{name}");
        let Some(network) = document::as_mapping(value) else {
            report.error(path, format!("Network {name} must be a mapping"));
            continue;
        };

        verify_subnet(report, &path, class, name, network);
        verify_vlan(report, &path, class, name, network);
        verify_increment(report, &path, class, name, network);
    }
}

fn verify_subnet(
    report: &mut ValidationReport,
    path: &str,
    class: &str,
    name: &str,
    network: &Mapping,
) {
    let Some(subnet) = document::get(network, "subnet") else {
        report.warning(path, format!("No subnet specified for {class} {name}"));
        return;
    };

    let raw = match subnet {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    };

    match SubnetCidr::new(&raw) {
        Err(_) => report.error(path, format!("Invalid format for subnet '{raw}'")),
        Ok(subnet) => {
            if subnet.is_unusable() {
                report.error(path, format!("{class} {name} is in an invalid IP address space"));
            } else if !subnet.is_private() {
                report.warning(path, format!("Non-private subnet used for {class} {name}"));
            }
        }
    }
}

fn verify_vlan(
    report: &mut ValidationReport,
    path: &str,
    class: &str,
    name: &str,
    network: &Mapping,
) {
    let Some(vlan) = document::get(network, "vlan") else {
        return;
    };

    if class != UNIQUE_NETWORKS {
        report.error(
            path,
            format!("VLAN specification is not allowed for network {name}"),
        );
        return;
    }

    match vlan.as_u64().map(VlanId::new) {
        Some(Ok(vlan)) if !vlan.exceeds_platform_ceiling() => {}
        Some(Ok(_)) | Some(Err(_)) => report.error(
            path,
            format!(
                "VLAN must be less than {} for network {name}",
                VlanId::PLATFORM_CEILING
            ),
        ),
        None => report.error(path, format!("VLAN must be an integer for network {name}")),
    }
}

fn verify_increment(
    report: &mut ValidationReport,
    path: &str,
    class: &str,
    name: &str,
    network: &Mapping,
) {
    let Some(increment) = document::get(network, "increment") else {
        return;
    };

    if class == UNIQUE_NETWORKS {
        report.error(path, format!("Increment cannot be used for network {name}"));
    } else if increment.as_bool().is_none() {
        report.error(path, format!("Increment must be a boolean for network {name}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    fn verify(yaml: &str) -> ValidationReport {
        verify_networks(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_no_recognized_class() {
        let report = verify("{}");
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_missing_subnet_is_warning() {
        let report = verify("unique-networks:\n  wan: {}\n");
        assert_eq!(report.errors(), 0);
        assert_eq!(report.warnings(), 1);
    }

    #[test]
    fn test_malformed_subnet() {
        let report = verify("unique-networks:\n  wan:\n    subnet: not-a-subnet\n");
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_loopback_and_multicast_subnets_rejected() {
        let report = verify(
            "unique-networks:\n  a:\n    subnet: 127.0.0.0/8\n  b:\n    subnet: 224.0.0.0/4\n",
        );
        assert_eq!(report.errors(), 2);
    }

    #[test]
    fn test_public_subnet_is_warning() {
        let report = verify("unique-networks:\n  wan:\n    subnet: 8.8.8.0/24\n");
        assert_eq!(report.errors(), 0);
        assert_eq!(report.warnings(), 1);
    }

    #[test]
    fn test_vlan_ceiling() {
        let ok = verify("unique-networks:\n  wan:\n    subnet: 10.0.0.0/24\n    vlan: 100\n");
        assert_eq!(ok.errors(), 0);

        let high = verify("unique-networks:\n  wan:\n    subnet: 10.0.0.0/24\n    vlan: 2500\n");
        assert_eq!(high.errors(), 1);
    }

    #[test]
    fn test_vlan_illegal_outside_unique() {
        let report = verify("generic-networks:\n  lan:\n    subnet: 10.0.0.0/24\n    vlan: 5\n");
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_increment_illegal_under_unique() {
        let report = verify("unique-networks:\n  wan:\n    subnet: 10.0.0.0/24\n    increment: true\n");
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_increment_type_checked_elsewhere() {
        let ok = verify("generic-networks:\n  lan:\n    subnet: 10.0.0.0/24\n    increment: true\n");
        assert_eq!(ok.errors(), 0);

        let bad = verify("generic-networks:\n  lan:\n    subnet: 10.0.0.0/24\n    increment: yes please\n");
        assert_eq!(bad.errors(), 1);
    }

    #[test]
    fn test_unknown_class_is_warning() {
        let report = verify("unique-networks:\n  wan:\n    subnet: 10.0.0.0/24\nfancy-networks: {}\n");
        assert!(report
            .diagnostics()
            .iter()
            .any(|d| d.severity == Severity::Warning && d.path == "networks/fancy-networks"));
    }
}
