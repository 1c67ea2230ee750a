// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure Document Validator
//!
//! The infrastructure document is keyed by platform name. Only
//! `vmware-vsphere` and `docker` carry deep rules; the remaining recognized
//! platforms are accepted as forward-compatibility placeholders. An unknown
//! platform name is an error and its configuration is not inspected.

use serde_yaml::Mapping;

use crate::diagnostics::{Severity, ValidationReport};
use crate::domain::Hostname;
use crate::spec::document::{self, Document};
use crate::spec::schema::check_fields;

/// Platforms accepted without deep validation
const PASSTHROUGH_PLATFORMS: [&str; 3] = ["amazon-aws", "digital-ocean", "hyper-v"];

/// Verify the syntax of an infrastructure specification document
pub fn verify_infra_syntax(doc: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(root) = document::as_mapping(doc) else {
        report.error("infrastructure", "Infrastructure root must be a mapping");
        return report;
    };

    for (key, value) in root {
        let Some(platform) = document::key_str(key) else {
            report.error("infrastructure", "Platform keys must be strings");
            continue;
        };
        let path = format!("infrastructure/{platform}");
        let Some(config) = document::as_mapping(value) else {
            report.error(path, format!("Configuration for {platform} must be a mapping"));
            continue;
        };

        match platform {
            "vmware-vsphere" => verify_vsphere(&mut report, &path, config),
            "docker" => verify_docker(&mut report, &path, config),
            name if PASSTHROUGH_PLATFORMS.contains(&name) => {
                report.warning(path, format!("Platform {name} is not deeply validated"));
            }
            name => {
                report.error(path, format!("Unknown infrastructure platform: {name}"));
            }
        }
    }
    report
}

fn verify_vsphere(report: &mut ValidationReport, path: &str, config: &Mapping) {
    check_fields(
        report,
        &["port", "login-file", "datacenter", "datastore", "server-root", "vswitch"],
        path,
        config,
        Severity::Warning,
    );
    check_fields(
        report,
        &["hostname", "template-folder"],
        path,
        config,
        Severity::Error,
    );

    if let Some(hostname) = document::get_str(config, "hostname") {
        if let Err(err) = Hostname::new(hostname) {
            report.error(path, format!("Invalid vSphere hostname '{hostname}': {err}"));
        }
    }

    if let Some(login_file) = document::get_str(config, "login-file") {
        if document::read_json_file(login_file).is_err() {
            report.error(
                path,
                format!("Invalid vSphere infrastructure login-file: {login_file}"),
            );
        }
    }

    if document::contains(config, "host-list")
        && document::get(config, "host-list")
            .and_then(|v| v.as_sequence())
            .is_none()
    {
        report.error(path, "Invalid type for vSphere host-list");
    }

    if let Some(thresholds) = document::get(config, "thresholds") {
        match document::as_mapping(thresholds) {
            Some(thresholds) => {
                check_fields(
                    report,
                    &["folder", "service"],
                    path,
                    thresholds,
                    Severity::Error,
                );
            }
            None => report.error(path, "Thresholds must be a mapping"),
        }
    }
}

fn verify_docker(report: &mut ValidationReport, path: &str, config: &Mapping) {
    check_fields(report, &["url"], path, config, Severity::Warning);

    if let Some(registry) = document::get(config, "registry") {
        match document::as_mapping(registry) {
            Some(registry) => {
                check_fields(
                    report,
                    &["url", "login-file"],
                    path,
                    registry,
                    Severity::Error,
                );
            }
            None => report.error(path, "Registry must be a mapping"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify(yaml: &str) -> ValidationReport {
        verify_infra_syntax(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_vsphere_requires_hostname_and_template_folder() {
        let report = verify("vmware-vsphere:\n  datacenter: dc-01\n");
        assert_eq!(report.errors(), 2);
    }

    #[test]
    fn test_vsphere_hostname_must_be_valid() {
        let report = verify(
            "vmware-vsphere:\n  hostname: -bad-host\n  template-folder: Templates\n",
        );
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_vsphere_host_list_type() {
        let report = verify(
            "vmware-vsphere:\n  hostname: vc.lab.local\n  template-folder: T\n  host-list: esxi-01\n",
        );
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_vsphere_thresholds() {
        let report = verify(
            "vmware-vsphere:\n  hostname: vc.lab.local\n  template-folder: T\n  thresholds:\n    folder: 50\n",
        );
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_docker_registry_fields() {
        let report = verify("docker:\n  url: tcp://localhost:2375\n  registry:\n    url: r.example.com\n");
        assert_eq!(report.errors(), 1); // registry login-file missing
    }

    #[test]
    fn test_unknown_platform_is_error() {
        let report = verify("openstack:\n  url: x\n");
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_passthrough_platform_is_warning_only() {
        let report = verify("hyper-v:\n  anything: goes\n");
        assert_eq!(report.errors(), 0);
        assert_eq!(report.warnings(), 1);
    }
}
