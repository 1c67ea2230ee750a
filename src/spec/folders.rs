// Copyright (c) 2025 - Cowboy AI, Inc.
//! Folder-Tree Validator
//!
//! Recursive descent over the `folders` section. A node is either a parent
//! folder (its value is a mapping of child folder nodes, validated
//! recursively) or a base folder (its value contains a `services` mapping
//! and must also specify `group`).
//!
//! Reserved keys are structural, not child-folder names, and are never
//! descended into. The source document is tree-shaped, so the recursion
//! strictly decreases by one nesting level per call and terminates on any
//! finite document.

use serde_yaml::Mapping;

use crate::diagnostics::{Severity, ValidationReport};
use crate::spec::document::{self, Document};
use crate::spec::schema::check_fields;

/// Keys that are folder attributes rather than child folder names
pub const RESERVED_KEYS: [&str; 5] = ["group", "master-group", "instances", "description", "enabled"];

/// Verify the syntax of a folder tree
///
/// `path` is the document path of the tree being validated, used as the
/// prefix for diagnostics from this level down.
pub fn verify_folders(value: &Document, path: &str) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(folders) = document::as_mapping(value) else {
        report.error(path, "Folder tree must be a mapping");
        return report;
    };

    for (key, value) in folders {
        let Some(name) = document::key_str(key) else {
            report.error(path, "Folder names must be strings");
            continue;
        };
        if RESERVED_KEYS.contains(&name) {
            continue;
        }

        let folder_path = format!("{path}/{name}");
        let Some(folder) = document::as_mapping(value) else {
            report.error(&folder_path, format!("Invalid configuration {name}"));
            continue;
        };

        // Instances shape is checked the same way for parent and base folders
        verify_instances(&mut report, &folder_path, name, folder);

        if document::contains(folder, "services") {
            verify_base_folder(&mut report, &folder_path, name, folder);
        } else {
            // Parent folder: its value is itself a folder tree
            report.merge(verify_folders(value, &folder_path));
        }
    }
    report
}

/// Check the `instances` shape of a folder node
///
/// A bare integer is accepted, as is a mapping carrying `number` (integer)
/// or `size-of` (group reference, existence deferred to deploy time).
fn verify_instances(report: &mut ValidationReport, path: &str, name: &str, folder: &Mapping) {
    let Some(instances) = document::get(folder, "instances") else {
        return;
    };

    if instances.as_u64().is_some() {
        return;
    }

    match document::as_mapping(instances) {
        Some(instances) => {
            if document::contains(instances, "number") {
                if document::get(instances, "number")
                    .and_then(serde_yaml::Value::as_u64)
                    .is_none()
                {
                    report.error(
                        path,
                        format!("Number of instances for folder '{name}' must be an Integer"),
                    );
                }
            } else if !document::contains(instances, "size-of") {
                report.error(
                    path,
                    format!("Must specify number of instances for folder '{name}'"),
                );
            }
        }
        None => report.error(
            path,
            format!("Must specify number of instances for folder '{name}'"),
        ),
    }
}

fn verify_base_folder(report: &mut ValidationReport, path: &str, name: &str, folder: &Mapping) {
    if !document::contains(folder, "group") {
        report.error(path, format!("No group specified for folder '{name}'"));
    }

    let Some(services) = document::get(folder, "services").and_then(document::as_mapping) else {
        report.error(path, format!("Services must be a mapping in folder '{name}'"));
        return;
    };

    for (key, value) in services {
        let service_name = document::key_str(key).unwrap_or("<non-string>");
        let service_path = format!("{path}/services/{service_name}");
        let Some(service) = document::as_mapping(value) else {
            report.error(
                service_path,
                format!("Service {service_name} must be a mapping in folder '{name}'"),
            );
            continue;
        };

        if !document::contains(service, "service") {
            report.error(
                &service_path,
                format!("Service {service_name} is unnamed in folder '{name}'"),
            );
        }
        if document::contains(service, "networks")
            && document::get(service, "networks")
                .and_then(|v| v.as_sequence())
                .is_none()
        {
            report.error(
                &service_path,
                format!(
                    "Network specifications must be a list for service '{service_name}' in folder '{name}'"
                ),
            );
        }
        if let Some(scoring) = document::get(service, "scoring") {
            verify_scoring(report, &service_path, service_name, scoring);
        }
    }
}

/// Verify the scoring definition of a service reference
fn verify_scoring(report: &mut ValidationReport, path: &str, service_name: &str, value: &Document) {
    let scoring_path = format!("{path}/scoring");
    let Some(scoring) = document::as_mapping(value) else {
        report.error(
            scoring_path,
            format!("Scoring must be a mapping for service {service_name}"),
        );
        return;
    };
    check_fields(
        report,
        &["ports", "protocols"],
        &scoring_path,
        scoring,
        Severity::Warning,
    );
    check_fields(report, &["criteria"], &scoring_path, scoring, Severity::Error);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify(yaml: &str) -> ValidationReport {
        verify_folders(&serde_yaml::from_str(yaml).unwrap(), "folders")
    }

    #[test]
    fn test_reserved_keys_skipped_at_any_depth() {
        let report = verify(
            r#"
outer:
  group: Admins
  instances: 2
  inner:
    group: Admins
    instances:
      number: 3
    leaf:
      group: Students
      instances: 4
      services:
        workstation:
          service: windows-client
"#,
        );
        assert_eq!(report.errors(), 0);
        assert_eq!(report.warnings(), 0);
    }

    #[test]
    fn test_non_mapping_folder_is_error() {
        let report = verify("broken: 42\n");
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_base_folder_requires_group() {
        let report = verify(
            "leaf:\n  services:\n    ws:\n      service: windows-client\n",
        );
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_unnamed_service_reference() {
        let report = verify(
            "leaf:\n  group: Students\n  services:\n    ws:\n      networks: [lan]\n",
        );
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_service_networks_must_be_list() {
        let report = verify(
            "leaf:\n  group: Students\n  services:\n    ws:\n      service: windows-client\n      networks: lan\n",
        );
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_instances_shapes() {
        assert_eq!(verify("f:\n  group: G\n  instances: 3\n  services:\n    s:\n      service: x\n").errors(), 0);
        assert_eq!(
            verify("f:\n  group: G\n  instances:\n    number: three\n  services:\n    s:\n      service: x\n").errors(),
            1
        );
        assert_eq!(
            verify("f:\n  group: G\n  instances:\n    size-of: Students\n  services:\n    s:\n      service: x\n").errors(),
            0
        );
        assert_eq!(
            verify("f:\n  group: G\n  instances:\n    color: blue\n  services:\n    s:\n      service: x\n").errors(),
            1
        );
    }

    #[test]
    fn test_scoring_requires_criteria() {
        let report = verify(
            r#"
leaf:
  group: Students
  services:
    web:
      service: web-server
      scoring:
        ports: [80]
        protocols: [tcp]
"#,
        );
        assert_eq!(report.errors(), 1);
        // ports/protocols present, so no warnings from scoring
        assert_eq!(report.warnings(), 0);
    }
}
