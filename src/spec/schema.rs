// Copyright (c) 2025 - Cowboy AI, Inc.
//! Specification Schema Validator
//!
//! Recursive syntax checking over a parsed specification document. Each
//! section has a dedicated checker returning its own [`ValidationReport`];
//! the top-level pass dispatches to them and sums the results. Validation is
//! purely additive counting with no early exit, so a single run surfaces all
//! problems in a document rather than just the first.
//!
//! # Top-level rules
//!
//! - A required section that is absent is an error
//! - An optional section that is absent is logged informationally
//! - An unrecognized top-level key is a warning

use std::path::Path;

use serde_yaml::Mapping;
use tracing::{error, info};

use crate::diagnostics::{Severity, ValidationReport};
use crate::spec::document::{self, Document, DocumentError};
use crate::spec::folders::verify_folders;
use crate::spec::infrastructure::verify_infra_syntax;
use crate::spec::networks::verify_networks;

/// Sections required in every exercise specification
const REQUIRED_SECTIONS: [&str; 5] = ["metadata", "groups", "services", "networks", "folders"];

/// Sections that may be omitted
const OPTIONAL_SECTIONS: [&str; 1] = ["resources"];

/// Accepted spellings of the infrastructure file reference in metadata
const INFRA_FILE_KEYS: [&str; 2] = ["infra-file", "infrastructure-config-file"];

/// Kind of specification file being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    /// Exercise environment specification
    Exercise,
    /// Exercise package specification
    Package,
    /// Infrastructure configuration
    Infrastructure,
}

/// Check the syntax of a specification file
///
/// Resolves the file, parses it, and runs the validator for the given kind.
/// The parsed document is returned alongside the report; callers decide
/// whether to proceed based on [`ValidationReport::is_acceptable`]. A summary
/// line reporting the totals is always logged.
pub fn check_syntax(
    path: impl AsRef<Path>,
    kind: SpecKind,
) -> Result<(Document, ValidationReport), DocumentError> {
    let path = path.as_ref();
    if !path.exists() {
        error!("Could not find specification file in path {}", path.display());
        return Err(DocumentError::Io {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }

    let doc = document::parse_yaml_file(path)?;
    info!("Checking syntax...");
    let report = match kind {
        SpecKind::Exercise => verify_exercise_syntax(&doc),
        SpecKind::Package => verify_package_syntax(&doc),
        SpecKind::Infrastructure => verify_infra_syntax(&doc),
    };

    if report.is_clean() {
        info!("Syntax check successful!");
    } else if report.is_acceptable() {
        info!(
            "Syntax check successful, but there were {} warnings",
            report.warnings()
        );
    } else {
        error!(
            "Syntax check failed! Errors: {}\tWarnings: {}",
            report.errors(),
            report.warnings()
        );
    }
    Ok((doc, report))
}

/// Check a fixed list of field names for presence in a mapping
///
/// Records one finding per missing field at the given severity and returns
/// the number of misses. Used uniformly by the metadata, resources, scoring,
/// infrastructure, and provisioner checks.
pub(crate) fn check_fields(
    report: &mut ValidationReport,
    fields: &[&str],
    path: &str,
    data: &Mapping,
    severity: Severity,
) -> usize {
    let mut hits = 0;
    for field in fields {
        if !document::contains(data, field) {
            report.record(severity, path, format!("Missing {field}"));
            hits += 1;
        }
    }
    hits
}

/// Verify the syntax of an exercise specification document
pub fn verify_exercise_syntax(doc: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();

    let Some(root) = document::as_mapping(doc) else {
        report.error("", "Specification root must be a mapping");
        return report;
    };

    for section in REQUIRED_SECTIONS {
        match document::get(root, section) {
            Some(value) => report.merge(verify_section(section, value)),
            None => report.error(section, format!("Required definition {section} was not found")),
        }
    }

    for section in OPTIONAL_SECTIONS {
        match document::get(root, section) {
            Some(value) => report.merge(verify_section(section, value)),
            None => report.info(
                section,
                format!("Optional definition \"{section}\" was not found"),
            ),
        }
    }

    for key in root.keys() {
        let Some(name) = document::key_str(key) else {
            report.error("", "Top-level keys must be strings");
            continue;
        };
        if !REQUIRED_SECTIONS.contains(&name) && !OPTIONAL_SECTIONS.contains(&name) {
            report.warning(name, format!("Unknown definition found: {name}"));
        }
    }

    report
}

fn verify_section(section: &str, value: &Document) -> ValidationReport {
    match section {
        "metadata" => verify_metadata(value),
        "groups" => verify_groups(value),
        "services" => verify_services(value),
        "resources" => verify_resources(value),
        "networks" => verify_networks(value),
        "folders" => verify_folders(value, "folders"),
        _ => ValidationReport::new(),
    }
}

fn verify_metadata(value: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(metadata) = document::as_mapping(value) else {
        report.error("metadata", "metadata must be a mapping");
        return report;
    };

    check_fields(
        &mut report,
        &["description", "version", "folder-name"],
        "metadata",
        metadata,
        Severity::Warning,
    );
    check_fields(
        &mut report,
        &["name", "prefix"],
        "metadata",
        metadata,
        Severity::Error,
    );

    let infra_file = INFRA_FILE_KEYS
        .into_iter()
        .find_map(|key| document::get_str(metadata, key));
    match infra_file {
        None => report.error("metadata", "Missing infra-file"),
        Some(path) => {
            if !Path::new(path).exists() {
                report.error("metadata", format!("Could not open infra-file '{path}'"));
            } else {
                match document::parse_yaml_file(path) {
                    Ok(infra) => report.merge(verify_infra_syntax(&infra)),
                    Err(err) => {
                        report.error("metadata", format!("Could not parse infra-file '{path}': {err}"))
                    }
                }
            }
        }
    }
    report
}

fn verify_groups(value: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(groups) = document::as_mapping(value) else {
        report.error("groups", "groups must be a mapping");
        return report;
    };

    for (key, value) in groups {
        let name = document::key_str(key).unwrap_or("<non-string>");
        let path = format!("groups/{name}");
        let Some(group) = document::as_mapping(value) else {
            report.error(path, format!("Group {name} must be a mapping"));
            continue;
        };

        let is_template = document::contains(group, "instances");
        if is_template {
            let valid = document::get(group, "instances")
                .and_then(serde_yaml::Value::as_u64)
                .is_some();
            if !valid {
                report.error(&path, format!("Instances must be an Integer for group {name}"));
            }
        }

        verify_membership(&mut report, &path, name, group, is_template);
    }
    report
}

/// Check the membership mechanism of a group
///
/// Exactly one of `ad-group`, `filename`, `user-list` must be present; zero
/// or multiple is an error. `user-list` is only legal for non-template
/// groups.
fn verify_membership(
    report: &mut ValidationReport,
    path: &str,
    name: &str,
    group: &Mapping,
    is_template: bool,
) {
    let mechanisms = ["ad-group", "filename", "user-list"];
    let present: Vec<&str> = mechanisms
        .iter()
        .copied()
        .filter(|m| document::contains(group, m))
        .collect();

    match present.as_slice() {
        [] => {
            report.error(path, format!("Invalid user specification method for group {name}"));
            return;
        }
        [_] => {}
        _ => {
            report.error(
                path,
                format!(
                    "Group {name} specifies multiple membership mechanisms: {}",
                    present.join(", ")
                ),
            );
            return;
        }
    }

    if document::contains(group, "ad-group")
        && document::get_str(group, "ad-group").is_none()
    {
        report.error(path, "AD group must be a string");
    }
    if let Some(filename) = document::get(group, "filename") {
        match filename.as_str() {
            Some(filename) => {
                if document::read_json_file(filename).is_err() {
                    report.error(path, format!("Invalid user info file {filename}"));
                }
            }
            None => report.error(path, "Filename must be a string"),
        }
    }
    if document::contains(group, "user-list") {
        if is_template {
            report.error(
                path,
                format!("User lists cannot be used for template group {name}"),
            );
        } else if document::get(group, "user-list").and_then(|v| v.as_sequence()).is_none() {
            report.error(path, format!("Username specification must be a list for group {name}"));
        }
    }
}

fn verify_services(value: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(services) = document::as_mapping(value) else {
        report.error("services", "services must be a mapping");
        return report;
    };

    for (key, value) in services {
        let name = document::key_str(key).unwrap_or("<non-string>");
        let path = format!("services/{name}");
        let Some(service) = document::as_mapping(value) else {
            report.error(path, format!("Service {name} must be a mapping"));
            continue;
        };

        if document::contains(service, "network-interfaces")
            && document::get(service, "network-interfaces")
                .and_then(|v| v.as_sequence())
                .is_none()
        {
            report.error(&path, format!("Network interfaces must be a list for service {name}"));
        }

        if let Some(provisioner) = document::get(service, "provisioner") {
            let prov_path = format!("{path}/provisioner");
            match document::as_mapping(provisioner) {
                Some(provisioner) => {
                    check_fields(
                        &mut report,
                        &["name", "file"],
                        &prov_path,
                        provisioner,
                        Severity::Error,
                    );
                }
                None => report.error(prov_path, "Provisioner must be a mapping"),
            }
        }

        if document::contains(service, "note") && document::get_str(service, "note").is_none() {
            report.error(&path, format!("Note must be a string for service {name}"));
        }

        verify_origin(&mut report, &path, name, service);
    }
    report
}

/// Check the origin mechanism of a service
///
/// Exactly one of `template`, `image` (with optional `dockerfile`), or
/// `compose-file` must be present.
fn verify_origin(report: &mut ValidationReport, path: &str, name: &str, service: &Mapping) {
    let has_template = document::contains(service, "template");
    let has_image =
        document::contains(service, "image") || document::contains(service, "dockerfile");
    let has_compose = document::contains(service, "compose-file");

    match [has_template, has_image, has_compose].iter().filter(|p| **p).count() {
        0 => report.error(path, format!("Invalid service definition: {name}")),
        1 => {}
        _ => report.error(
            path,
            format!("Service {name} specifies multiple origins"),
        ),
    }
}

fn verify_resources(value: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(resources) = document::as_mapping(value) else {
        report.error("resources", "resources must be a mapping");
        return report;
    };
    check_fields(
        &mut report,
        &["lab", "resource"],
        "resources",
        resources,
        Severity::Error,
    );
    report
}

/// Verify the syntax of an exercise package specification
pub fn verify_package_syntax(doc: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();
    let Some(root) = document::as_mapping(doc) else {
        report.error("", "Package root must be a mapping");
        return report;
    };

    match document::get(root, "metadata").and_then(document::as_mapping) {
        None => report.error("metadata", "Metadata section not specified for package!"),
        Some(metadata) => {
            check_fields(
                &mut report,
                &["name", "description", "version"],
                "metadata",
                metadata,
                Severity::Warning,
            );
            check_fields(
                &mut report,
                &["timestamp", "tag"],
                "metadata",
                metadata,
                Severity::Error,
            );
        }
    }

    match document::get(root, "contents").and_then(document::as_mapping) {
        None => report.error("contents", "Contents section not specified for package!"),
        Some(contents) => {
            check_fields(
                &mut report,
                &["infrastructure", "scoring", "results", "templates", "materials"],
                "contents",
                contents,
                Severity::Warning,
            );
            check_fields(
                &mut report,
                &["environment"],
                "contents",
                contents,
                Severity::Error,
            );
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Document {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_missing_required_sections() {
        let report = verify_exercise_syntax(&doc("metadata: {}\n"));
        // groups, services, networks, folders all missing
        assert!(report.errors() >= 4);
        let paths: Vec<&str> = report.diagnostics().iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"groups"));
        assert!(paths.contains(&"folders"));
    }

    #[test]
    fn test_unknown_top_level_key_is_warning() {
        let report = verify_exercise_syntax(&doc("bogus-section: {}\n"));
        assert!(report
            .diagnostics()
            .iter()
            .any(|d| d.severity == Severity::Warning && d.path == "bogus-section"));
    }

    #[test]
    fn test_group_without_membership() {
        let report = verify_groups(&doc("students: {}\n"));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_group_with_multiple_mechanisms() {
        let report = verify_groups(&doc(
            "students:\n  ad-group: Students\n  user-list: [alice, bob]\n",
        ));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_user_list_must_be_sequence() {
        let report = verify_groups(&doc("students:\n  user-list: alice\n"));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_user_list_illegal_for_template_group() {
        let report = verify_groups(&doc(
            "students:\n  instances: 10\n  user-list: [alice]\n",
        ));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_template_group_instances_must_be_integer() {
        let report = verify_groups(&doc(
            "students:\n  instances: many\n  ad-group: Students\n",
        ));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_service_requires_an_origin() {
        let report = verify_services(&doc("web:\n  note: hello\n"));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_service_with_multiple_origins() {
        let report = verify_services(&doc(
            "web:\n  template: Ubuntu\n  compose-file: stack.yml\n",
        ));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_provisioner_requires_name_and_file() {
        let report = verify_services(&doc(
            "web:\n  template: Ubuntu\n  provisioner:\n    name: ansible\n",
        ));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_resources_require_lab_and_resource() {
        let report = verify_resources(&doc("lab: forensics\n"));
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_package_requires_environment() {
        let report = verify_package_syntax(&doc(
            "metadata:\n  timestamp: 2025-01-01\n  tag: v1\ncontents:\n  scoring: s.yaml\n",
        ));
        assert_eq!(report.errors(), 1);
        assert!(report
            .diagnostics()
            .iter()
            .any(|d| d.path == "contents" && d.message.contains("environment")));
    }
}
