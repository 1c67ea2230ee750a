// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for specification validation
//!
//! Exercises the full validation path over documents and fixture files:
//! section dispatch, network rules, folder recursion, and the acceptance
//! condition for a known-good specification.

mod fixtures;

use pretty_assertions::assert_eq;
use test_case::test_case;

use range_orchestrator::spec::{
    check_syntax, verify_exercise_syntax, verify_networks, ExerciseSpec, SpecKind,
};
use range_orchestrator::Severity;

fn doc(yaml: &str) -> serde_yaml::Value {
    serde_yaml::from_str(yaml).expect("test document parses")
}

#[test_case("metadata"; "missing metadata")]
#[test_case("groups"; "missing groups")]
#[test_case("services"; "missing services")]
#[test_case("networks"; "missing networks")]
#[test_case("folders"; "missing folders")]
fn missing_required_section_is_identified(section: &str) {
    let (_dir, spec_path) = fixtures::write_exercise_fixture();
    let (full, _) = check_syntax(&spec_path, SpecKind::Exercise).expect("fixture ingests");

    let mut trimmed = full.as_mapping().cloned().expect("fixture root is a mapping");
    trimmed.remove(section);

    let report = verify_exercise_syntax(&serde_yaml::Value::Mapping(trimmed));
    assert!(report.errors() >= 1);
    assert!(
        report
            .diagnostics()
            .iter()
            .any(|d| d.severity == Severity::Error && d.path == section),
        "diagnostics should identify the missing {section} section"
    );
}

#[test_case("127.0.0.0/8", 1, 0; "loopback is an error")]
#[test_case("224.0.0.0/4", 1, 0; "multicast is an error")]
#[test_case("240.0.0.0/4", 1, 0; "reserved is an error")]
#[test_case("8.8.8.0/24", 0, 1; "public is a warning")]
#[test_case("10.0.0.0/16", 0, 0; "private is accepted")]
#[test_case("not-a-subnet", 1, 0; "malformed is an error")]
fn subnet_rules(subnet: &str, errors: usize, warnings: usize) {
    let report = verify_networks(&doc(&format!(
        "unique-networks:\n  wan:\n    subnet: \"{subnet}\"\n"
    )));
    assert_eq!((report.errors(), report.warnings()), (errors, warnings));
}

#[test_case("unique-networks", 100, 0; "low vlan under unique is accepted")]
#[test_case("unique-networks", 2500, 1; "vlan above ceiling is an error")]
#[test_case("generic-networks", 100, 1; "any vlan under generic is an error")]
#[test_case("generic-networks", 2500, 1; "high vlan under generic is one error")]
fn vlan_rules(class: &str, vlan: u32, errors: usize) {
    let report = verify_networks(&doc(&format!(
        "{class}:\n  net:\n    subnet: 10.0.0.0/24\n    vlan: {vlan}\n"
    )));
    assert_eq!(report.errors(), errors);
}

#[test]
fn group_without_membership_is_exactly_one_error() {
    let report = verify_exercise_syntax(&doc(
        r#"
groups:
  empty-group:
    instances: 3
"#,
    ));
    let group_errors: Vec<_> = report
        .diagnostics()
        .iter()
        .filter(|d| d.severity == Severity::Error && d.path == "groups/empty-group")
        .collect();
    assert_eq!(group_errors.len(), 1);
}

#[test]
fn reserved_keys_are_not_folders_three_levels_deep() {
    let report = verify_exercise_syntax(&doc(
        r#"
folders:
  top:
    group: Admins
    instances: 2
    middle:
      master-group: Admins
      instances:
        number: 3
      leaf:
        group: Students
        instances: 2
        description: "bottom of the tree"
        enabled: true
        services:
          ws:
            service: workstation
"#,
    ));
    let false_positives: Vec<_> = report
        .diagnostics()
        .iter()
        .filter(|d| d.severity == Severity::Error && d.path.starts_with("folders"))
        .collect();
    assert_eq!(false_positives, Vec::<&range_orchestrator::Diagnostic>::new());
}

#[test]
fn known_good_fixture_is_clean() {
    let (_dir, spec_path) = fixtures::write_exercise_fixture();
    let (doc, report) = check_syntax(&spec_path, SpecKind::Exercise).expect("fixture ingests");

    assert_eq!((report.errors(), report.warnings()), (0, 0));
    assert!(report.is_clean());

    // An acceptable document also builds the typed model
    let spec = ExerciseSpec::from_document(&doc).expect("model builds");
    assert_eq!(spec.metadata.prefix, "IDL");
    assert_eq!(spec.template_services().count(), 2);
}

#[test]
fn missing_spec_file_is_an_ingest_error() {
    assert!(check_syntax("/nonexistent/exercise.yaml", SpecKind::Exercise).is_err());
}

#[test]
fn infra_file_validated_through_metadata() {
    let (dir, _spec) = fixtures::write_exercise_fixture();
    let infra_path = dir.path().join("infra.yaml");

    let report = verify_exercise_syntax(&doc(&format!(
        r#"
metadata:
  name: t
  prefix: T
  description: d
  version: "1"
  folder-name: f
  infra-file: "{}"
groups:
  g:
    ad-group: G
services:
  s:
    template: T
networks:
  unique-networks:
    n:
      subnet: 10.0.0.0/24
folders:
  leaf:
    group: g
    services:
      s:
        service: s
"#,
        infra_path.display()
    )));
    assert_eq!((report.errors(), report.warnings()), (0, 0));
}
