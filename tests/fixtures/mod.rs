// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for range-orchestrator
//!
//! Provides deterministic specification fixtures and a seeded in-memory
//! platform. The known-good exercise fixture is written to a temp directory
//! together with the infrastructure and login files it references, so the
//! full validation path (including side-file checks) can run against it.
//!
//! Fixtures are the only place test specifications are constructed; tests
//! use fixtures, never inline documents.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use range_orchestrator::platform::InMemoryPlatform;
use range_orchestrator::spec::ExerciseSpec;

/// Exercise specification body; `{infra}` is replaced with the
/// infrastructure file path when written to disk.
pub const EXERCISE_SPEC: &str = r#"
metadata:
  name: intro-defense-lab
  prefix: IDL
  description: "Introductory cyber defense lab"
  version: "1.0"
  folder-name: intro-defense
  infra-file: "{infra}"
groups:
  Students:
    instances: 4
    ad-group: "Lab Students"
  Instructors:
    user-list: [alice, bob]
services:
  workstation:
    template: Windows10Template
    network-interfaces: [student-lan]
    note: "Student workstation"
  gateway:
    template: PfSenseTemplate
    network-interfaces: [wan, student-lan]
networks:
  unique-networks:
    wan:
      subnet: 10.10.0.0/24
      vlan: 100
  generic-networks:
    student-lan:
      subnet: 192.168.50.0/24
      increment: true
folders:
  exercise:
    instances: 2
    lab:
      group: Students
      instances: 2
      services:
        ws:
          service: workstation
          networks: [student-lan]
        gw:
          service: gateway
          networks: [wan, student-lan]
          scoring:
            criteria: gateway-up.yaml
            ports: [443]
            protocols: [https]
"#;

const INFRA_SPEC: &str = r#"
vmware-vsphere:
  hostname: vcenter.lab.example.com
  port: 443
  login-file: "{logins}"
  datacenter: lab-dc
  datastore: lab-datastore
  template-folder: Templates
  server-root: ranges
  vswitch: vSwitch0
"#;

const LOGINS: &str = r#"{"user": "orchestrator", "pass": "fixture-password", "host": "vcenter.lab.example.com", "port": 443}"#;

/// Write the known-good exercise fixture and its side files
///
/// Returns the temp directory (keep it alive for the test's duration) and
/// the path of the specification file.
pub fn write_exercise_fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create fixture dir");

    let logins_path = dir.path().join("logins.json");
    fs::write(&logins_path, LOGINS).expect("write logins fixture");

    let infra_path = dir.path().join("infra.yaml");
    fs::write(
        &infra_path,
        INFRA_SPEC.replace("{logins}", &logins_path.display().to_string()),
    )
    .expect("write infra fixture");

    let spec_path = dir.path().join("exercise.yaml");
    fs::write(
        &spec_path,
        EXERCISE_SPEC.replace("{infra}", &infra_path.display().to_string()),
    )
    .expect("write exercise fixture");

    (dir, spec_path)
}

/// The typed model of the exercise fixture
///
/// Built directly from the document; the model builder does not touch the
/// filesystem, so the placeholder infra path is left as-is.
pub fn exercise_model() -> ExerciseSpec {
    let doc = serde_yaml::from_str(EXERCISE_SPEC).expect("fixture parses");
    ExerciseSpec::from_document(&doc).expect("fixture builds")
}

/// In-memory platform seeded with the templates the fixture expects
///
/// Templates live under `/ranges/Templates`, matching the fixture's
/// `server-root` and `template-folder`, with NIC counts matching each
/// service's declared interfaces.
pub fn seeded_platform() -> Arc<InMemoryPlatform> {
    let platform = InMemoryPlatform::new();
    platform.seed_template("/ranges/Templates", "Windows10Template", 1);
    platform.seed_template("/ranges/Templates", "PfSenseTemplate", 2);
    Arc::new(platform)
}
