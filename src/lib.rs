//! Declarative cyber-range environment orchestration
//!
//! This crate ingests a YAML exercise specification describing user groups,
//! services, virtual networks, and a hierarchical folder layout, validates it
//! against the specification schema, and drives a virtualization platform
//! through the [`platform::Platform`] capability trait to materialize the
//! environment: master creation, instance deployment, and cleanup.

pub mod diagnostics;
pub mod domain;
pub mod errors;
pub mod platform;
pub mod provision;
pub mod spec;
pub mod state_machine;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, Severity, ValidationReport};
pub use errors::{OrchestratorError, OrchestratorResult};
pub use platform::{Platform, PlatformError};
pub use provision::{BatchResult, Orchestrator, ProvisionConfig};
pub use spec::{check_syntax, verify_exercise_syntax, ExerciseSpec, SpecKind};
