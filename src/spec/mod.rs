// Copyright (c) 2025 - Cowboy AI, Inc.
//! Specification Ingestion and Validation
//!
//! The path from a YAML file to a provisioning-ready model:
//!
//! ```text
//! file → Document (generic nested value)
//!      → ValidationReport (schema / networks / folders / infrastructure)
//!      → ExerciseSpec (typed model, built only from acceptable documents)
//! ```
//!
//! Validation is additive: every checker records findings into a
//! [`ValidationReport`](crate::diagnostics::ValidationReport) and keeps
//! going, so one pass surfaces every problem in the document. Zero errors
//! (warnings tolerated) is the acceptance condition for provisioning.

pub mod document;
pub mod folders;
pub mod infrastructure;
pub mod model;
pub mod networks;
pub mod schema;

pub use document::{Document, DocumentError};
pub use folders::verify_folders;
pub use infrastructure::verify_infra_syntax;
pub use model::{
    ExerciseSpec, FolderNode, GroupSpec, InstanceCount, Membership, Metadata, ModelError,
    NetworkClass, NetworkSet, NetworkSpec, Provisioner, Scoring, ServiceOrigin, ServiceRef,
    ServiceSpec,
};
pub use networks::verify_networks;
pub use schema::{check_syntax, verify_exercise_syntax, verify_package_syntax, SpecKind};
