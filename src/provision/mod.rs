// Copyright (c) 2025 - Cowboy AI, Inc.
//! Environment Provisioning
//!
//! The application layer that turns a validated exercise specification into
//! deployed platform resources. The [`Orchestrator`] owns nothing on the
//! platform: it holds handles returned by the [`Platform`](crate::platform::Platform)
//! trait and sequences phases through the provisioning lifecycle FSM.
//!
//! # Failure semantics
//!
//! - Validation problems never reach this layer: the orchestrator is built
//!   from an already-accepted [`ExerciseSpec`](crate::spec::ExerciseSpec)
//! - Per-item platform failures are collected in a [`BatchResult`] and the
//!   batch continues
//! - Configuration problems (missing template folder, unresolved root)
//!   abort the phase with an error

pub mod batch;
pub mod orchestrator;

pub use batch::BatchResult;
pub use orchestrator::{DeployOutcome, Orchestrator, ProvisionConfig};
