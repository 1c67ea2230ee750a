// Copyright (c) 2025 - Cowboy AI, Inc.
//! Platform Capability Surface
//!
//! The orchestrator drives a virtualization platform exclusively through the
//! [`Platform`] trait: folder, VM, network, and snapshot primitives. Any
//! backend (vSphere, Docker, an in-memory fake) can implement it.
//!
//! Platform entities are owned by the implementation; the orchestrator holds
//! only opaque handles ([`FolderRef`], [`VmRef`], [`NetworkRef`]) and treats
//! them as capability tokens. Each handle is used by at most one logical
//! operation chain at a time, so no locking discipline is imposed on
//! implementors beyond `Send + Sync`.
//!
//! Every operation is dispatched asynchronously and awaited to completion by
//! the caller before the next is issued; there is no operation overlap.

pub mod config;
pub mod logins;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::VlanId;

pub use config::{DockerConfig, PlatformConfig, RegistryConfig, Thresholds, VsphereConfig};
pub use logins::LoginConfig;
pub use memory::InMemoryPlatform;

/// Errors surfaced by platform operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// A referenced entity does not exist on the platform
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The underlying platform call failed or returned a fault
    #[error("{operation} failed for {target}: {detail}")]
    OperationFailed {
        operation: String,
        target: String,
        detail: String,
    },

    /// Declared interface list does not match the clone's NIC count
    #[error("VM {vm} has {actual} network interfaces, specification declares {declared}")]
    NicMismatch {
        vm: String,
        declared: usize,
        actual: usize,
    },
}

impl PlatformError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn operation_failed(
        operation: impl Into<String>,
        target: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            target: target.into(),
            detail: detail.into(),
        }
    }
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

macro_rules! handle_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Mint a handle; only platform implementations should do this
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Platform-side identifier
            pub fn id(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle_type!(
    /// Opaque handle to a platform folder
    FolderRef
);
handle_type!(
    /// Opaque handle to a platform VM or template
    VmRef
);
handle_type!(
    /// Opaque handle to a platform network port-group
    NetworkRef
);

/// Outcome of a find-or-create folder operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderCreated {
    /// Handle of the created or pre-existing folder
    pub folder: FolderRef,
    /// True when a folder with this name already existed and was reused
    pub existed: bool,
}

/// Virtualization platform primitives consumed by the orchestrator
#[async_trait]
pub trait Platform: Send + Sync {
    /// Handle to the platform's root folder
    async fn root_folder(&self) -> PlatformResult<FolderRef>;

    /// Resolve a `/`-separated path below a folder
    async fn resolve_path(&self, root: &FolderRef, path: &str)
        -> PlatformResult<Option<FolderRef>>;

    /// Create a folder, or return the existing one with the same name
    ///
    /// Idempotent: a name collision returns the existing handle with
    /// `existed` set rather than erroring, so re-invocation after a partial
    /// run does not duplicate structure.
    async fn create_folder(&self, parent: &FolderRef, name: &str) -> PlatformResult<FolderCreated>;

    /// Destroy a folder, optionally with everything below it
    async fn destroy_folder(&self, folder: &FolderRef, recursive: bool) -> PlatformResult<()>;

    /// Find a VM or template by name directly inside a folder
    async fn find_vm(&self, folder: &FolderRef, name: &str) -> PlatformResult<Option<VmRef>>;

    /// Clone a template into a folder under a new name
    ///
    /// Completion of the call does not guarantee the clone exists; callers
    /// verify with [`Platform::find_vm`] afterwards.
    async fn clone_vm(&self, template: &VmRef, folder: &FolderRef, name: &str)
        -> PlatformResult<()>;

    /// Destroy a VM
    async fn destroy_vm(&self, vm: &VmRef) -> PlatformResult<()>;

    /// Convert a VM to a platform template
    async fn convert_to_template(&self, vm: &VmRef) -> PlatformResult<()>;

    /// Whether the handle currently refers to a template
    async fn is_template(&self, vm: &VmRef) -> PlatformResult<bool>;

    /// Create a port-group on the platform's host
    async fn create_network(
        &self,
        name: &str,
        vswitch: &str,
        vlan: VlanId,
    ) -> PlatformResult<NetworkRef>;

    /// Find a port-group by name
    async fn find_network(&self, name: &str) -> PlatformResult<Option<NetworkRef>>;

    /// Tear down a port-group
    async fn destroy_network(&self, network: &NetworkRef) -> PlatformResult<()>;

    /// Number of network interfaces currently on a VM
    async fn network_interface_count(&self, vm: &VmRef) -> PlatformResult<usize>;

    /// Rewire the interface at `index` to a port-group
    async fn attach_network_interface(
        &self,
        vm: &VmRef,
        index: usize,
        network: &NetworkRef,
        label: &str,
    ) -> PlatformResult<()>;

    /// Take a snapshot of a VM
    async fn snapshot(
        &self,
        vm: &VmRef,
        label: &str,
        description: &str,
        include_memory: bool,
    ) -> PlatformResult<()>;

    /// Set the annotation (note) text on a VM
    async fn set_annotation(&self, vm: &VmRef, text: &str) -> PlatformResult<()>;
}
