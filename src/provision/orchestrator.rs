// Copyright (c) 2025 - Cowboy AI, Inc.
//! Environment Orchestrator
//!
//! Drives the provisioning lifecycle for a validated exercise specification
//! against a [`Platform`] implementation:
//!
//! ```text
//! initialize          → environment root folder (find-or-create)
//! create_masters      → port-groups + master clones + baseline snapshots
//! deploy_environment  → masters to templates, numbered instance clones
//! cleanup_masters     → destroy masters (optionally port-groups)
//! cleanup_environment → destroy the whole environment
//! ```
//!
//! Phase ordering is gated by the [`ProvisionPhase`] state machine, checked
//! before any platform call is made. Inside a phase, failures degrade to
//! per-item skips collected in a [`BatchResult`]; a cyber-range with
//! hundreds of clones should not abort entirely because one clone failed.
//! Only configuration-level problems abort a phase outright.
//!
//! Re-invocation is the retry mechanism: folders are found-or-created, and
//! phase entry points locate masters by naming convention rather than
//! relying on handles from an earlier process.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::NamingConvention;
use crate::errors::{OrchestratorError, OrchestratorResult};
use crate::platform::{
    FolderRef, NetworkRef, Platform, PlatformError, PlatformResult, VmRef, VsphereConfig,
};
use crate::provision::batch::BatchResult;
use crate::spec::{ExerciseSpec, FolderNode, InstanceCount, ServiceRef, ServiceSpec};
use crate::state_machine::{
    PhaseCommand, ProvisionPhase, StateMachine, StateMachineWithHistory,
};

/// Snapshot label applied to every master after cloning and configuration
const MASTER_SNAPSHOT_LABEL: &str = "mastering post-clone";
const MASTER_SNAPSHOT_DESCRIPTION: &str =
    "Clean snapshot taken after cloning and configuration for master instance";

/// Explicit configuration for an orchestrator run
///
/// Naming prefixes and thresholds are fields here rather than process-wide
/// constants, so two orchestrators with different conventions can coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Naming rules for masters and instances
    pub naming: NamingConvention,
    /// Path below the server root holding source templates
    pub template_path: String,
    /// Path below the platform root all environments are created under
    pub server_root: Option<String>,
    /// Virtual switch used for port-groups that do not name one
    pub default_vswitch: String,
    /// Instance count above which a folder triggers a capacity warning
    pub instance_warn_threshold: u32,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            naming: NamingConvention::default(),
            template_path: "Templates".to_string(),
            server_root: None,
            default_vswitch: "vSwitch0".to_string(),
            instance_warn_threshold: 100,
        }
    }
}

impl ProvisionConfig {
    /// Derive a run configuration from a vSphere infrastructure entry
    pub fn from_vsphere(config: &VsphereConfig) -> Self {
        let defaults = Self::default();
        Self {
            template_path: config.template_folder.clone(),
            server_root: config.server_root.clone(),
            default_vswitch: config
                .vswitch
                .clone()
                .unwrap_or(defaults.default_vswitch),
            instance_warn_threshold: config
                .thresholds
                .as_ref()
                .map(|t| t.folder)
                .unwrap_or(defaults.instance_warn_threshold),
            naming: defaults.naming,
        }
    }
}

/// Outcome of the deployment phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOutcome {
    /// Masters converted to templates, by service name
    pub converted: BatchResult<String>,
    /// Instance clones, by deployed path
    pub deployed: BatchResult<String>,
}

/// Drives provisioning phases for one environment
pub struct Orchestrator {
    platform: Arc<dyn Platform>,
    spec: ExerciseSpec,
    config: ProvisionConfig,
    run_id: Uuid,
    lifecycle: StateMachineWithHistory<ProvisionPhase>,
    server_root: Option<FolderRef>,
    root_folder: Option<FolderRef>,
    master_folder: Option<FolderRef>,
    /// Port-groups materialized by this run, by network name
    networks: BTreeMap<String, NetworkRef>,
}

impl Orchestrator {
    /// Create an orchestrator for a validated specification
    pub fn new(platform: Arc<dyn Platform>, spec: ExerciseSpec, config: ProvisionConfig) -> Self {
        Self {
            platform,
            spec,
            config,
            run_id: Uuid::now_v7(),
            lifecycle: StateMachineWithHistory::new(ProvisionPhase::Uninitialized),
            server_root: None,
            root_folder: None,
            master_folder: None,
            networks: BTreeMap::new(),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ProvisionPhase {
        *self.lifecycle.current()
    }

    /// Correlation id of this run, carried in every phase log line
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Resolve the root path and find-or-create the environment root folder
    ///
    /// Idempotent: re-running with the same name reuses the existing folder
    /// and logs a warning instead of erroring.
    pub async fn initialize(&mut self) -> OrchestratorResult<()> {
        self.ensure_can(PhaseCommand::CreateRoot)?;
        info!(run_id = %self.run_id, "Initializing environment {}", self.spec.metadata.name);

        let platform_root = self.platform.root_folder().await?;
        let server_root = match &self.config.server_root {
            Some(path) => self
                .platform
                .resolve_path(&platform_root, path)
                .await?
                .ok_or_else(|| PlatformError::not_found("folder", path.clone()))?,
            None => platform_root,
        };

        let name = self.spec.metadata.root_folder_name().to_string();
        let created = self.platform.create_folder(&server_root, &name).await?;
        if created.existed {
            warn!("Environment folder {} already exists, reusing it", name);
        } else {
            info!("Created environment folder {}", name);
        }

        self.server_root = Some(server_root);
        self.root_folder = Some(created.folder);
        self.commit(PhaseCommand::CreateRoot)
    }

    /// Master creation phase
    ///
    /// Creates the master folder, materializes port-groups for every
    /// declared network class, and clones each template-origin service into
    /// a configured, snapshotted master. A failed clone skips that service
    /// only; the rest of the batch proceeds.
    pub async fn create_masters(&mut self) -> OrchestratorResult<BatchResult<String>> {
        self.ensure_can(PhaseCommand::CreateMasters)?;
        info!(run_id = %self.run_id, "Creating master instances for {}", self.spec.metadata.name);

        let root = self.root_folder()?;
        let server_root = self.server_root()?;

        let template_folder = self
            .platform
            .resolve_path(&server_root, &self.config.template_path)
            .await?
            .ok_or_else(|| {
                error!(
                    "Could not find template folder in path {}",
                    self.config.template_path
                );
                PlatformError::not_found("folder", self.config.template_path.clone())
            })?;

        let created = self
            .platform
            .create_folder(&root, &self.config.naming.master_root)
            .await?;
        info!(
            "Created master folder {} under folder {}",
            self.config.naming.master_root,
            self.spec.metadata.root_folder_name()
        );
        let master_folder = created.folder;

        self.create_master_networks().await?;

        let services: Vec<(String, ServiceSpec)> = self
            .spec
            .template_services()
            .map(|(name, spec)| (name.clone(), spec.clone()))
            .collect();

        let mut batch = BatchResult::new();
        for (name, service) in services {
            match self
                .clone_master(&template_folder, &master_folder, &name, &service)
                .await
            {
                Ok(()) => batch.record_success(name),
                Err(err) => {
                    error!("Failed to create master for {}: {}", name, err);
                    batch.record_failure(name, err);
                }
            }
        }

        self.master_folder = Some(master_folder);
        self.commit(PhaseCommand::CreateMasters)?;
        info!(
            run_id = %self.run_id,
            "Master creation finished: {} created, {} skipped",
            batch.succeeded().len(),
            batch.failed().len()
        );
        Ok(batch)
    }

    /// Environment deployment phase
    ///
    /// First converts every master to a platform template and re-verifies
    /// the conversion, then clones numbered instances through the folder
    /// tree. Both passes are best-effort over the whole set; the outcome
    /// reports exactly what was and wasn't deployed.
    pub async fn deploy_environment(&mut self) -> OrchestratorResult<DeployOutcome> {
        self.ensure_can(PhaseCommand::ConvertMasters)?;
        info!(run_id = %self.run_id, "Deploying environment for {}", self.spec.metadata.name);

        let root = self.root_folder()?;
        let master_folder = self.locate_master_folder(&root).await?;

        info!("Verifying masters and converting to templates...");
        let services: Vec<String> = self
            .spec
            .template_services()
            .map(|(name, _)| name.clone())
            .collect();

        let mut converted = BatchResult::new();
        for name in services {
            match self.convert_master(&master_folder, &name).await {
                Ok(()) => converted.record_success(name),
                Err(err) => {
                    error!("Master {} was not converted: {}", name, err);
                    converted.record_failure(name, err);
                }
            }
        }
        self.commit(PhaseCommand::ConvertMasters)?;

        let mut deployed = BatchResult::new();
        let folders = self.spec.folders.clone();
        self.deploy_tree(root, &folders, &master_folder, String::new(), &mut deployed)
            .await?;
        self.commit(PhaseCommand::DeployInstances)?;

        info!(
            run_id = %self.run_id,
            "Deployment finished: {} converted, {} instances cloned, {} skipped",
            converted.succeeded().len(),
            deployed.succeeded().len(),
            converted.failed().len() + deployed.failed().len()
        );
        Ok(DeployOutcome { converted, deployed })
    }

    /// Destroy master instances
    ///
    /// Locates the master folder by name under the environment root and
    /// recursively destroys it. With `network_cleanup`, provisioned
    /// port-groups are destroyed afterwards, once no NIC references them.
    pub async fn cleanup_masters(&mut self, network_cleanup: bool) -> OrchestratorResult<()> {
        self.ensure_can(PhaseCommand::CleanupMasters)?;
        let root = self.root_folder()?;
        let master_folder = self.locate_master_folder(&root).await?;
        info!(
            run_id = %self.run_id,
            "Found master folder {} under folder {}, proceeding with cleanup...",
            self.config.naming.master_root,
            self.spec.metadata.root_folder_name()
        );

        self.platform.destroy_folder(&master_folder, true).await?;
        self.master_folder = None;

        if network_cleanup {
            self.cleanup_networks().await;
        }
        self.commit(PhaseCommand::CleanupMasters)
    }

    /// Destroy the deployed environment
    ///
    /// Recursively destroys the environment root folder, then optionally the
    /// provisioned port-groups.
    pub async fn cleanup_environment(&mut self, network_cleanup: bool) -> OrchestratorResult<()> {
        self.ensure_can(PhaseCommand::CleanupEnvironment)?;
        let root = self.root_folder()?;
        info!(
            run_id = %self.run_id,
            "Cleaning up environment {}",
            self.spec.metadata.root_folder_name()
        );

        self.platform.destroy_folder(&root, true).await?;
        self.root_folder = None;
        self.master_folder = None;

        if network_cleanup {
            self.cleanup_networks().await;
        }
        self.commit(PhaseCommand::CleanupEnvironment)
    }

    async fn create_master_networks(&mut self) -> OrchestratorResult<()> {
        let declared: Vec<(String, crate::spec::NetworkSpec)> = self
            .spec
            .networks
            .iter()
            .map(|(_, name, spec)| (name.clone(), spec.clone()))
            .collect();

        for (name, network) in declared {
            let vlan = network.vlan.unwrap_or_default();
            let vswitch = network
                .vswitch
                .as_deref()
                .unwrap_or(&self.config.default_vswitch);
            debug!("Creating portgroup {}", name);
            let handle = self.platform.create_network(&name, vswitch, vlan).await?;
            self.networks.insert(name, handle);
        }
        Ok(())
    }

    async fn clone_master(
        &self,
        template_folder: &FolderRef,
        master_folder: &FolderRef,
        name: &str,
        service: &ServiceSpec,
    ) -> PlatformResult<()> {
        let Some(template_name) = service.template_name() else {
            return Ok(());
        };
        info!("Creating master for {} from template {}", name, template_name);

        let template = self
            .platform
            .find_vm(template_folder, template_name)
            .await?
            .ok_or_else(|| PlatformError::not_found("template", template_name))?;

        let master_name = self.config.naming.master_name(name);
        self.platform
            .clone_vm(&template, master_folder, &master_name)
            .await?;

        // The clone task completing does not guarantee the clone exists
        let vm = self
            .platform
            .find_vm(master_folder, &master_name)
            .await?
            .ok_or_else(|| {
                PlatformError::operation_failed(
                    "clone",
                    master_name.clone(),
                    "clone did not appear after creation",
                )
            })?;

        self.configure_nics(&vm, &service.network_interfaces).await?;

        if let Some(note) = &service.note {
            self.platform.set_annotation(&vm, note).await?;
        }
        self.platform
            .snapshot(&vm, MASTER_SNAPSHOT_LABEL, MASTER_SNAPSHOT_DESCRIPTION, false)
            .await?;
        debug!("Successfully cloned service {} as {}", name, master_name);
        Ok(())
    }

    /// Reconcile a clone's interfaces against the declared network list
    ///
    /// An exact count match rewires each interface to its corresponding
    /// port-group by position. A mismatch is reported for operator
    /// reconciliation; interfaces are not added or removed automatically.
    async fn configure_nics(&self, vm: &VmRef, declared: &[String]) -> PlatformResult<()> {
        let actual = self.platform.network_interface_count(vm).await?;
        if actual != declared.len() {
            return Err(PlatformError::NicMismatch {
                vm: vm.id().to_string(),
                declared: declared.len(),
                actual,
            });
        }

        debug!("Editing NICs for VM {}", vm);
        for (index, network_name) in declared.iter().enumerate() {
            let network = self.network_handle(network_name).await?;
            self.platform
                .attach_network_interface(vm, index, &network, network_name)
                .await?;
        }
        Ok(())
    }

    async fn convert_master(&self, master_folder: &FolderRef, name: &str) -> PlatformResult<()> {
        let master_name = self.config.naming.master_name(name);
        let vm = self
            .platform
            .find_vm(master_folder, &master_name)
            .await?
            .ok_or_else(|| PlatformError::not_found("master", master_name.clone()))?;

        debug!("Verified master {} exists as {}. Converting to template...", name, master_name);
        self.platform.convert_to_template(&vm).await?;

        // Re-verify: the conversion call can succeed without taking effect
        if !self.platform.is_template(&vm).await? {
            return Err(PlatformError::operation_failed(
                "convert_to_template",
                master_name,
                "VM did not convert to template",
            ));
        }
        Ok(())
    }

    fn deploy_tree<'a>(
        &'a self,
        parent: FolderRef,
        folders: &'a BTreeMap<String, FolderNode>,
        master_folder: &'a FolderRef,
        path: String,
        deployed: &'a mut BatchResult<String>,
    ) -> Pin<Box<dyn Future<Output = OrchestratorResult<()>> + Send + 'a>> {
        Box::pin(async move {
            for (name, node) in folders {
                let node_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}/{name}")
                };

                if let FolderNode::Base { enabled: false, .. } = node {
                    info!("Folder {} is disabled, skipping", node_path);
                    continue;
                }

                let total = match self.instance_count(node) {
                    Ok(total) => total,
                    Err(err) => {
                        error!("Cannot size folder {}: {}", node_path, err);
                        deployed.record_failure(node_path, err);
                        continue;
                    }
                };
                if total > self.config.instance_warn_threshold {
                    warn!(
                        "Folder {} deploys {} instances, above the threshold of {}",
                        node_path, total, self.config.instance_warn_threshold
                    );
                }

                for index in 0..total {
                    let instance_name = self.config.naming.instance_name(name, index, total);
                    debug!("Generating folder {}", instance_name);
                    let folder = self
                        .platform
                        .create_folder(&parent, &instance_name)
                        .await?
                        .folder;
                    let instance_path = if path.is_empty() {
                        instance_name.clone()
                    } else {
                        format!("{path}/{instance_name}")
                    };

                    match node {
                        FolderNode::Base { services, .. } => {
                            self.deploy_services(
                                &folder,
                                services,
                                master_folder,
                                &instance_path,
                                deployed,
                            )
                            .await?;
                        }
                        FolderNode::Parent { children, .. } => {
                            self.deploy_tree(
                                folder,
                                children,
                                master_folder,
                                instance_path,
                                deployed,
                            )
                            .await?;
                        }
                    }
                }
            }
            Ok(())
        })
    }

    async fn deploy_services(
        &self,
        folder: &FolderRef,
        services: &BTreeMap<String, ServiceRef>,
        master_folder: &FolderRef,
        path: &str,
        deployed: &mut BatchResult<String>,
    ) -> OrchestratorResult<()> {
        for (ref_name, service_ref) in services {
            let item = format!("{path}/{ref_name}");
            match self
                .deploy_service(folder, service_ref, master_folder, ref_name)
                .await
            {
                Ok(()) => deployed.record_success(item),
                Err(err) => {
                    error!("Skipping service {}: {}", item, err);
                    deployed.record_failure(item, err);
                }
            }
        }
        Ok(())
    }

    async fn deploy_service(
        &self,
        folder: &FolderRef,
        service_ref: &ServiceRef,
        master_folder: &FolderRef,
        ref_name: &str,
    ) -> PlatformResult<()> {
        let master_name = self.config.naming.master_name(&service_ref.service);
        let master = self
            .platform
            .find_vm(master_folder, &master_name)
            .await?
            .ok_or_else(|| PlatformError::not_found("master", master_name.clone()))?;

        debug!("Generating service {} in folder {}", ref_name, folder);
        self.platform.clone_vm(&master, folder, ref_name).await?;
        let vm = self
            .platform
            .find_vm(folder, ref_name)
            .await?
            .ok_or_else(|| {
                PlatformError::operation_failed(
                    "clone",
                    ref_name,
                    "clone did not appear after creation",
                )
            })?;

        self.configure_nics(&vm, &service_ref.networks).await?;
        Ok(())
    }

    /// Number of instances a folder node deploys
    ///
    /// `size-of` references are resolved against the group map at deploy
    /// time; a dangling reference fails the folder rather than the run.
    fn instance_count(&self, node: &FolderNode) -> PlatformResult<u32> {
        match node.instances() {
            None => Ok(1),
            Some(InstanceCount::Count(count)) => Ok(*count),
            Some(InstanceCount::SizeOf(group_name)) => {
                let group = self.spec.groups.get(group_name).ok_or_else(|| {
                    PlatformError::not_found("group", group_name.clone())
                })?;
                Ok(group.size().unwrap_or_else(|| {
                    warn!(
                        "Size of group {} is held externally, deploying a single instance",
                        group_name
                    );
                    1
                }))
            }
        }
    }

    async fn network_handle(&self, name: &str) -> PlatformResult<NetworkRef> {
        if let Some(handle) = self.networks.get(name) {
            return Ok(handle.clone());
        }
        // Port-groups from an earlier run are located by name
        self.platform
            .find_network(name)
            .await?
            .ok_or_else(|| PlatformError::not_found("network", name))
    }

    /// Destroy every port-group the specification declares
    ///
    /// Runs after folder destruction so no NIC still references a
    /// port-group. Missing port-groups are skipped: cleanup is idempotent.
    async fn cleanup_networks(&mut self) {
        let declared: Vec<String> = self
            .spec
            .networks
            .iter()
            .map(|(_, name, _)| name.clone())
            .collect();

        for name in declared {
            let handle = match self.networks.remove(&name) {
                Some(handle) => Some(handle),
                None => self.platform.find_network(&name).await.ok().flatten(),
            };
            match handle {
                None => debug!("Portgroup {} not present, skipping", name),
                Some(handle) => {
                    if let Err(err) = self.platform.destroy_network(&handle).await {
                        error!("Failed to destroy portgroup {}: {}", name, err);
                    } else {
                        info!("Destroyed portgroup {}", name);
                    }
                }
            }
        }
    }

    async fn locate_master_folder(&self, root: &FolderRef) -> OrchestratorResult<FolderRef> {
        if let Some(folder) = &self.master_folder {
            return Ok(folder.clone());
        }
        self.platform
            .resolve_path(root, &self.config.naming.master_root)
            .await?
            .ok_or_else(|| {
                PlatformError::not_found("folder", self.config.naming.master_root.clone()).into()
            })
    }

    fn root_folder(&self) -> OrchestratorResult<FolderRef> {
        self.root_folder.clone().ok_or_else(|| {
            OrchestratorError::Configuration("environment root folder not initialized".to_string())
        })
    }

    fn server_root(&self) -> OrchestratorResult<FolderRef> {
        self.server_root.clone().ok_or_else(|| {
            OrchestratorError::Configuration("server root not resolved".to_string())
        })
    }

    fn ensure_can(&self, command: PhaseCommand) -> OrchestratorResult<()> {
        self.lifecycle
            .current()
            .transition(&command)
            .map(drop)
            .map_err(Into::into)
    }

    fn commit(&mut self, command: PhaseCommand) -> OrchestratorResult<()> {
        let output = self.lifecycle.transition(command)?;
        for warning in output.warnings {
            warn!("{}", warning);
        }
        Ok(())
    }
}
