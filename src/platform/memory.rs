// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Platform
//!
//! A [`Platform`] implementation backed by process memory. Used by the
//! dry-run mode of the deployment binary and by tests: it mirrors the
//! observable semantics of a real backend (find-or-create folders, clones
//! that may silently fail to appear, template conversion verification)
//! without any remote calls.
//!
//! Folder and VM handles are `/`-separated paths; the inventory can be
//! seeded with templates and instructed to fail specific operations so
//! partial-failure behavior can be exercised deterministically.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::VlanId;

use super::{FolderCreated, FolderRef, NetworkRef, Platform, PlatformError, PlatformResult, VmRef};

/// Observable state of an in-memory VM
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmState {
    pub is_template: bool,
    /// Port-group id per interface slot, `None` when unwired
    pub nics: Vec<Option<String>>,
    pub annotation: Option<String>,
    pub snapshots: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    folders: HashSet<String>,
    vms: HashMap<String, VmState>,
    networks: HashMap<String, (String, u16)>,
    fail_clones: HashSet<String>,
    fail_conversions: HashSet<String>,
}

/// In-memory virtualization platform
#[derive(Debug)]
pub struct InMemoryPlatform {
    state: Mutex<State>,
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlatform {
    /// Create an empty inventory containing only the root folder
    pub fn new() -> Self {
        let mut state = State::default();
        state.folders.insert("/".to_string());
        Self {
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("platform state lock poisoned")
    }

    /// Seed a template VM, creating folders along the path as needed
    pub fn seed_template(&self, folder: &str, name: &str, nic_count: usize) {
        let mut state = self.state();
        let mut path = String::new();
        state.folders.insert("/".to_string());
        for segment in folder.split('/').filter(|s| !s.is_empty()) {
            path = format!("{path}/{segment}");
            state.folders.insert(path.clone());
        }
        let id = join(&path, name);
        state.vms.insert(
            id,
            VmState {
                is_template: true,
                nics: vec![None; nic_count],
                ..VmState::default()
            },
        );
    }

    /// Make the clone with the given target name silently not appear
    pub fn fail_clone(&self, name: &str) {
        self.state().fail_clones.insert(name.to_string());
    }

    /// Make template conversion of the given VM name silently no-op
    pub fn fail_conversion(&self, name: &str) {
        self.state().fail_conversions.insert(name.to_string());
    }

    /// Whether a folder path exists
    pub fn folder_exists(&self, path: &str) -> bool {
        self.state().folders.contains(path)
    }

    /// Snapshot of a VM's observable state
    pub fn vm_state(&self, id: &str) -> Option<VmState> {
        self.state().vms.get(id).cloned()
    }

    /// All VM ids, sorted
    pub fn vm_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state().vms.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All port-group names, sorted
    pub fn network_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().networks.keys().cloned().collect();
        names.sort();
        names
    }

    /// VLAN tag of a port-group
    pub fn network_vlan(&self, name: &str) -> Option<u16> {
        self.state().networks.get(name).map(|(_, vlan)| *vlan)
    }
}

fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() || folder == "/" {
        format!("/{name}")
    } else {
        format!("{folder}/{name}")
    }
}

#[async_trait]
impl Platform for InMemoryPlatform {
    async fn root_folder(&self) -> PlatformResult<FolderRef> {
        Ok(FolderRef::new("/"))
    }

    async fn resolve_path(
        &self,
        root: &FolderRef,
        path: &str,
    ) -> PlatformResult<Option<FolderRef>> {
        let mut current = root.id().trim_end_matches('/').to_string();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = format!("{current}/{segment}");
        }
        if current.is_empty() {
            current = "/".to_string();
        }
        Ok(self
            .state()
            .folders
            .contains(&current)
            .then(|| FolderRef::new(current)))
    }

    async fn create_folder(&self, parent: &FolderRef, name: &str) -> PlatformResult<FolderCreated> {
        let mut state = self.state();
        if !state.folders.contains(parent.id()) {
            return Err(PlatformError::not_found("folder", parent.id()));
        }
        let id = join(parent.id(), name);
        let existed = !state.folders.insert(id.clone());
        Ok(FolderCreated {
            folder: FolderRef::new(id),
            existed,
        })
    }

    async fn destroy_folder(&self, folder: &FolderRef, recursive: bool) -> PlatformResult<()> {
        let mut state = self.state();
        if !state.folders.contains(folder.id()) {
            return Err(PlatformError::not_found("folder", folder.id()));
        }
        let prefix = format!("{}/", folder.id());
        if !recursive {
            let has_children = state.folders.iter().any(|f| f.starts_with(&prefix))
                || state.vms.keys().any(|v| v.starts_with(&prefix));
            if has_children {
                return Err(PlatformError::operation_failed(
                    "destroy_folder",
                    folder.id(),
                    "folder is not empty",
                ));
            }
        }
        state.folders.retain(|f| f != folder.id() && !f.starts_with(&prefix));
        state.vms.retain(|v, _| !v.starts_with(&prefix));
        Ok(())
    }

    async fn find_vm(&self, folder: &FolderRef, name: &str) -> PlatformResult<Option<VmRef>> {
        let id = join(folder.id(), name);
        Ok(self.state().vms.contains_key(&id).then(|| VmRef::new(id)))
    }

    async fn clone_vm(
        &self,
        template: &VmRef,
        folder: &FolderRef,
        name: &str,
    ) -> PlatformResult<()> {
        let mut state = self.state();
        let source = state
            .vms
            .get(template.id())
            .cloned()
            .ok_or_else(|| PlatformError::not_found("template", template.id()))?;
        if !state.folders.contains(folder.id()) {
            return Err(PlatformError::not_found("folder", folder.id()));
        }
        if state.fail_clones.contains(name) {
            // The task "completes" but no clone appears
            return Ok(());
        }
        let id = join(folder.id(), name);
        state.vms.insert(
            id,
            VmState {
                is_template: false,
                nics: vec![None; source.nics.len()],
                ..VmState::default()
            },
        );
        Ok(())
    }

    async fn destroy_vm(&self, vm: &VmRef) -> PlatformResult<()> {
        self.state()
            .vms
            .remove(vm.id())
            .map(|_| ())
            .ok_or_else(|| PlatformError::not_found("vm", vm.id()))
    }

    async fn convert_to_template(&self, vm: &VmRef) -> PlatformResult<()> {
        let mut state = self.state();
        let name = vm.id().rsplit('/').next().unwrap_or_default().to_string();
        let skip = state.fail_conversions.contains(&name);
        let entry = state
            .vms
            .get_mut(vm.id())
            .ok_or_else(|| PlatformError::not_found("vm", vm.id()))?;
        if !skip {
            entry.is_template = true;
        }
        Ok(())
    }

    async fn is_template(&self, vm: &VmRef) -> PlatformResult<bool> {
        self.state()
            .vms
            .get(vm.id())
            .map(|v| v.is_template)
            .ok_or_else(|| PlatformError::not_found("vm", vm.id()))
    }

    async fn create_network(
        &self,
        name: &str,
        vswitch: &str,
        vlan: VlanId,
    ) -> PlatformResult<NetworkRef> {
        self.state()
            .networks
            .insert(name.to_string(), (vswitch.to_string(), vlan.value()));
        Ok(NetworkRef::new(name))
    }

    async fn find_network(&self, name: &str) -> PlatformResult<Option<NetworkRef>> {
        Ok(self
            .state()
            .networks
            .contains_key(name)
            .then(|| NetworkRef::new(name)))
    }

    async fn destroy_network(&self, network: &NetworkRef) -> PlatformResult<()> {
        self.state()
            .networks
            .remove(network.id())
            .map(|_| ())
            .ok_or_else(|| PlatformError::not_found("network", network.id()))
    }

    async fn network_interface_count(&self, vm: &VmRef) -> PlatformResult<usize> {
        self.state()
            .vms
            .get(vm.id())
            .map(|v| v.nics.len())
            .ok_or_else(|| PlatformError::not_found("vm", vm.id()))
    }

    async fn attach_network_interface(
        &self,
        vm: &VmRef,
        index: usize,
        network: &NetworkRef,
        _label: &str,
    ) -> PlatformResult<()> {
        let mut state = self.state();
        if !state.networks.contains_key(network.id()) {
            return Err(PlatformError::not_found("network", network.id()));
        }
        let entry = state
            .vms
            .get_mut(vm.id())
            .ok_or_else(|| PlatformError::not_found("vm", vm.id()))?;
        let slots = entry.nics.len();
        let slot = entry.nics.get_mut(index).ok_or_else(|| {
            PlatformError::operation_failed(
                "attach_network_interface",
                vm.id(),
                format!("interface index {index} out of range ({slots} present)"),
            )
        })?;
        *slot = Some(network.id().to_string());
        Ok(())
    }

    async fn snapshot(
        &self,
        vm: &VmRef,
        label: &str,
        _description: &str,
        _include_memory: bool,
    ) -> PlatformResult<()> {
        self.state()
            .vms
            .get_mut(vm.id())
            .map(|v| v.snapshots.push(label.to_string()))
            .ok_or_else(|| PlatformError::not_found("vm", vm.id()))
    }

    async fn set_annotation(&self, vm: &VmRef, text: &str) -> PlatformResult<()> {
        self.state()
            .vms
            .get_mut(vm.id())
            .map(|v| v.annotation = Some(text.to_string()))
            .ok_or_else(|| PlatformError::not_found("vm", vm.id()))
    }
}
