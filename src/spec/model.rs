// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed Exercise Model
//!
//! A single parse pass over a validated specification document builds
//! tagged-variant types for every polymorphic entity, so downstream
//! consumers never re-inspect raw mapping keys:
//!
//! - [`GroupSpec`] - templated vs. fixed groups with a resolved [`Membership`]
//! - [`ServiceOrigin`] - template / image / compose-file origins
//! - [`FolderNode`] - parent vs. base folders as an explicit tree
//! - [`NetworkSet`] - per-class named network definitions
//!
//! Building the model assumes the document already passed
//! [`verify_exercise_syntax`](crate::spec::verify_exercise_syntax); structural
//! surprises are reported as [`ModelError`] rather than diagnostics.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::domain::{SubnetCidr, VlanId};
use crate::spec::document::{self, Document};
use crate::spec::folders::RESERVED_KEYS;

/// Error building the typed model from a document
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Missing required section: {0}")]
    MissingSection(String),

    #[error("{path}: {detail}")]
    Malformed { path: String, detail: String },
}

impl ModelError {
    fn malformed(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Fully typed exercise specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub metadata: Metadata,
    pub groups: BTreeMap<String, GroupSpec>,
    pub services: BTreeMap<String, ServiceSpec>,
    pub networks: NetworkSet,
    pub folders: BTreeMap<String, FolderNode>,
}

/// Exercise metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub prefix: String,
    pub infra_file: PathBuf,
    pub description: Option<String>,
    pub version: Option<String>,
    pub folder_name: Option<String>,
}

impl Metadata {
    /// Name of the environment's root folder on the platform
    pub fn root_folder_name(&self) -> &str {
        self.folder_name.as_deref().unwrap_or(&self.name)
    }
}

/// How a group's members are specified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Membership {
    /// Active Directory group name
    AdGroup(String),
    /// Path to a JSON user-list file
    FileRef(PathBuf),
    /// Inline user list
    UserList(Vec<String>),
}

/// A named group of users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupSpec {
    /// Instantiated multiple times (scaled per exercise run)
    Templated { instances: u32, membership: Membership },
    /// Used once
    Fixed { membership: Membership },
}

impl GroupSpec {
    pub fn membership(&self) -> &Membership {
        match self {
            GroupSpec::Templated { membership, .. } => membership,
            GroupSpec::Fixed { membership } => membership,
        }
    }

    /// Number of deployable units this group implies, when knowable without
    /// consulting an external directory
    pub fn size(&self) -> Option<u32> {
        match self {
            GroupSpec::Templated { instances, .. } => Some(*instances),
            GroupSpec::Fixed { membership: Membership::UserList(users) } => {
                Some(users.len() as u32)
            }
            GroupSpec::Fixed { .. } => None,
        }
    }
}

/// Where a service is instantiated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceOrigin {
    /// VM template name on the platform
    Template(String),
    /// Container image, with an optional build file
    Image { image: String, dockerfile: Option<String> },
    /// Container composition file
    ComposeFile(PathBuf),
}

/// A deployable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub origin: ServiceOrigin,
    /// Declared network interfaces, by network name, in attachment order
    pub network_interfaces: Vec<String>,
    pub note: Option<String>,
    pub provisioner: Option<Provisioner>,
}

impl ServiceSpec {
    /// The platform template name, for template-origin services
    pub fn template_name(&self) -> Option<&str> {
        match &self.origin {
            ServiceOrigin::Template(name) => Some(name),
            _ => None,
        }
    }
}

/// Post-clone provisioning hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provisioner {
    pub name: String,
    pub file: PathBuf,
}

/// Class of a network definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NetworkClass {
    /// Exists once for the whole environment; may carry a VLAN tag
    Unique,
    /// Recreated per deployment scope; may carry the increment flag
    Generic,
    /// Bottom-level instance networks
    Base,
}

impl NetworkClass {
    pub fn as_key(&self) -> &'static str {
        match self {
            NetworkClass::Unique => "unique-networks",
            NetworkClass::Generic => "generic-networks",
            NetworkClass::Base => "base-networks",
        }
    }
}

/// A named network definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub subnet: Option<SubnetCidr>,
    pub vlan: Option<VlanId>,
    pub increment: bool,
    pub vswitch: Option<String>,
}

/// All declared networks, by class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSet {
    pub unique: BTreeMap<String, NetworkSpec>,
    pub generic: BTreeMap<String, NetworkSpec>,
    pub base: BTreeMap<String, NetworkSpec>,
}

impl NetworkSet {
    /// Iterate every declared network with its class
    pub fn iter(&self) -> impl Iterator<Item = (NetworkClass, &String, &NetworkSpec)> {
        self.unique
            .iter()
            .map(|(n, s)| (NetworkClass::Unique, n, s))
            .chain(self.generic.iter().map(|(n, s)| (NetworkClass::Generic, n, s)))
            .chain(self.base.iter().map(|(n, s)| (NetworkClass::Base, n, s)))
    }

    /// Look up a network definition by name across all classes
    pub fn find(&self, name: &str) -> Option<&NetworkSpec> {
        self.unique
            .get(name)
            .or_else(|| self.generic.get(name))
            .or_else(|| self.base.get(name))
    }
}

/// Declared instance multiplicity of a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceCount {
    /// Fixed number of instances
    Count(u32),
    /// As many instances as the referenced group has members
    SizeOf(String),
}

/// A service reference inside a base folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    /// Name of the service definition being deployed
    pub service: String,
    /// Instance networks this deployment is wired into
    pub networks: Vec<String>,
    pub scoring: Option<Scoring>,
}

/// Scoring definition for a deployed service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoring {
    pub criteria: String,
    pub ports: Vec<u16>,
    pub protocols: Vec<String>,
}

/// A node in the folder tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FolderNode {
    /// Contains nested folder definitions
    Parent {
        instances: Option<InstanceCount>,
        group: Option<String>,
        children: BTreeMap<String, FolderNode>,
    },
    /// Leaf folder containing deployed services
    Base {
        group: String,
        master_group: Option<String>,
        instances: Option<InstanceCount>,
        enabled: bool,
        services: BTreeMap<String, ServiceRef>,
    },
}

impl FolderNode {
    pub fn instances(&self) -> Option<&InstanceCount> {
        match self {
            FolderNode::Parent { instances, .. } => instances.as_ref(),
            FolderNode::Base { instances, .. } => instances.as_ref(),
        }
    }
}

impl ExerciseSpec {
    /// Build the typed model from a validated document
    pub fn from_document(doc: &Document) -> Result<Self, ModelError> {
        let root = document::as_mapping(doc)
            .ok_or_else(|| ModelError::malformed("", "Specification root must be a mapping"))?;

        Ok(Self {
            metadata: parse_metadata(section(root, "metadata")?)?,
            groups: parse_groups(section(root, "groups")?)?,
            services: parse_services(section(root, "services")?)?,
            networks: parse_networks(section(root, "networks")?)?,
            folders: parse_folder_tree(section(root, "folders")?, "folders")?,
        })
    }

    /// Services with a template origin, in declaration order
    pub fn template_services(&self) -> impl Iterator<Item = (&String, &ServiceSpec)> {
        self.services
            .iter()
            .filter(|(_, spec)| matches!(spec.origin, ServiceOrigin::Template(_)))
    }
}

fn section<'a>(root: &'a Mapping, name: &str) -> Result<&'a Mapping, ModelError> {
    document::get(root, name)
        .and_then(document::as_mapping)
        .ok_or_else(|| ModelError::MissingSection(name.to_string()))
}

fn req_str(mapping: &Mapping, key: &str, path: &str) -> Result<String, ModelError> {
    document::get_str(mapping, key)
        .map(str::to_string)
        .ok_or_else(|| ModelError::malformed(path, format!("missing or non-string {key}")))
}

fn opt_str(mapping: &Mapping, key: &str) -> Option<String> {
    document::get_str(mapping, key).map(str::to_string)
}

fn parse_metadata(metadata: &Mapping) -> Result<Metadata, ModelError> {
    let infra_file = document::get_str(metadata, "infra-file")
        .or_else(|| document::get_str(metadata, "infrastructure-config-file"))
        .ok_or_else(|| ModelError::malformed("metadata", "missing infra-file"))?;

    Ok(Metadata {
        name: req_str(metadata, "name", "metadata")?,
        prefix: req_str(metadata, "prefix", "metadata")?,
        infra_file: PathBuf::from(infra_file),
        description: opt_str(metadata, "description"),
        version: opt_str(metadata, "version"),
        folder_name: opt_str(metadata, "folder-name"),
    })
}

fn parse_groups(groups: &Mapping) -> Result<BTreeMap<String, GroupSpec>, ModelError> {
    let mut parsed = BTreeMap::new();
    for (key, value) in groups {
        let name = key_string(key, "groups")?;
        let path = format!("groups/{name}");
        let group = document::as_mapping(value)
            .ok_or_else(|| ModelError::malformed(&path, "group must be a mapping"))?;

        let membership = parse_membership(group, &path)?;
        let spec = match document::get(group, "instances") {
            Some(instances) => {
                let instances = instances
                    .as_u64()
                    .ok_or_else(|| ModelError::malformed(&path, "instances must be an integer"))?;
                GroupSpec::Templated {
                    instances: instances as u32,
                    membership,
                }
            }
            None => GroupSpec::Fixed { membership },
        };
        parsed.insert(name, spec);
    }
    Ok(parsed)
}

fn parse_membership(group: &Mapping, path: &str) -> Result<Membership, ModelError> {
    if let Some(ad_group) = document::get_str(group, "ad-group") {
        return Ok(Membership::AdGroup(ad_group.to_string()));
    }
    if let Some(filename) = document::get_str(group, "filename") {
        return Ok(Membership::FileRef(PathBuf::from(filename)));
    }
    if let Some(users) = document::get(group, "user-list").and_then(|v| v.as_sequence()) {
        let users = users
            .iter()
            .map(|u| {
                u.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ModelError::malformed(path, "user-list entries must be strings"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Membership::UserList(users));
    }
    Err(ModelError::malformed(path, "no membership mechanism"))
}

fn parse_services(services: &Mapping) -> Result<BTreeMap<String, ServiceSpec>, ModelError> {
    let mut parsed = BTreeMap::new();
    for (key, value) in services {
        let name = key_string(key, "services")?;
        let path = format!("services/{name}");
        let service = document::as_mapping(value)
            .ok_or_else(|| ModelError::malformed(&path, "service must be a mapping"))?;

        let origin = parse_origin(service, &path)?;

        let network_interfaces = match document::get(service, "network-interfaces") {
            None => Vec::new(),
            Some(value) => string_sequence(value, &path, "network-interfaces")?,
        };

        let provisioner = match document::get(service, "provisioner").and_then(document::as_mapping)
        {
            None => None,
            Some(prov) => Some(Provisioner {
                name: req_str(prov, "name", &path)?,
                file: PathBuf::from(req_str(prov, "file", &path)?),
            }),
        };

        parsed.insert(
            name,
            ServiceSpec {
                origin,
                network_interfaces,
                note: opt_str(service, "note"),
                provisioner,
            },
        );
    }
    Ok(parsed)
}

fn parse_origin(service: &Mapping, path: &str) -> Result<ServiceOrigin, ModelError> {
    if let Some(template) = document::get_str(service, "template") {
        return Ok(ServiceOrigin::Template(template.to_string()));
    }
    if let Some(image) = document::get_str(service, "image") {
        return Ok(ServiceOrigin::Image {
            image: image.to_string(),
            dockerfile: opt_str(service, "dockerfile"),
        });
    }
    if let Some(compose) = document::get_str(service, "compose-file") {
        return Ok(ServiceOrigin::ComposeFile(PathBuf::from(compose)));
    }
    Err(ModelError::malformed(path, "no service origin"))
}

fn parse_networks(networks: &Mapping) -> Result<NetworkSet, ModelError> {
    let mut set = NetworkSet::default();
    for class in [NetworkClass::Unique, NetworkClass::Generic, NetworkClass::Base] {
        if let Some(entries) = document::get(networks, class.as_key()).and_then(document::as_mapping)
        {
            let parsed = parse_network_class(entries, class)?;
            match class {
                NetworkClass::Unique => set.unique = parsed,
                NetworkClass::Generic => set.generic = parsed,
                NetworkClass::Base => set.base = parsed,
            }
        }
    }
    Ok(set)
}

fn parse_network_class(
    entries: &Mapping,
    class: NetworkClass,
) -> Result<BTreeMap<String, NetworkSpec>, ModelError> {
    let mut parsed = BTreeMap::new();
    for (key, value) in entries {
        let name = key_string(key, class.as_key())?;
        let path = format!("networks/{}/{name}", class.as_key());
        let network = document::as_mapping(value)
            .ok_or_else(|| ModelError::malformed(&path, "network must be a mapping"))?;

        let subnet = match document::get_str(network, "subnet") {
            None => None,
            Some(raw) => Some(
                SubnetCidr::new(raw)
                    .map_err(|err| ModelError::malformed(&path, err.to_string()))?,
            ),
        };
        let vlan = match document::get(network, "vlan") {
            None => None,
            Some(value) => {
                let raw = value
                    .as_u64()
                    .ok_or_else(|| ModelError::malformed(&path, "vlan must be an integer"))?;
                Some(VlanId::new(raw).map_err(|err| ModelError::malformed(&path, err.to_string()))?)
            }
        };
        let increment = document::get(network, "increment")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        parsed.insert(
            name,
            NetworkSpec {
                subnet,
                vlan,
                increment,
                vswitch: opt_str(network, "vswitch"),
            },
        );
    }
    Ok(parsed)
}

fn parse_folder_tree(
    folders: &Mapping,
    path: &str,
) -> Result<BTreeMap<String, FolderNode>, ModelError> {
    let mut parsed = BTreeMap::new();
    for (key, value) in folders {
        let name = key_string(key, path)?;
        if RESERVED_KEYS.contains(&name.as_str()) {
            continue;
        }
        let folder_path = format!("{path}/{name}");
        let folder = document::as_mapping(value)
            .ok_or_else(|| ModelError::malformed(&folder_path, "folder must be a mapping"))?;
        parsed.insert(name, parse_folder_node(folder, &folder_path)?);
    }
    Ok(parsed)
}

fn parse_folder_node(folder: &Mapping, path: &str) -> Result<FolderNode, ModelError> {
    let instances = parse_instances(folder, path)?;

    if let Some(services) = document::get(folder, "services").and_then(document::as_mapping) {
        let group = req_str(folder, "group", path)?;
        let enabled = document::get(folder, "enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let mut refs = BTreeMap::new();
        for (key, value) in services {
            let ref_name = key_string(key, path)?;
            let ref_path = format!("{path}/services/{ref_name}");
            let entry = document::as_mapping(value)
                .ok_or_else(|| ModelError::malformed(&ref_path, "service reference must be a mapping"))?;

            let networks = match document::get(entry, "networks") {
                None => Vec::new(),
                Some(value) => string_sequence(value, &ref_path, "networks")?,
            };
            let scoring = match document::get(entry, "scoring").and_then(document::as_mapping) {
                None => None,
                Some(scoring) => Some(parse_scoring(scoring, &ref_path)?),
            };
            refs.insert(
                ref_name,
                ServiceRef {
                    service: req_str(entry, "service", &ref_path)?,
                    networks,
                    scoring,
                },
            );
        }

        Ok(FolderNode::Base {
            group,
            master_group: opt_str(folder, "master-group"),
            instances,
            enabled,
            services: refs,
        })
    } else {
        Ok(FolderNode::Parent {
            instances,
            group: opt_str(folder, "group"),
            children: parse_folder_tree(folder, path)?,
        })
    }
}

fn parse_instances(folder: &Mapping, path: &str) -> Result<Option<InstanceCount>, ModelError> {
    let Some(instances) = document::get(folder, "instances") else {
        return Ok(None);
    };

    if let Some(count) = instances.as_u64() {
        return Ok(Some(InstanceCount::Count(count as u32)));
    }

    let mapping = document::as_mapping(instances)
        .ok_or_else(|| ModelError::malformed(path, "invalid instances specification"))?;
    if let Some(number) = document::get(mapping, "number") {
        let number = number
            .as_u64()
            .ok_or_else(|| ModelError::malformed(path, "instances number must be an integer"))?;
        return Ok(Some(InstanceCount::Count(number as u32)));
    }
    if let Some(group) = document::get_str(mapping, "size-of") {
        return Ok(Some(InstanceCount::SizeOf(group.to_string())));
    }
    Err(ModelError::malformed(path, "invalid instances specification"))
}

fn parse_scoring(scoring: &Mapping, path: &str) -> Result<Scoring, ModelError> {
    let ports = match document::get(scoring, "ports").and_then(|v| v.as_sequence()) {
        None => Vec::new(),
        Some(ports) => ports
            .iter()
            .map(|p| {
                p.as_u64()
                    .and_then(|p| u16::try_from(p).ok())
                    .ok_or_else(|| ModelError::malformed(path, "scoring ports must be port numbers"))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    let protocols = match document::get(scoring, "protocols") {
        None => Vec::new(),
        Some(value) => string_sequence(value, path, "protocols")?,
    };
    Ok(Scoring {
        criteria: req_str(scoring, "criteria", path)?,
        ports,
        protocols,
    })
}

fn string_sequence(value: &Value, path: &str, field: &str) -> Result<Vec<String>, ModelError> {
    let sequence = value
        .as_sequence()
        .ok_or_else(|| ModelError::malformed(path, format!("{field} must be a list")))?;
    sequence
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| ModelError::malformed(path, format!("{field} entries must be strings")))
        })
        .collect()
}

fn key_string(key: &Value, path: &str) -> Result<String, ModelError> {
    document::key_str(key)
        .map(str::to_string)
        .ok_or_else(|| ModelError::malformed(path, "keys must be strings"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"
metadata:
  name: intro-lab
  prefix: ILAB
  infra-file: infra.yaml
groups:
  Students:
    instances: 8
    ad-group: "Lab Students"
  Instructors:
    user-list: [alice, bob]
services:
  workstation:
    template: Windows10
    network-interfaces: [student-lan]
    note: "Student workstation"
  gateway:
    template: PfSense
    network-interfaces: [wan, student-lan]
networks:
  unique-networks:
    wan:
      subnet: 10.0.0.0/24
      vlan: 100
  generic-networks:
    student-lan:
      subnet: 192.168.0.0/24
      increment: true
folders:
  exercise:
    instances:
      size-of: Students
    lab:
      group: Students
      instances: 2
      services:
        ws:
          service: workstation
          networks: [student-lan]
"#;

    fn model() -> ExerciseSpec {
        ExerciseSpec::from_document(&serde_yaml::from_str(SPEC).unwrap()).unwrap()
    }

    #[test]
    fn test_metadata_and_aliases() {
        let spec = model();
        assert_eq!(spec.metadata.name, "intro-lab");
        assert_eq!(spec.metadata.root_folder_name(), "intro-lab");
        assert_eq!(spec.metadata.infra_file, PathBuf::from("infra.yaml"));
    }

    #[test]
    fn test_group_variants() {
        let spec = model();
        match &spec.groups["Students"] {
            GroupSpec::Templated { instances, membership } => {
                assert_eq!(*instances, 8);
                assert!(matches!(membership, Membership::AdGroup(_)));
            }
            other => panic!("expected templated group, got {other:?}"),
        }
        assert_eq!(spec.groups["Instructors"].size(), Some(2));
    }

    #[test]
    fn test_service_origins() {
        let spec = model();
        assert_eq!(spec.services["workstation"].template_name(), Some("Windows10"));
        assert_eq!(spec.template_services().count(), 2);
    }

    #[test]
    fn test_network_classes() {
        let spec = model();
        assert_eq!(spec.networks.unique["wan"].vlan, Some(VlanId::new(100).unwrap()));
        assert!(spec.networks.generic["student-lan"].increment);
        assert!(spec.networks.find("wan").is_some());
        assert!(spec.networks.find("nope").is_none());
    }

    #[test]
    fn test_folder_tree_shape() {
        let spec = model();
        let FolderNode::Parent { children, instances, .. } = &spec.folders["exercise"] else {
            panic!("expected parent folder");
        };
        assert!(matches!(instances, Some(InstanceCount::SizeOf(g)) if g == "Students"));

        let FolderNode::Base { group, services, instances, .. } = &children["lab"] else {
            panic!("expected base folder");
        };
        assert_eq!(group, "Students");
        assert!(matches!(instances, Some(InstanceCount::Count(2))));
        assert_eq!(services["ws"].service, "workstation");
        assert_eq!(services["ws"].networks, vec!["student-lan"]);
    }

    #[test]
    fn test_infrastructure_alias_key() {
        let doc: Document = serde_yaml::from_str(
            "name: x\nprefix: X\ninfrastructure-config-file: infra.yaml\n",
        )
        .unwrap();
        let metadata = parse_metadata(doc.as_mapping().unwrap()).unwrap();
        assert_eq!(metadata.infra_file, PathBuf::from("infra.yaml"));
    }
}
