// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed Platform Configuration
//!
//! The infrastructure document is resolved into one typed configuration per
//! declared platform. Only vSphere and Docker carry structured settings;
//! the remaining recognized platforms are accepted as passthrough entries so
//! a specification written for them still validates end to end.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::domain::Hostname;
use crate::errors::{OrchestratorError, OrchestratorResult};
use crate::spec::document::{self, Document};

/// Capacity warning thresholds for a vSphere deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Instances per folder before a capacity warning
    pub folder: u32,
    /// Instances per service before a capacity warning
    pub service: u32,
}

/// VMware vSphere connection and placement settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VsphereConfig {
    pub hostname: Hostname,
    /// Path of the folder holding source templates
    pub template_folder: String,
    pub port: Option<u16>,
    pub login_file: Option<PathBuf>,
    pub datacenter: Option<String>,
    pub datastore: Option<String>,
    /// Path below the platform root all environments are created under
    pub server_root: Option<String>,
    /// Default virtual switch for created port-groups
    pub vswitch: Option<String>,
    pub host_list: Vec<String>,
    pub thresholds: Option<Thresholds>,
}

/// Docker endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerConfig {
    pub url: Option<String>,
    pub registry: Option<RegistryConfig>,
}

/// Private registry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub url: String,
    pub login_file: PathBuf,
}

/// One platform entry from the infrastructure document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformConfig {
    VmwareVsphere(VsphereConfig),
    Docker(DockerConfig),
    /// Recognized but not deeply configured (forward compatibility)
    Passthrough { platform: String },
}

impl PlatformConfig {
    /// Resolve every platform entry of an infrastructure document
    ///
    /// An unrecognized platform name is a configuration fatal here (unlike
    /// during validation, where it is a counted error): provisioning cannot
    /// select an interface for a platform it does not know.
    pub fn from_document(doc: &Document) -> OrchestratorResult<Vec<Self>> {
        let root = document::as_mapping(doc).ok_or_else(|| {
            OrchestratorError::Configuration("Infrastructure root must be a mapping".to_string())
        })?;

        let mut configs = Vec::new();
        for (key, value) in root {
            let platform = document::key_str(key).ok_or_else(|| {
                OrchestratorError::Configuration("Platform keys must be strings".to_string())
            })?;
            let config = document::as_mapping(value).ok_or_else(|| {
                OrchestratorError::Configuration(format!(
                    "Configuration for {platform} must be a mapping"
                ))
            })?;

            configs.push(match platform {
                "vmware-vsphere" => Self::VmwareVsphere(parse_vsphere(config)?),
                "docker" => Self::Docker(parse_docker(config)?),
                "amazon-aws" | "digital-ocean" | "hyper-v" => Self::Passthrough {
                    platform: platform.to_string(),
                },
                other => {
                    return Err(OrchestratorError::Configuration(format!(
                        "Invalid platform: {other}"
                    )))
                }
            });
        }
        Ok(configs)
    }
}

fn parse_vsphere(config: &Mapping) -> OrchestratorResult<VsphereConfig> {
    let hostname = document::get_str(config, "hostname")
        .ok_or_else(|| OrchestratorError::Configuration("vSphere hostname missing".to_string()))?;
    let hostname = Hostname::new(hostname)
        .map_err(|err| OrchestratorError::Configuration(format!("vSphere hostname: {err}")))?;

    let template_folder = document::get_str(config, "template-folder")
        .ok_or_else(|| {
            OrchestratorError::Configuration("vSphere template-folder missing".to_string())
        })?
        .to_string();

    let port = document::get(config, "port")
        .and_then(serde_yaml::Value::as_u64)
        .and_then(|p| u16::try_from(p).ok());

    let host_list = match document::get(config, "host-list").and_then(|v| v.as_sequence()) {
        None => Vec::new(),
        Some(hosts) => hosts
            .iter()
            .filter_map(|h| h.as_str().map(str::to_string))
            .collect(),
    };

    let thresholds = document::get(config, "thresholds")
        .and_then(document::as_mapping)
        .and_then(|t| {
            Some(Thresholds {
                folder: document::get(t, "folder")?.as_u64()? as u32,
                service: document::get(t, "service")?.as_u64()? as u32,
            })
        });

    Ok(VsphereConfig {
        hostname,
        template_folder,
        port,
        login_file: document::get_str(config, "login-file").map(PathBuf::from),
        datacenter: document::get_str(config, "datacenter").map(str::to_string),
        datastore: document::get_str(config, "datastore").map(str::to_string),
        server_root: document::get_str(config, "server-root").map(str::to_string),
        vswitch: document::get_str(config, "vswitch").map(str::to_string),
        host_list,
        thresholds,
    })
}

fn parse_docker(config: &Mapping) -> OrchestratorResult<DockerConfig> {
    let registry = match document::get(config, "registry").and_then(document::as_mapping) {
        None => None,
        Some(registry) => Some(RegistryConfig {
            url: document::get_str(registry, "url")
                .ok_or_else(|| {
                    OrchestratorError::Configuration("Docker registry url missing".to_string())
                })?
                .to_string(),
            login_file: document::get_str(registry, "login-file")
                .map(PathBuf::from)
                .ok_or_else(|| {
                    OrchestratorError::Configuration(
                        "Docker registry login-file missing".to_string(),
                    )
                })?,
        }),
    };

    Ok(DockerConfig {
        url: document::get_str(config, "url").map(str::to_string),
        registry,
    })
}
