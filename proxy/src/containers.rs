// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Container identity resolution.
//!
//! The proxy identifies callers only by their network address. A
//! [`ContainerService`] maps that address to the container's id and the role
//! and policy it declared. [`StaticContainerService`] serves the mapping from a
//! JSON manifest:
//!
//! ```json
//! {
//!   "platform": "docker",
//!   "containers": [
//!     {
//!       "address": "172.17.0.2",
//!       "id": "3f4e8a1b2c",
//!       "role": "arn:aws:iam::123456789012:role/web",
//!       "policy": "{\"Version\":\"2012-10-17\",\"Statement\":[]}"
//!     }
//!   ]
//! }
//! ```
//!
//! `role` and `policy` are optional; an empty string means "not declared".

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::arn::RoleArn;
use crate::constants;
use crate::errors::AppError;

/// Identity of a running container as seen by the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    /// Empty when the container did not declare a role.
    pub iam_role: RoleArn,
    /// `None` when the container did not declare a policy.
    pub iam_policy: Option<String>,
}

impl ContainerInfo {
    pub fn new(id: impl Into<String>, iam_role: RoleArn, iam_policy: Option<String>) -> Self {
        Self {
            id: id.into(),
            iam_role,
            iam_policy: iam_policy.filter(|policy| !policy.trim().is_empty()),
        }
    }
}

#[async_trait]
pub trait ContainerService: Send + Sync {
    /// Resolves the container behind `address`.
    async fn container_for_ip(&self, address: IpAddr) -> Result<ContainerInfo, AppError>;

    /// Platform tag used when naming role sessions, e.g. `docker`.
    fn type_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ContainerManifest {
    #[serde(default = "default_platform")]
    platform: String,
    #[serde(default)]
    containers: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    address: IpAddr,
    id: String,
    #[serde(default)]
    role: RoleArn,
    #[serde(default)]
    policy: Option<String>,
}

fn default_platform() -> String {
    constants::DEFAULT_PLATFORM.to_string()
}

/// Container lookups served from a fixed address table.
#[derive(Debug)]
pub struct StaticContainerService {
    platform: String,
    containers: HashMap<IpAddr, ContainerInfo>,
}

impl StaticContainerService {
    pub fn new(platform: impl Into<String>, containers: HashMap<IpAddr, ContainerInfo>) -> Self {
        Self {
            platform: platform.into(),
            containers,
        }
    }

    /// Parses a JSON manifest. Duplicate addresses and invalid role ARNs are
    /// rejected.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let manifest: ContainerManifest =
            serde_json::from_str(json).map_err(|e| AppError::ConfigError(e.to_string()))?;

        let mut containers = HashMap::with_capacity(manifest.containers.len());
        for entry in manifest.containers {
            if entry.id.trim().is_empty() {
                return Err(AppError::ConfigError(format!(
                    "container at {} has an empty id",
                    entry.address
                )));
            }
            let info = ContainerInfo::new(entry.id, entry.role, entry.policy);
            if containers.insert(entry.address, info).is_some() {
                return Err(AppError::ConfigError(format!(
                    "duplicate container address {}",
                    entry.address
                )));
            }
        }

        Ok(Self::new(manifest.platform, containers))
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("unable to read {}: {}", path.display(), e))
        })?;
        let service = Self::from_json(&json)?;

        tracing::info!(
            "[proxy] loaded {} containers from {}",
            service.containers.len(),
            path.display()
        );

        Ok(service)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

#[async_trait]
impl ContainerService for StaticContainerService {
    async fn container_for_ip(&self, address: IpAddr) -> Result<ContainerInfo, AppError> {
        self.containers
            .get(&address)
            .cloned()
            .ok_or_else(|| AppError::ContainerNotFound(address.to_string()))
    }

    fn type_name(&self) -> &str {
        &self.platform
    }
}
