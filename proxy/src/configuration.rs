// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ProxyOptions {
    #[arg(long, default_value = "127.0.0.1", env("METADATA_PROXY_HOST"))]
    pub host: String,
    #[arg(long, default_value = "18000", env("METADATA_PROXY_PORT"))]
    pub port: u16,
    /// JSON manifest mapping container addresses to ids, roles and policies
    #[arg(long, env("METADATA_PROXY_CONTAINERS"))]
    pub containers: PathBuf,
    /// Role assumed for containers that do not declare one
    #[arg(long, env("METADATA_PROXY_DEFAULT_ROLE"))]
    pub default_role: Option<String>,
    /// Session policy applied along with the default role
    #[arg(long, env("METADATA_PROXY_DEFAULT_POLICY"))]
    pub default_policy: Option<String>,
    #[arg(long, env("METADATA_PROXY_REGION"))]
    pub region: Option<String>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        ProxyOptions {
            host: "127.0.0.1".to_string(),
            port: 18000,
            containers: PathBuf::from("containers.json"),
            default_role: None,
            default_policy: None,
            region: None,
        }
    }
}
