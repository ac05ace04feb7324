// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use anyhow::Context;
use aws_config::{BehaviorVersion, Region};
use clap::Parser;
use metadata_proxy::application::Application;
use metadata_proxy::arn::RoleArn;
use metadata_proxy::configuration::ProxyOptions;
use metadata_proxy::containers::StaticContainerService;
use metadata_proxy::provider::CredentialsProvider;
use metadata_proxy::sts::StsRoleAssumer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        .init();

    let options = ProxyOptions::parse();

    tracing::info!("[proxy] {:?}", &options);

    let default_role: RoleArn = options
        .default_role
        .as_deref()
        .unwrap_or_default()
        .parse()
        .context("invalid --default-role")?;
    if default_role.is_empty() {
        tracing::warn!("[proxy] no default role set, containers must declare their own role");
    }

    let containers = StaticContainerService::from_file(&options.containers)
        .context("unable to load container manifest")?;

    let sdk_config = {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = options.region.clone() {
            loader = loader.region(Region::new(region));
        }
        loader.load().await
    };
    let sts = StsRoleAssumer::new(&sdk_config);

    let credentials = Arc::new(CredentialsProvider::new(
        Arc::new(containers),
        Arc::new(sts),
        default_role,
        options.default_policy.clone(),
    ));

    let application = Application::build(options, credentials)
        .await
        .context("unable to bind listener")?;

    application.run_until_stopped().await?;

    Ok(())
}
