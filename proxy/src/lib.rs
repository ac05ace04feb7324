// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Metadata Proxy
//!
//! Container-scoped AWS credentials behind an EC2 instance metadata
//! compatible HTTP API.
//!
//! Containers call the proxy as if it were the instance metadata service. The
//! proxy identifies each caller by IP address, looks up the role the
//! container declared, assumes that role through STS and hands back short
//! lived credentials.
//!
//! ## Architecture
//!
//! ```text
//! Container -> HTTP API -> CredentialsProvider -> cache hit? -> Credentials
//!                               |
//!                               +-> ContainerService (address -> id, role, policy)
//!                               +-> RoleAssumer (sts:AssumeRole)
//! ```
//!
//! ## Modules
//!
//! - [`application`]: HTTP server setup with Axum
//! - [`arn`]: IAM role ARN parsing
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Configuration constants for the application
//! - [`containers`]: Container identity lookup by address
//! - [`credentials`]: Temporary credentials and cache entries
//! - [`errors`]: Application error types with HTTP response mapping
//! - [`models`]: EC2 metadata response types
//! - [`provider`]: Per-container credential cache
//! - [`routes`]: HTTP route handlers
//! - [`session`]: STS role session naming
//! - [`sts`]: Role assumption through AWS STS
//!
//! ## Usage
//!
//! ```bash
//! metadata-proxy --containers /etc/metadata-proxy/containers.json \
//!     --default-role arn:aws:iam::123456789012:role/container-default
//! ```
//!
//! ## Security Considerations
//!
//! - Credentials are refreshed 5 minutes before expiry
//! - Sensitive credential data is zeroized on drop and redacted from logs
//! - A container only ever receives credentials for the role it declared, or
//!   the default role when it declared none

pub mod application;
pub mod arn;
pub mod configuration;
pub mod constants;
pub mod containers;
pub mod credentials;
pub mod errors;
pub mod models;
pub mod provider;
pub mod routes;
pub mod session;
pub mod sts;
