// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers emulating the EC2 instance metadata credential paths.
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | GET | `/latest/meta-data/iam/security-credentials/` | [`list_roles`] | Name of the caller's role |
//! | GET | `/latest/meta-data/iam/security-credentials/{role}` | [`get_credentials`] | Credentials for the caller |
//!
//! The caller is identified by the peer address of the connection.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Path, State};
use axum::response::IntoResponse;
use serde_json::json;

use crate::application::AppState;
use crate::errors::AppError;
use crate::models::SecurityCredentials;

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Returns the name of the role the caller's credentials were issued for,
/// as plain text.
#[tracing::instrument(skip(state))]
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Result<String, AppError> {
    let credentials = state
        .credentials
        .credentials_for_ip(peer.ip())
        .await
        .map_err(|e| {
            tracing::error!("[proxy] failed to get credentials for {}: {}", peer.ip(), e);
            e
        })?;

    Ok(credentials.role_arn().role_name().to_string())
}

/// Returns the caller's credentials in the EC2 metadata JSON format.
///
/// # Errors
///
/// - [`AppError::RoleNotFound`] - `role` is not the caller's role name
/// - [`AppError::ContainerNotFound`] - the caller is not a known container
/// - [`AppError::AssumeRoleError`] - STS refused the role assumption
#[tracing::instrument(skip(state))]
pub async fn get_credentials(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(role): Path<String>,
) -> Result<Json<SecurityCredentials>, AppError> {
    let credentials = state
        .credentials
        .credentials_for_ip(peer.ip())
        .await
        .map_err(|e| {
            tracing::error!("[proxy] failed to get credentials for {}: {}", peer.ip(), e);
            e
        })?;

    if credentials.role_arn().role_name() != role {
        tracing::warn!("[proxy] {} requested unknown role {}", peer.ip(), role);
        return Err(AppError::RoleNotFound);
    }

    Ok(Json(SecurityCredentials::from(&credentials)))
}
