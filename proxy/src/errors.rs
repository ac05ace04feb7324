// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AppError {
    #[error("no container found for address {0}")]
    ContainerNotFound(String),
    #[error("unable to assume role: {0}")]
    AssumeRoleError(String),
    #[error("no role configured for container {0} and no default role set")]
    RoleNotConfigured(String),
    #[error("invalid role arn: {0}")]
    InvalidRoleArn(String),
    #[error("role not found")]
    RoleNotFound,
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::ContainerNotFound(_) => (StatusCode::NOT_FOUND, "Container not found".to_string()),
            Self::RoleNotFound => (StatusCode::NOT_FOUND, "Role not found".to_string()),
            Self::AssumeRoleError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to assume role".to_string(),
            ),
            Self::RoleNotConfigured(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "No role configured".to_string(),
            ),
            Self::InvalidRoleArn(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({"code": status.as_u16(), "message": message}));

        (status, body).into_response()
    }
}
