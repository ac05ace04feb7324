// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Role assumption against the AWS Security Token Service.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::Client;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::primitives::DateTime as SdkDateTime;
use chrono::{DateTime, Utc};

use crate::arn::RoleArn;
use crate::errors::AppError;

/// Parameters for a single `AssumeRole` call.
#[derive(Debug, Clone, PartialEq)]
pub struct AssumeRoleRequest {
    pub role_arn: RoleArn,
    /// Omitted from the call when `None`.
    pub policy: Option<String>,
    pub session_name: String,
    pub duration_seconds: i32,
}

/// Temporary credentials as returned by STS.
#[derive(Clone)]
pub struct AssumedRole {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

#[async_trait]
pub trait RoleAssumer: Send + Sync {
    /// Errors from the remote service are returned as-is; no retries happen here.
    async fn assume_role(&self, request: AssumeRoleRequest) -> Result<AssumedRole, AppError>;
}

/// [`RoleAssumer`] backed by the AWS SDK STS client.
#[derive(Debug, Clone)]
pub struct StsRoleAssumer {
    client: Client,
}

impl StsRoleAssumer {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn expiration_to_utc(expiration: &SdkDateTime) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos()).ok_or_else(|| {
        AppError::AssumeRoleError(format!("credential expiration out of range: {}", expiration))
    })
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    #[tracing::instrument(
        skip(self, request),
        fields(role_arn = %request.role_arn, session_name = %request.session_name)
    )]
    async fn assume_role(&self, request: AssumeRoleRequest) -> Result<AssumedRole, AppError> {
        let output = self
            .client
            .assume_role()
            .role_arn(request.role_arn.as_str())
            .role_session_name(request.session_name)
            .duration_seconds(request.duration_seconds)
            .set_policy(request.policy)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!("[proxy] sts:AssumeRole failed: {}", message);
                AppError::AssumeRoleError(message)
            })?;

        let credentials = output.credentials().ok_or_else(|| {
            AppError::AssumeRoleError("STS returned no credentials".to_string())
        })?;

        let expiration = expiration_to_utc(credentials.expiration())?;

        tracing::debug!("[proxy] assumed role, expires_at: {}", expiration);

        Ok(AssumedRole {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration,
        })
    }
}
