// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use zeroize::ZeroizeOnDrop;

use crate::constants::{CREDENTIALS_CODE_SUCCESS, CREDENTIALS_TYPE};
use crate::credentials::Credentials;

/// Body of `GET /latest/meta-data/iam/security-credentials/{role}`, in the
/// same shape the EC2 instance metadata service returns.
#[derive(Clone, Serialize, ZeroizeOnDrop)]
pub struct SecurityCredentials {
    #[serde(rename = "Code")]
    #[zeroize(skip)]
    pub code: &'static str,

    #[serde(rename = "LastUpdated")]
    pub last_updated: String,

    #[serde(rename = "Type")]
    #[zeroize(skip)]
    pub credentials_type: &'static str,

    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,

    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,

    #[serde(rename = "Token")]
    pub session_token: String,

    #[serde(rename = "Expiration")]
    pub expiration: String,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for SecurityCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityCredentials")
            .field("code", &self.code)
            .field("last_updated", &self.last_updated)
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&Credentials> for SecurityCredentials {
    fn from(credentials: &Credentials) -> Self {
        Self {
            code: CREDENTIALS_CODE_SUCCESS,
            last_updated: format_timestamp(credentials.generated_at()),
            credentials_type: CREDENTIALS_TYPE,
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: format_timestamp(credentials.expiration()),
        }
    }
}
