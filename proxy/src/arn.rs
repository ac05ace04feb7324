// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! IAM role identifiers.
//!
//! A [`RoleArn`] is either empty (no role was declared, so the caller falls
//! back to the configured default) or a validated role ARN of the form:
//!
//! ```text
//! arn:<partition>:iam::<account-id>:role/<optional-path/><role-name>
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::AppError;

const ARN_PREFIX: &str = "arn";
const IAM_SERVICE: &str = "iam";
const ROLE_RESOURCE_PREFIX: &str = "role/";
const ACCOUNT_ID_LENGTH: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct RoleArn {
    arn: String,
}

impl RoleArn {
    /// Returns a role identifier with no role specified.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.arn.is_empty()
    }

    /// The canonical string form of the ARN (empty for an unset role).
    pub fn as_str(&self) -> &str {
        &self.arn
    }

    /// The segment after the last `/`, e.g. `app` for `arn:aws:iam::123456789012:role/svc/app`.
    pub fn role_name(&self) -> &str {
        self.arn.rsplit('/').next().unwrap_or_default()
    }

    pub fn account_id(&self) -> &str {
        self.arn.split(':').nth(4).unwrap_or_default()
    }

    pub fn partition(&self) -> &str {
        self.arn.split(':').nth(1).unwrap_or_default()
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arn)
    }
}

impl FromStr for RoleArn {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(Self::empty());
        }

        let invalid = || AppError::InvalidRoleArn(value.to_string());

        // arn:partition:service:region:account:resource
        let parts: Vec<&str> = value.splitn(6, ':').collect();
        let [prefix, partition, service, region, account, resource] = parts.as_slice() else {
            return Err(invalid());
        };

        if *prefix != ARN_PREFIX || partition.is_empty() || *service != IAM_SERVICE {
            return Err(invalid());
        }
        // IAM is a global service, role ARNs never carry a region
        if !region.is_empty() {
            return Err(invalid());
        }
        if account.len() != ACCOUNT_ID_LENGTH || !account.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let name = resource
            .strip_prefix(ROLE_RESOURCE_PREFIX)
            .and_then(|path| path.rsplit('/').next())
            .ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            arn: value.to_string(),
        })
    }
}

impl TryFrom<String> for RoleArn {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
