// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Temporary credential values and the cache entries built from them.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use zeroize::ZeroizeOnDrop;

use crate::arn::RoleArn;
use crate::constants;
use crate::containers::ContainerInfo;

/// A temporary credential set returned by a single role assumption.
///
/// Never mutated once built; a refresh produces a new value.
#[derive(Clone, PartialEq, ZeroizeOnDrop)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    #[zeroize(skip)]
    role_arn: RoleArn,
    #[zeroize(skip)]
    expiration: DateTime<Utc>,
    #[zeroize(skip)]
    generated_at: DateTime<Utc>,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("role_arn", &self.role_arn)
            .field("expiration", &self.expiration)
            .field("generated_at", &self.generated_at)
            .finish()
    }
}

impl Credentials {
    /// `generated_at` is clamped so it never falls after `expiration`.
    pub fn new(
        access_key_id: String,
        secret_access_key: String,
        session_token: String,
        role_arn: RoleArn,
        expiration: DateTime<Utc>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            session_token,
            role_arn,
            expiration,
            generated_at: generated_at.min(expiration),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn role_arn(&self) -> &RoleArn {
        &self.role_arn
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// True iff `at` is strictly after the expiration.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at > self.expiration
    }

    pub fn is_expired_now(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// True iff the credentials will be expired at `now + window`.
    pub fn expires_within_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        // a window too large to represent is past any expiration
        TimeDelta::from_std(window)
            .ok()
            .and_then(|window| now.checked_add_signed(window))
            .is_none_or(|deadline| self.is_expired_at(deadline))
    }

    pub fn expires_within(&self, window: Duration) -> bool {
        self.expires_within_at(Utc::now(), window)
    }
}

/// Credentials paired with the container snapshot they were issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerCredentials {
    pub container: ContainerInfo,
    pub credentials: Credentials,
}

impl ContainerCredentials {
    pub fn new(container: ContainerInfo, credentials: Credentials) -> Self {
        Self {
            container,
            credentials,
        }
    }

    /// An entry may be reused only while the container still has the same id
    /// and role, and the credentials are outside the refresh buffer.
    pub fn is_valid(&self, container: &ContainerInfo) -> bool {
        self.is_valid_at(container, Utc::now())
    }

    pub fn is_valid_at(&self, container: &ContainerInfo, now: DateTime<Utc>) -> bool {
        self.container.iam_role == container.iam_role
            && self.container.id == container.id
            && !self
                .credentials
                .expires_within_at(now, constants::CREDENTIAL_REFRESH_BUFFER)
    }
}
