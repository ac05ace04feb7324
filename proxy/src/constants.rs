// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

/// https://docs.aws.amazon.com/STS/latest/APIReference/API_AssumeRole.html
/// one hour is the maximum allowed when role chaining
pub const ASSUME_ROLE_DURATION_SECONDS: i32 = 3600;
pub const CREDENTIAL_REFRESH_BUFFER: Duration = Duration::from_secs(300); // refresh 5 minutes before expiry
pub const MAX_SESSION_NAME_LENGTH: usize = 32;
/// Characters allowed in a role session name besides ASCII word characters
pub const SESSION_NAME_SYMBOLS: &str = "+=,.@-";
pub const SESSION_NAME_REPLACEMENT: char = '_';
pub const DEFAULT_PLATFORM: &str = "static";
pub const CREDENTIALS_TYPE: &str = "AWS-HMAC";
pub const CREDENTIALS_CODE_SUCCESS: &str = "Success";
