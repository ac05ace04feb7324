// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use crate::constants::{MAX_SESSION_NAME_LENGTH, SESSION_NAME_REPLACEMENT, SESSION_NAME_SYMBOLS};

#[inline]
fn is_session_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || SESSION_NAME_SYMBOLS.contains(c)
}

/// Builds an STS role session name of the form `<platform>-<container id>`.
///
/// Characters STS rejects are replaced with `_` and the result is cut to at
/// most [`MAX_SESSION_NAME_LENGTH`] characters. Shorter names are returned as-is.
pub fn generate_session_name(platform: &str, container_id: &str) -> String {
    format!("{}-{}", platform, container_id)
        .chars()
        .map(|c| {
            if is_session_name_char(c) {
                c
            } else {
                SESSION_NAME_REPLACEMENT
            }
        })
        .take(MAX_SESSION_NAME_LENGTH)
        .collect()
}
