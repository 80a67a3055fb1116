// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer token authentication for plugins with `authentication = true`.

use axum::http::{header, HeaderMap};

use crate::guard::GuardRejection;

/// Authentication configuration shared by every plugin guard.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. When `None`, every token is rejected.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl AuthConfig {
    pub fn new(bearer_token: Option<String>) -> Self {
        Self { bearer_token }
    }

    /// Check the `Authorization` header.
    ///
    /// Absent or empty credentials are `AuthMissing`, a non-Bearer scheme is
    /// `AuthMalformed`, and a token that does not match is `AuthInvalid`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<(), GuardRejection> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Err(GuardRejection::AuthMissing);
        };
        let value = value
            .to_str()
            .map_err(|_| GuardRejection::AuthMalformed)?
            .trim();
        if value.is_empty() {
            return Err(GuardRejection::AuthMissing);
        }

        let token = match value.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            None if value.eq_ignore_ascii_case("bearer") => "",
            _ => return Err(GuardRejection::AuthMalformed),
        };
        if token.is_empty() {
            return Err(GuardRejection::AuthMissing);
        }

        match &self.bearer_token {
            Some(expected) if token == expected => Ok(()),
            _ => Err(GuardRejection::AuthInvalid),
        }
    }
}
