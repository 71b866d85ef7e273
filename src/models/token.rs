// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token payload persisted under the token directory.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token file contents: the OAuth exchange response, stored verbatim.
///
/// Refresh responses omit `athlete`; the token store carries the previous
/// athlete object forward when it rewrites the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as epoch seconds
    pub expires_at: i64,
    /// Athlete profile from the authorization-code exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub athlete: Option<Value>,
}

impl TokenPayload {
    /// Whether the access token expires within `margin_secs` of `now`.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at <= now + margin_secs
    }
}
