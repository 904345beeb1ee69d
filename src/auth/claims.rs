// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential claims and the authenticated user representation.

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::store::UserRecord;

/// Decoded content of a bearer token.
///
/// Created at login and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialClaim {
    /// Id of the user the token was issued to.
    pub subject_id: String,
    pub email: String,
    /// Unix timestamp (seconds).
    pub issued_at: i64,
    /// Signing algorithm declared in the token header.
    pub algorithm: Algorithm,
    /// Unix timestamp (seconds); only set when a token TTL is configured.
    pub expires_at: Option<i64>,
}

/// JSON payload of a token.
///
/// Field names are part of the wire format: `id`, `email`, `iat`, `exp`.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenPayload {
    pub id: String,
    pub email: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl CredentialClaim {
    pub(crate) fn payload(&self) -> TokenPayload {
        TokenPayload {
            id: self.subject_id.clone(),
            email: self.email.clone(),
            iat: self.issued_at,
            exp: self.expires_at,
        }
    }

    pub(crate) fn from_payload(payload: TokenPayload, algorithm: Algorithm) -> Self {
        Self {
            subject_id: payload.id,
            email: payload.email,
            issued_at: payload.iat,
            algorithm,
            expires_at: payload.exp,
        }
    }
}

/// Caller whose token decoded and whose identity was confirmed in the store.
///
/// This is the only thing protected handlers use to know who is calling.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claim: CredentialClaim,
    /// Record as read by the confirmation step.
    pub record: UserRecord,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.claim.subject_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_wire_names() {
        let claim = CredentialClaim {
            subject_id: "user_123".to_string(),
            email: "a@example.com".to_string(),
            issued_at: 1_700_000_000,
            algorithm: Algorithm::HS256,
            expires_at: None,
        };

        let json = serde_json::to_value(claim.payload()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "user_123", "email": "a@example.com", "iat": 1_700_000_000})
        );
    }

    #[test]
    fn from_payload_keeps_algorithm() {
        let payload: TokenPayload =
            serde_json::from_str(r#"{"id":"u1","email":"e@x.io","iat":5,"exp":10}"#).unwrap();
        let claim = CredentialClaim::from_payload(payload, Algorithm::HS256);
        assert_eq!(claim.subject_id, "u1");
        assert_eq!(claim.expires_at, Some(10));
        assert_eq!(claim.algorithm, Algorithm::HS256);
    }
}
