// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared-secret token codec.
//!
//! Tokens are HS256 JWTs. By default no `exp` claim is issued, so a token
//! stays valid for as long as the secret does. Configuring a TTL adds `exp`
//! to new tokens and decoding then rejects them once expired.

use std::collections::HashSet;
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use thiserror::Error;

use super::claims::{CredentialClaim, TokenPayload};

/// Fixed signing algorithm.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;
const TOKEN_ALGORITHM_NAME: &str = "HS256";

/// Clock skew tolerance for `exp` (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Header fields read before handing the token to `jsonwebtoken`, whose
/// `Algorithm` enum cannot represent names such as `none`.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Algorithm named in the token header, if the header segment parses.
fn declared_algorithm(token: &str) -> Option<String> {
    let (header, _) = token.split_once('.')?;
    let bytes = Base64UrlUnpadded::decode_vec(header).ok()?;
    serde_json::from_slice::<RawHeader>(&bytes).ok().map(|h| h.alg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Token is malformed")]
    Malformed,
    #[error("Token signature is invalid")]
    SignatureInvalid,
    #[error("Token algorithm is not accepted")]
    AlgorithmMismatch,
    #[error("Token has expired")]
    Expired,
}

/// Signing failed; never caused by client input.
#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct IssueError(#[from] jsonwebtoken::errors::Error);

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Option<Duration>) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // `exp` is checked only when the token carries one.
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        validation.leeway = CLOCK_SKEW_LEEWAY;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Build the claim for a user logging in now.
    pub fn claim_for(&self, subject_id: impl Into<String>, email: impl Into<String>) -> CredentialClaim {
        let issued_at = Utc::now().timestamp();
        CredentialClaim {
            subject_id: subject_id.into(),
            email: email.into(),
            issued_at,
            algorithm: TOKEN_ALGORITHM,
            expires_at: self.ttl.map(|ttl| {
                let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                issued_at.saturating_add(secs)
            }),
        }
    }

    /// Sign a claim. Deterministic for a given claim and secret.
    pub fn issue(&self, claim: &CredentialClaim) -> Result<String, IssueError> {
        let header = Header::new(TOKEN_ALGORITHM);
        Ok(encode(&header, &claim.payload(), &self.encoding_key)?)
    }

    pub fn decode(&self, token: &str) -> Result<CredentialClaim, DecodeError> {
        match declared_algorithm(token) {
            Some(alg) if alg != TOKEN_ALGORITHM_NAME => return Err(DecodeError::AlgorithmMismatch),
            Some(_) => {}
            None => return Err(DecodeError::Malformed),
        }

        let data = decode::<TokenPayload>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => DecodeError::SignatureInvalid,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    DecodeError::AlgorithmMismatch
                }
                ErrorKind::ExpiredSignature => DecodeError::Expired,
                _ => DecodeError::Malformed,
            }
        })?;

        Ok(CredentialClaim::from_payload(data.claims, data.header.alg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &[u8] = b"test-secret";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, None)
    }

    /// Replace the first character of the signature segment with a different
    /// base64url character, which always decodes to a different signature.
    fn flip_signature(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{head}.{}", chars.into_iter().collect::<String>())
    }

    #[test]
    fn decode_inverts_issue() {
        let codec = codec();
        for (id, email) in [
            ("64b7f0c2a1", "a@example.com"),
            ("2f1e6c1e-5d8a-4b0e-9a43-0d9b7c0f3f11", "someone.else+tag@mail.example.org"),
            ("x", "ü@example.com"),
        ] {
            let claim = codec.claim_for(id, email);
            let token = codec.issue(&claim).unwrap();
            assert_eq!(codec.decode(&token), Ok(claim));
        }
    }

    #[test]
    fn issue_is_deterministic() {
        let codec = codec();
        let claim = codec.claim_for("u1", "a@example.com");
        assert_eq!(codec.issue(&claim).unwrap(), codec.issue(&claim).unwrap());
    }

    #[test]
    fn no_expiry_is_issued_by_default() {
        let codec = codec();
        let claim = codec.claim_for("u1", "a@example.com");
        assert_eq!(claim.expires_at, None);

        // A token issued long ago still decodes.
        let old = CredentialClaim {
            issued_at: 0,
            ..claim
        };
        let token = codec.issue(&old).unwrap();
        assert_eq!(codec.decode(&token), Ok(old));
    }

    #[test]
    fn flipped_signature_is_rejected() {
        let codec = codec();
        let token = codec.issue(&codec.claim_for("u1", "a@example.com")).unwrap();
        assert_eq!(
            codec.decode(&flip_signature(&token)),
            Err(DecodeError::SignatureInvalid)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let other = TokenCodec::new(b"another-secret", None);
        let token = other.issue(&other.claim_for("u1", "a@example.com")).unwrap();
        assert_eq!(codec().decode(&token), Err(DecodeError::SignatureInvalid));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec();
        let token = codec.issue(&codec.claim_for("u1", "a@example.com")).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(br#"{"id":"admin","email":"a@example.com","iat":0}"#);
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);
        assert_eq!(codec.decode(&tampered), Err(DecodeError::SignatureInvalid));
    }

    /// Swap the header of a valid token for one declaring `alg`.
    fn with_header_alg(token: &str, alg: &str) -> String {
        let (_, rest) = token.split_once('.').unwrap();
        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"typ":"JWT","alg":"{alg}"}}"#));
        format!("{header}.{rest}")
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let payload = codec().claim_for("u1", "a@example.com").payload();
        let token = encode(
            &Header::new(Algorithm::HS384),
            &payload,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_eq!(codec().decode(&token), Err(DecodeError::AlgorithmMismatch));

        let valid = codec().issue(&codec().claim_for("u1", "a@example.com")).unwrap();
        for alg in ["none", "HS999", "RS256", "HS512", "hs256"] {
            assert_eq!(
                codec().decode(&with_header_alg(&valid, alg)),
                Err(DecodeError::AlgorithmMismatch),
                "alg={alg}"
            );
        }
    }

    #[test]
    fn unsigned_none_token_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let body = URL_SAFE_NO_PAD.encode(br#"{"id":"u1","email":"a@example.com","iat":0}"#);
        assert_eq!(
            codec().decode(&format!("{header}.{body}.")),
            Err(DecodeError::AlgorithmMismatch)
        );
    }

    #[test]
    fn header_without_alg_is_malformed() {
        let valid = codec().issue(&codec().claim_for("u1", "a@example.com")).unwrap();
        let (_, rest) = valid.split_once('.').unwrap();
        let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT"}"#);
        assert_eq!(
            codec().decode(&format!("{header}.{rest}")),
            Err(DecodeError::Malformed)
        );
    }

    #[test]
    fn huge_ttl_saturates_instead_of_wrapping() {
        let codec = TokenCodec::new(SECRET, Some(Duration::from_secs(u64::MAX)));
        let claim = codec.claim_for("u1", "a@example.com");
        assert_eq!(claim.expires_at, Some(i64::MAX));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        assert_eq!(codec.decode("not-a-token"), Err(DecodeError::Malformed));
        assert_eq!(codec.decode(""), Err(DecodeError::Malformed));
        assert_eq!(codec.decode("a.b.c"), Err(DecodeError::Malformed));
    }

    #[test]
    fn ttl_adds_expiry_and_is_enforced() {
        let codec = TokenCodec::new(SECRET, Some(Duration::from_secs(3600)));
        let claim = codec.claim_for("u1", "a@example.com");
        assert_eq!(claim.expires_at, Some(claim.issued_at + 3600));
        let token = codec.issue(&claim).unwrap();
        assert_eq!(codec.decode(&token), Ok(claim.clone()));

        let expired = CredentialClaim {
            issued_at: 1_000,
            expires_at: Some(2_000),
            ..claim
        };
        let token = codec.issue(&expired).unwrap();
        assert_eq!(codec.decode(&token), Err(DecodeError::Expired));
    }
}
