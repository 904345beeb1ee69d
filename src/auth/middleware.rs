// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate for Axum.
//!
//! Every request passes through [`auth_middleware`] before routing:
//!
//! 1. exempt `(method, path)` → continues anonymously, no token is looked at
//! 2. no `Authorization` header → rejected
//! 3. header not `Bearer <token>` → rejected
//! 4. token fails to decode → rejected
//! 5. token decodes → the subject is confirmed in the store, then the
//!    [`AuthenticatedUser`](super::AuthenticatedUser) is attached to the request extensions
//!
//! Rejections short-circuit; no handler runs.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::claims::CredentialClaim;
use super::codec::TokenCodec;
use super::confirmation::IdentityConfirmer;
use super::exemptions::ExemptionTable;
use super::AuthError;

/// Result of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Anonymous,
    Rejected(AuthError),
    Authenticated(CredentialClaim),
}

#[derive(Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    exemptions: Arc<ExemptionTable>,
    confirmer: IdentityConfirmer,
}

impl AuthGate {
    pub fn new(codec: TokenCodec, exemptions: ExemptionTable, confirmer: IdentityConfirmer) -> Self {
        Self {
            codec: Arc::new(codec),
            exemptions: Arc::new(exemptions),
            confirmer,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn exemptions(&self) -> &ExemptionTable {
        &self.exemptions
    }

    /// Decide the outcome for a request. Does not touch the store.
    pub fn evaluate(&self, method: &Method, path: &str, headers: &HeaderMap) -> AuthOutcome {
        if self.exemptions.is_exempt(method, path) {
            return AuthOutcome::Anonymous;
        }

        let token = match bearer_token(headers) {
            Ok(token) => token,
            Err(e) => return AuthOutcome::Rejected(e),
        };

        match self.codec.decode(token) {
            Ok(claim) => AuthOutcome::Authenticated(claim),
            Err(e) => AuthOutcome::Rejected(e.into()),
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::NoCredential)?
        .to_str()
        .map_err(|_| AuthError::BadScheme)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::BadScheme),
    }
}

/// Authentication middleware function.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/protected", get(handler))
///     .layer(axum::middleware::from_fn_with_state(gate, auth_middleware));
/// ```
pub async fn auth_middleware(State(gate): State<AuthGate>, mut request: Request, next: Next) -> Response {
    let outcome = gate.evaluate(request.method(), request.uri().path(), request.headers());

    match outcome {
        AuthOutcome::Anonymous => next.run(request).await,
        AuthOutcome::Rejected(e) => {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                code = e.error_code(),
                "Request rejected by auth gate"
            );
            e.into_response()
        }
        AuthOutcome::Authenticated(claim) => match gate.confirmer.confirm_or_reject(claim).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            Err(e) => e.into_response(),
        },
    }
}
