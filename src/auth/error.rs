// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::codec::DecodeError;
use crate::error::ApiError;

/// Why the gate rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("No authorization token was found")]
    NoCredential,
    /// Header present but not `Bearer <token>`
    #[error("Format is Authorization: Bearer [token]")]
    BadScheme,
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl AuthError {
    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NoCredential => "credentials_required",
            AuthError::BadScheme => "credentials_bad_scheme",
            AuthError::Decode(DecodeError::Malformed) => "invalid_token",
            AuthError::Decode(DecodeError::SignatureInvalid) => "invalid_signature",
            AuthError::Decode(DecodeError::AlgorithmMismatch) => "invalid_algorithm",
            AuthError::Decode(DecodeError::Expired) => "token_expired",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::credential(e.error_code(), e.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
