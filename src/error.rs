// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error translation.
//!
//! Every failure the service reports, from the authentication gate to the
//! user handlers, is converted into an [`ApiError`] and rendered with one
//! JSON shape:
//!
//! ```json
//! {
//!   "status": false,
//!   "status_code": 400,
//!   "code": "invalid_signature",
//!   "type": "CredentialError",
//!   "message": "Token signature is invalid",
//!   "error": { "field": "validation.key" }
//! }
//! ```
//!
//! `error` is only present for field-scoped failures.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Error classes exposed to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ErrorKind {
    ValidationError,
    CredentialError,
    NotFoundError,
    ConflictError,
    UpstreamError,
    InternalError,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::ValidationError | ErrorKind::CredentialError => StatusCode::BAD_REQUEST,
            ErrorKind::NotFoundError => StatusCode::NOT_FOUND,
            ErrorKind::ConflictError => StatusCode::CONFLICT,
            ErrorKind::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
    /// Field name to message key, for field-scoped failures.
    pub fields: BTreeMap<String, String>,
}

/// Wire representation of [`ApiError`].
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub status: bool,
    pub status_code: u16,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub error: BTreeMap<String, String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field-scoped message key.
    pub fn with_field(mut self, field: impl Into<String>, key: impl Into<String>) -> Self {
        self.fields.insert(field.into(), key.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Form validation failure carrying every offending field.
    pub fn validation(fields: BTreeMap<String, String>) -> Self {
        Self {
            kind: ErrorKind::ValidationError,
            code: "validation_failed",
            message: "Form validation error...".to_string(),
            fields,
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, code, message)
    }

    pub fn credential(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialError, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFoundError, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConflictError, code, message)
    }

    /// Backing store failure.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamError, "db_error", message)
            .with_field("db_error", "validation.db_error")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, "internal_error", message)
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            status: false,
            status_code: self.status().as_u16(),
            code: self.code.to_string(),
            kind: self.kind,
            message: self.message.clone(),
            error: self.fields.clone(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({}): {}", self.kind, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn kinds_map_to_status_codes() {
        assert_eq!(ErrorKind::ValidationError.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::CredentialError.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotFoundError.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::ConflictError.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::UpstreamError.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorKind::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_carries_db_error_field() {
        let err = ApiError::upstream("Database error...");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.fields.get("db_error").map(String::as_str), Some("validation.db_error"));
    }

    #[tokio::test]
    async fn into_response_renders_shared_shape() {
        let response = ApiError::conflict("email_exists", "User email already exists")
            .with_field("email", "validation.email_exists")
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["status"], false);
        assert_eq!(body["status_code"], 409);
        assert_eq!(body["code"], "email_exists");
        assert_eq!(body["type"], "ConflictError");
        assert_eq!(body["message"], "User email already exists");
        assert_eq!(body["error"]["email"], "validation.email_exists");
    }

    #[tokio::test]
    async fn error_map_is_omitted_when_empty() {
        let response = ApiError::internal("boom").into_response();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert!(body.get("error").is_none());
        assert_eq!(body["type"], "InternalError");
    }
}
