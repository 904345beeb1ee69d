// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the user endpoints. Form fields are
//! optional at the serde level so that a missing field is reported by
//! [`crate::validation`] with its message key instead of failing JSON
//! extraction.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::UserRecord;

// =============================================================================
// Request Forms
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Must equal `password`.
    pub password2: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    pub username: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    /// Must equal `newPassword`.
    pub new_password2: Option<String>,
}

/// Multipart body of the profile picture upload.
#[derive(Debug, ToSchema)]
pub struct ProfilePicUpload {
    #[schema(value_type = String, format = Binary)]
    pub profile_pic: Vec<u8>,
}

// =============================================================================
// Responses
// =============================================================================

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile_pic: String,
}

impl From<&UserRecord> for UserProfile {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            username: record.username.clone(),
            email: record.email.clone(),
            profile_pic: record.profile_pic.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub status: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
        }
    }
}

/// Body of register and change-password responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub status: bool,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub status: bool,
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub status: bool,
    pub message: String,
    pub user: UserProfile,
}
