// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.
//!
//! Register and login are exempt from authentication; everything else runs
//! behind the gate and reads the confirmed caller through [`Auth`].

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{
    ChangePasswordForm, LoginForm, LoginResponse, MessageResponse, ProfilePicUpload, RegisterForm,
    UploadResponse, UserProfile, UserResponse,
};
use crate::password::PasswordError;
use crate::state::AppState;
use crate::storage::UploadRejection;
use crate::store::{NewUser, StoreError, UserPatch};
use crate::validation::{validate_change_password, validate_login, validate_register};

/// Multipart field carrying the uploaded picture.
pub const PROFILE_PIC_FIELD: &str = "profile_pic";

fn invalid_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected request body");
    ApiError::bad_request("invalid_body", "Request body is not valid JSON")
        .with_field("body", "validation.invalid_body")
}

fn store_failure(e: StoreError) -> ApiError {
    match e {
        StoreError::Conflict(_) => email_exists(),
        StoreError::NotFound(_) => ApiError::not_found("user_not_found", "User don't exists..."),
        StoreError::Unavailable(reason) => {
            tracing::warn!(error = %reason, "User store unavailable");
            ApiError::upstream("Database error...")
        }
    }
}

fn password_failure(e: PasswordError) -> ApiError {
    tracing::error!(error = %e, "Password hashing failed");
    ApiError::internal("Password processing failed")
}

fn email_exists() -> ApiError {
    ApiError::conflict("email_exists", "User email already exists")
        .with_field("email", "validation.email_exists")
}

fn upload_error() -> ApiError {
    ApiError::bad_request("profile_pic_error", "File upload fail...")
        .with_field("profile_pic", "validation.profile_pic_error")
}

fn upload_empty() -> ApiError {
    ApiError::bad_request("profile_pic_empty", "Please upload profile pic...")
        .with_field("profile_pic", "validation.profile_pic_empty")
}

/// User default route.
#[utoipa::path(
    get,
    path = "/api/v1/users/",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Default route", body = MessageResponse),
        (status = 400, description = "Missing or invalid token", body = crate::error::ErrorBody),
    )
)]
pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse::ok("User default route."))
}

/// Register a new user.
///
/// The email is the unique key; a second registration with the same email
/// is refused with 409 even when both requests race.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    tag = "Users",
    request_body = RegisterForm,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Form validation error", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 502, description = "Store failure", body = crate::error::ErrorBody),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(form) = body.map_err(invalid_body)?;
    let input = validate_register(&form)?;

    if state
        .users
        .find_by_email(&input.email)
        .await
        .map_err(store_failure)?
        .is_some()
    {
        return Err(email_exists());
    }

    let password_hash = state.hasher.hash(&input.password).await.map_err(password_failure)?;
    let record = state
        .users
        .create(NewUser {
            username: input.username,
            email: input.email,
            password_hash,
        })
        .await
        .map_err(store_failure)?;

    tracing::info!(user_id = %record.id, "User registered");
    Ok(Json(UserResponse {
        status: true,
        user: UserProfile::from(&record),
    }))
}

/// Verify credentials and issue a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "Users",
    request_body = LoginForm,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Validation error or wrong password", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown email", body = crate::error::ErrorBody),
        (status = 502, description = "Store failure", body = crate::error::ErrorBody),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginForm>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(form) = body.map_err(invalid_body)?;
    let input = validate_login(&form)?;

    let record = state
        .users
        .find_by_email(&input.email)
        .await
        .map_err(store_failure)?
        .ok_or_else(|| {
            ApiError::not_found("email_not_exists", "User don't exists")
                .with_field("email", "validation.email_not_exists")
        })?;

    let matches = state
        .hasher
        .verify(&input.password, &record.password_hash)
        .await
        .map_err(password_failure)?;
    if !matches {
        return Err(ApiError::credential("password_not_match", "Password don't match...")
            .with_field("password", "validation.password_not_match"));
    }

    let codec = state.auth.codec();
    let token = codec
        .issue(&codec.claim_for(&record.id, &record.email))
        .map_err(|e| {
            tracing::error!(error = %e, "Token signing failed");
            ApiError::internal("Token signing failed")
        })?;

    Ok(Json(LoginResponse {
        status: true,
        message: "User login success".to_string(),
        token,
        user: UserProfile::from(&record),
    }))
}

/// Change the caller's password and username.
#[utoipa::path(
    put,
    path = "/api/v1/users/change_password",
    tag = "Users",
    security(("bearer" = [])),
    request_body = ChangePasswordForm,
    responses(
        (status = 200, description = "Password changed", body = UserResponse),
        (status = 400, description = "Validation error or wrong old password", body = crate::error::ErrorBody),
        (status = 404, description = "User no longer exists", body = crate::error::ErrorBody),
        (status = 502, description = "Store failure", body = crate::error::ErrorBody),
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Auth(user): Auth,
    body: Result<Json<ChangePasswordForm>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(form) = body.map_err(invalid_body)?;
    let input = validate_change_password(&form)?;

    let matches = state
        .hasher
        .verify(&input.old_password, &user.record.password_hash)
        .await
        .map_err(password_failure)?;
    if !matches {
        return Err(
            ApiError::credential("oldPassword_not_match", "Old password not match in database.")
                .with_field("oldPassword", "validation.oldPassword_not_match"),
        );
    }

    let password_hash = state.hasher.hash(&input.new_password).await.map_err(password_failure)?;
    let update = state
        .users
        .update_fields(
            user.user_id(),
            UserPatch {
                username: Some(input.username),
                password_hash: Some(password_hash),
                profile_pic: None,
            },
        )
        .await
        .map_err(store_failure)?;

    tracing::info!(user_id = %update.current.id, "Password changed");
    Ok(Json(UserResponse {
        status: true,
        user: UserProfile::from(&update.current),
    }))
}

/// Upload a new profile picture.
///
/// The previous picture is removed best-effort once the record points at
/// the new one.
#[utoipa::path(
    post,
    path = "/api/v1/users/uploadProfilePic",
    tag = "Users",
    security(("bearer" = [])),
    request_body(content = ProfilePicUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File upload success", body = UploadResponse),
        (status = 400, description = "No file or rejected file", body = crate::error::ErrorBody),
        (status = 502, description = "Store failure", body = crate::error::ErrorBody),
    )
)]
pub async fn upload_profile_pic(
    State(state): State<AppState>,
    Auth(user): Auth,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Upload is not multipart");
        upload_empty()
    })?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!(error = %e, "Malformed multipart body");
        upload_error()
    })? {
        if field.name() != Some(PROFILE_PIC_FIELD) || field.file_name().is_none() {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map_err(|e| {
            tracing::debug!(error = %e, "Failed to read uploaded file");
            upload_error()
        })?;
        upload = Some((content_type, data));
        break;
    }

    let (content_type, data) = upload.ok_or_else(upload_empty)?;
    let ext = state
        .profile_pics
        .check(content_type.as_deref(), data.len())
        .map_err(|rejection| {
            tracing::debug!(reason = %rejection, "Upload rejected");
            match rejection {
                UploadRejection::Empty => upload_empty(),
                UploadRejection::UnsupportedType(_) | UploadRejection::TooLarge { .. } => upload_error(),
            }
        })?;

    let file_name = state.profile_pics.save(ext, data).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to store profile picture");
        upload_error()
    })?;

    let update = match state
        .users
        .update_fields(
            user.user_id(),
            UserPatch {
                profile_pic: Some(file_name.clone()),
                ..Default::default()
            },
        )
        .await
    {
        Ok(update) => update,
        Err(e) => {
            if let Err(cleanup) = state.profile_pics.remove(&file_name).await {
                tracing::warn!(file = %file_name, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(store_failure(e));
        }
    };

    let previous = &update.previous.profile_pic;
    if previous != &file_name {
        if let Err(e) = state.profile_pics.remove(previous).await {
            tracing::warn!(file = %previous, error = %e, "Failed to remove previous profile picture");
        }
    }

    Ok(Json(UploadResponse {
        status: true,
        message: "File upload success".to_string(),
        user: UserProfile::from(&update.current),
    }))
}
