// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{debug_span, Span};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::auth_middleware,
    error::{ApiError, ErrorBody, ErrorKind},
    models::{
        ChangePasswordForm, LoginForm, LoginResponse, MessageResponse, ProfilePicUpload,
        RegisterForm, UploadResponse, UserProfile, UserResponse,
    },
    state::AppState,
};

pub mod health;
pub mod users;

/// Multipart framing allowance on top of the picture size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let prefix = state.config.users_prefix();
    let upload_limit = state.profile_pics.max_bytes() + MULTIPART_OVERHEAD;

    let routes = Router::new()
        .route("/", get(home))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(&prefix, get(users::index))
        .route(&format!("{prefix}/"), get(users::index))
        .route(&format!("{prefix}/register"), post(users::register))
        .route(&format!("{prefix}/login"), post(users::login))
        .route(&format!("{prefix}/change_password"), put(users::change_password))
        .route(
            &format!("{prefix}/uploadProfilePic"),
            post(users::upload_profile_pic).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .nest_service("/public", ServeDir::new(&state.config.public_dir))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .with_state(state.clone());

    routes
        .layer(from_fn_with_state(state.auth.clone(), auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::permissive()),
        )
}

/// API home route.
#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Home page", body = MessageResponse),
        (status = 400, description = "Missing or invalid token", body = ErrorBody),
    )
)]
pub async fn home() -> Json<MessageResponse> {
    Json(MessageResponse::ok("Userhub REST API Home Page."))
}

async fn not_found() -> ApiError {
    ApiError::not_found("route_not_found", "Route not found")
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!(
        "http-request",
        method = %request.method(),
        path = request.uri().path(),
        request_id
    )
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        home,
        health::health,
        health::liveness,
        health::readiness,
        users::index,
        users::register,
        users::login,
        users::change_password,
        users::upload_profile_pic
    ),
    components(
        schemas(
            RegisterForm,
            LoginForm,
            ProfilePicUpload,
            ChangePasswordForm,
            UserProfile,
            UserResponse,
            LoginResponse,
            UploadResponse,
            MessageResponse,
            ErrorBody,
            ErrorKind,
            health::ReadyResponse,
            health::HealthChecks,
            health::ComponentStatus,
            health::HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Users", description = "Registration, login and profile management"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
