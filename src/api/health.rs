// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Ok,
    Unavailable,
}

impl ComponentStatus {
    fn from_probe<E: std::fmt::Display>(component: &str, probe: Result<(), E>) -> Self {
        match probe {
            Ok(()) => ComponentStatus::Ok,
            Err(e) => {
                tracing::warn!(component, error = %e, "Health probe failed");
                ComponentStatus::Unavailable
            }
        }
    }
}

/// Readiness report.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// "ok" when every component is usable, otherwise "degraded".
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// `memory` or `file`.
    pub store_backend: String,
    pub store: ComponentStatus,
    /// Profile picture directory.
    pub uploads: ComponentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

async fn probe(state: &AppState) -> (StatusCode, Json<ReadyResponse>) {
    let checks = HealthChecks {
        store_backend: state.users.backend_name().to_string(),
        store: ComponentStatus::from_probe("store", state.users.health_check().await),
        uploads: ComponentStatus::from_probe("uploads", state.profile_pics.health_check()),
    };
    let ready = checks.store == ComponentStatus::Ok && checks.uploads == ComponentStatus::Ok;

    let (status, label) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        status,
        Json(ReadyResponse {
            status: label.to_string(),
            checks,
        }),
    )
}

/// Overall health of the store and upload directory.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All components usable", body = ReadyResponse),
        (status = 503, description = "A component is unavailable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    probe(&state).await
}

/// Process liveness; checks nothing else.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness for traffic. Same checks as `/health`.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready for traffic", body = ReadyResponse),
        (status = 503, description = "Not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    probe(&state).await
}
