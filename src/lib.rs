// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Userhub - User Management Service
//!
//! Registration, login, password change and profile pictures behind a
//! shared-secret bearer token gate.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, path exemptions, gate and identity confirmation
//! - `store` - Identity store contract and in-memory implementation
//! - `storage` - JSON file store and profile picture files

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod password;
pub mod state;
pub mod storage;
pub mod store;
pub mod validation;
