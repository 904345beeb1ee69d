// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Shared-secret bearer token authentication for the Userhub API.
//!
//! ## Auth Flow
//!
//! 1. `POST /api/v1/users/login` verifies the password and issues an HS256
//!    token carrying `{id, email, iat}`
//! 2. Clients send `Authorization: Bearer <token>`
//! 3. The gate ([`middleware::auth_middleware`]) runs before routing:
//!    - exempt `(method, path)` pairs pass anonymously
//!    - everything else must present a token that decodes with the secret
//!    - the token subject must still exist in the user store
//!
//! ## Security
//!
//! - Unknown paths require authentication (fail-closed)
//! - Only HS256 is accepted; other declared algorithms are rejected
//! - Tokens carry no expiry unless `TOKEN_TTL_SECS` is configured

pub mod claims;
pub mod codec;
pub mod confirmation;
pub mod error;
pub mod exemptions;
pub mod extractor;
pub mod middleware;

pub use claims::{AuthenticatedUser, CredentialClaim};
pub use codec::{DecodeError, TokenCodec};
pub use confirmation::IdentityConfirmer;
pub use error::AuthError;
pub use exemptions::{ExemptionRule, ExemptionTable, MethodSet, PathMatcher};
pub use extractor::Auth;
pub use middleware::{auth_middleware, AuthGate, AuthOutcome};
