// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity confirmation.
//!
//! A token that decodes is not enough: the user it names must still exist.
//! The check runs before any protected handler and blocks it; the lookup is
//! bounded by a timeout and never retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::claims::{AuthenticatedUser, CredentialClaim};
use crate::error::ApiError;
use crate::store::UserStore;

#[derive(Clone)]
pub struct IdentityConfirmer {
    store: Arc<dyn UserStore>,
    timeout: Duration,
}

impl IdentityConfirmer {
    pub fn new(store: Arc<dyn UserStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Confirm that the claim's subject exists.
    ///
    /// - found: the confirmed caller
    /// - absent: `NotFoundError` (404)
    /// - store failure or timeout: `UpstreamError` (502)
    pub async fn confirm_or_reject(&self, claim: CredentialClaim) -> Result<AuthenticatedUser, ApiError> {
        let lookup = self.store.find_by_id(&claim.subject_id);
        match timeout(self.timeout, lookup).await {
            Ok(Ok(Some(record))) => Ok(AuthenticatedUser { claim, record }),
            Ok(Ok(None)) => {
                tracing::debug!(user_id = %claim.subject_id, "Token subject no longer exists");
                Err(ApiError::not_found("user_not_found", "User don't exists..."))
            }
            Ok(Err(e)) => {
                tracing::warn!(user_id = %claim.subject_id, error = %e, "Identity lookup failed");
                Err(ApiError::upstream("Database error..."))
            }
            Err(_) => {
                tracing::warn!(
                    user_id = %claim.subject_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Identity lookup timed out"
                );
                Err(ApiError::upstream("Database error..."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use jsonwebtoken::Algorithm;

    use crate::store::{
        InMemoryUserStore, NewUser, StoreError, StoreResult, UserPatch, UserRecord, UserUpdate,
    };

    /// Store whose lookups either fail or hang.
    struct BrokenStore {
        hang: bool,
    }

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_by_id(&self, _id: &str) -> StoreResult<Option<UserRecord>> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<UserRecord>> {
            unimplemented!()
        }
        async fn create(&self, _user: NewUser) -> StoreResult<UserRecord> {
            unimplemented!()
        }
        async fn update_fields(&self, _id: &str, _patch: UserPatch) -> StoreResult<UserUpdate> {
            unimplemented!()
        }
        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    fn claim_for(id: &str) -> CredentialClaim {
        CredentialClaim {
            subject_id: id.to_string(),
            email: "a@example.com".to_string(),
            issued_at: 0,
            algorithm: Algorithm::HS256,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn existing_user_is_confirmed() {
        let store = Arc::new(InMemoryUserStore::new());
        let record = store
            .create(NewUser {
                username: "alice".to_string(),
                email: "a@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let confirmer = IdentityConfirmer::new(store, Duration::from_secs(1));
        let user = confirmer.confirm_or_reject(claim_for(&record.id)).await.unwrap();
        assert_eq!(user.user_id(), record.id);
        assert_eq!(user.record, record);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let confirmer = IdentityConfirmer::new(Arc::new(InMemoryUserStore::new()), Duration::from_secs(1));
        let err = confirmer.confirm_or_reject(claim_for("gone")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code, "user_not_found");
    }

    #[tokio::test]
    async fn store_failure_is_upstream_error() {
        let confirmer = IdentityConfirmer::new(Arc::new(BrokenStore { hang: false }), Duration::from_secs(1));
        let err = confirmer.confirm_or_reject(claim_for("u1")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_store_times_out() {
        let confirmer = IdentityConfirmer::new(Arc::new(BrokenStore { hang: true }), Duration::from_millis(50));
        let err = confirmer.confirm_or_reject(claim_for("u1")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code, "db_error");
    }
}
