// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity store contract and the in-memory implementation.
//!
//! The service never assumes a storage engine. Handlers and the
//! authentication gate talk to a [`UserStore`] through four operations; the
//! store alone enforces email uniqueness, so two concurrent registrations with
//! the same email resolve to one success and one [`StoreError::Conflict`].
//!
//! The file-backed store lives in [`crate::storage::repository::users`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::DEFAULT_PROFILE_PIC;

/// A stored user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never serialized into API responses.
    pub password_hash: String,
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`UserStore::create`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    /// Materialize a record with a fresh id and the default picture.
    pub fn into_record(self) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4().to_string(),
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            profile_pic: DEFAULT_PROFILE_PIC.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub profile_pic: Option<String>,
}

impl UserPatch {
    /// Apply to a record, bumping `updated_at`.
    pub fn apply(self, record: &mut UserRecord) {
        if let Some(username) = self.username {
            record.username = username;
        }
        if let Some(password_hash) = self.password_hash {
            record.password_hash = password_hash;
        }
        if let Some(profile_pic) = self.profile_pic {
            record.profile_pic = profile_pic;
        }
        record.updated_at = Utc::now();
    }
}

/// Result of [`UserStore::update_fields`].
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub previous: UserRecord,
    pub current: UserRecord,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;
    /// Insert a user; fails with `Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord>;
    async fn update_fields(&self, id: &str, patch: UserPatch) -> StoreResult<UserUpdate>;
    fn backend_name(&self) -> &'static str;

    /// Readiness probe of the backing medium.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    /// email -> id
    emails: HashMap<String, String>,
}

/// Volatile store for development and tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        // Check and insert under one write lock so the email index stays unique.
        let mut inner = self.inner.write().await;
        if inner.emails.contains_key(&user.email) {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }
        let record = user.into_record();
        inner.emails.insert(record.email.clone(), record.id.clone());
        inner.users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_fields(&self, id: &str, patch: UserPatch) -> StoreResult<UserUpdate> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.users.get_mut(id) else {
            return Err(StoreError::NotFound(format!("user {id}")));
        };
        let previous = record.clone();
        patch.apply(record);
        Ok(UserUpdate {
            previous,
            current: record.clone(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_default_picture() {
        let store = InMemoryUserStore::new();
        let record = store.create(new_user("a@example.com")).await.unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(record.profile_pic, DEFAULT_PROFILE_PIC);
        assert_eq!(store.find_by_id(&record.id).await.unwrap(), Some(record.clone()));
        assert_eq!(
            store.find_by_email("a@example.com").await.unwrap(),
            Some(record)
        );
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();
        let err = store.create(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn concurrent_creates_yield_single_winner() {
        let store = Arc::new(InMemoryUserStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_user("race@example.com")).await })
            })
            .collect();

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(StoreError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn update_returns_previous_and_current() {
        let store = InMemoryUserStore::new();
        let record = store.create(new_user("a@example.com")).await.unwrap();

        let update = store
            .update_fields(
                &record.id,
                UserPatch {
                    profile_pic: Some("new.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(update.previous.profile_pic, DEFAULT_PROFILE_PIC);
        assert_eq!(update.current.profile_pic, "new.png");
        assert_eq!(update.current.username, "alice");
        assert!(update.current.updated_at >= update.previous.updated_at);
    }

    #[tokio::test]
    async fn update_unknown_user_is_not_found() {
        let store = InMemoryUserStore::new();
        let err = store
            .update_fields("missing", UserPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
