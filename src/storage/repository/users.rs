// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed user repository.
//!
//! Each user is stored as a separate JSON file under `{DATA_DIR}/users/`.
//! An email index is rebuilt from disk at startup and kept in memory; all
//! writes go through a single mutex so the index and the files never
//! disagree about which email belongs to which user.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::storage::{FileStorage, StorageError, StoragePaths, StorageResult};
use crate::store::{NewUser, StoreError, StoreResult, UserPatch, UserRecord, UserStore, UserUpdate};

pub struct FileUserStore {
    storage: FileStorage,
    /// email -> user id
    emails: Mutex<HashMap<String, String>>,
}

impl FileUserStore {
    /// Open (creating if needed) the store rooted at `root`.
    pub fn open(root: impl AsRef<std::path::Path>) -> StorageResult<Self> {
        let mut storage = FileStorage::new(StoragePaths::new(root));
        let users_dir = storage.paths().users_dir();
        storage.initialize(&[users_dir])?;

        let mut emails = HashMap::new();
        for id in storage.list_files(storage.paths().users_dir(), "json")? {
            match storage.read_json::<UserRecord>(storage.paths().user(&id)) {
                Ok(user) => {
                    emails.insert(user.email, user.id);
                }
                Err(e) => tracing::warn!(user_id = %id, error = %e, "Skipping unreadable user record"),
            }
        }
        tracing::info!(users = emails.len(), "File user store loaded");

        Ok(Self {
            storage,
            emails: Mutex::new(emails),
        })
    }

    fn read(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        match self.storage.read_json(self.storage.paths().user(id)) {
            Ok(user) => Ok(Some(user)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => StoreError::NotFound(what),
            StorageError::AlreadyExists(what) => StoreError::Conflict(what),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        // Ids are uuids; anything else cannot name a file we wrote.
        if uuid::Uuid::parse_str(id).is_err() {
            return Ok(None);
        }
        self.read(id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let id = self.emails.lock().await.get(email).cloned();
        match id {
            Some(id) => self.read(&id),
            None => Ok(None),
        }
    }

    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut emails = self.emails.lock().await;
        if emails.contains_key(&user.email) {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }

        let record = user.into_record();
        self.storage
            .write_json(self.storage.paths().user(&record.id), &record)?;
        emails.insert(record.email.clone(), record.id.clone());
        Ok(record)
    }

    async fn update_fields(&self, id: &str, patch: UserPatch) -> StoreResult<UserUpdate> {
        let _guard = self.emails.lock().await;
        let previous = self
            .read(id)?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;

        let mut current = previous.clone();
        patch.apply(&mut current);
        self.storage
            .write_json(self.storage.paths().user(id), &current)?;

        Ok(UserUpdate { previous, current })
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(self.storage.health_check()?)
    }
}
