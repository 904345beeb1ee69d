// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile picture storage.
//!
//! Uploaded pictures land under `{PUBLIC_DIR}/profile_pic/` with a generated
//! name so they can be served as static files from `/public/profile_pic/`.
//! Disk writes and removals run on the blocking pool.

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use super::{FileStorage, StorageError, StoragePaths, StorageResult};
use crate::config::DEFAULT_PROFILE_PIC;

/// Accepted picture types and the extension they are stored with.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Reasons an uploaded file is refused before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("unsupported content type {0}")]
    UnsupportedType(String),
    #[error("file exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("file is empty")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct ProfilePicStorage {
    storage: FileStorage,
    max_bytes: usize,
}

impl ProfilePicStorage {
    /// Open storage rooted at the public directory.
    pub fn open(public_dir: impl AsRef<Path>, max_bytes: usize) -> StorageResult<Self> {
        let mut storage = FileStorage::new(StoragePaths::new(public_dir));
        let pics_dir = storage.paths().profile_pics_dir();
        storage.initialize(&[pics_dir])?;
        Ok(Self { storage, max_bytes })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check an upload and pick the extension it will be stored with.
    pub fn check(&self, content_type: Option<&str>, len: usize) -> Result<&'static str, UploadRejection> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        let ext = ALLOWED_TYPES
            .iter()
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| UploadRejection::UnsupportedType(content_type.clone()))?;

        if len == 0 {
            return Err(UploadRejection::Empty);
        }
        if len > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(ext)
    }

    /// Persist the picture and return its generated file name.
    pub async fn save<D>(&self, ext: &str, data: D) -> StorageResult<String>
    where
        D: AsRef<[u8]> + Send + 'static,
    {
        let file_name = format!(
            "profile_pic-{}-{}.{ext}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        let storage = self.storage.clone();
        let path = storage.paths().profile_pic(&file_name);
        tokio::task::spawn_blocking(move || storage.write_raw(path, data.as_ref())).await??;
        Ok(file_name)
    }

    /// Remove a previously stored picture. The default avatar is never removed.
    pub async fn remove(&self, file_name: &str) -> StorageResult<()> {
        if file_name == DEFAULT_PROFILE_PIC {
            return Ok(());
        }
        if Path::new(file_name).file_name().and_then(|n| n.to_str()) != Some(file_name) {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        let storage = self.storage.clone();
        let path = storage.paths().profile_pic(file_name);
        tokio::task::spawn_blocking(move || storage.delete(path)).await?
    }

    pub fn health_check(&self) -> StorageResult<()> {
        self.storage.health_check()
    }
}
