// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem operations shared by the file-backed stores.
//!
//! JSON documents are replaced atomically: the new content goes to a hidden
//! sibling file that is then renamed over the target, so readers see either
//! the old record or the new one.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use super::StoragePaths;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Storage not initialized")]
    NotInitialized,
    #[error("Invalid file name: {0}")]
    InvalidName(String),
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(e.to_string()),
            _ => StorageError::Io(e),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Hidden sibling used while replacing `path`.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

/// Directory-backed storage rooted at [`StoragePaths::root`].
///
/// Every operation fails with [`StorageError::NotInitialized`] until
/// [`FileStorage::initialize`] ran.
#[derive(Debug, Clone)]
pub struct FileStorage {
    paths: StoragePaths,
    initialized: bool,
}

impl FileStorage {
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the root and `dirs`. Safe to call again.
    pub fn initialize<P: AsRef<Path>>(&mut self, dirs: &[P]) -> StorageResult<()> {
        fs::create_dir_all(self.paths.root())?;
        dirs.iter().try_for_each(|dir| fs::create_dir_all(dir.as_ref()))?;
        self.initialized = true;
        Ok(())
    }

    fn ready(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }

    /// Round-trip a small probe file through the root directory.
    pub fn health_check(&self) -> StorageResult<()> {
        self.ready()?;
        let probe = self.paths.root().join(".probe");
        fs::write(&probe, b"ok")?;
        let echoed = fs::read(&probe);
        fs::remove_file(&probe)?;

        match echoed? {
            bytes if bytes == b"ok" => Ok(()),
            _ => Err(StorageError::Io(io::Error::other("probe content mismatch"))),
        }
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        self.ready()?;
        let bytes = fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Replace `path` with the pretty-printed JSON of `value`.
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        self.ready()?;
        let bytes = serde_json::to_vec_pretty(value)?;
        let target = path.as_ref();
        let staging = staging_path(target);

        fs::write(&staging, &bytes)?;
        if let Err(e) = fs::rename(&staging, target) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }

    /// Write a new file; never overwrites.
    pub fn write_raw(&self, path: impl AsRef<Path>, data: &[u8]) -> StorageResult<()> {
        self.ready()?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    pub fn delete(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        self.ready()?;
        Ok(fs::remove_file(path.as_ref())?)
    }

    /// Stems of the files in `dir` ending in `.{extension}`.
    pub fn list_files(&self, dir: impl AsRef<Path>, extension: &str) -> StorageResult<Vec<String>> {
        self.ready()?;
        let entries = match fs::read_dir(dir.as_ref()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut stems = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let matches_ext = path.extension().is_some_and(|ext| ext == extension);
            if !matches_ext || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.push(stem.to_string());
            }
        }
        Ok(stems)
    }
}
