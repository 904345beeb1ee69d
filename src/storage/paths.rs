// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path layout for file storage.

use std::path::{Path, PathBuf};

/// Storage path utilities rooted at a configurable directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    /// Directory containing all user records.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a specific user record.
    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    // ========== Upload Paths ==========

    /// Directory containing uploaded profile pictures.
    pub fn profile_pics_dir(&self) -> PathBuf {
        self.root.join("profile_pic")
    }

    /// Path to a stored profile picture.
    pub fn profile_pic(&self, file_name: &str) -> PathBuf {
        self.profile_pics_dir().join(file_name)
    }
}
