// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # File Storage Module
//!
//! Plain filesystem persistence for the file-backed user store and for
//! uploaded profile pictures.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   users/
//!     {user_id}.json      # One user record per file
//! {PUBLIC_DIR}/
//!   profile_pic/
//!     empty-avatar.jpg    # Default avatar, never deleted
//!     profile_pic-*.png   # Uploaded pictures
//! ```

pub mod fs;
pub mod paths;
pub mod repository;
pub mod uploads;

pub use fs::{FileStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::FileUserStore;
pub use uploads::{ProfilePicStorage, UploadRejection};
