// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthGate, ExemptionTable, IdentityConfirmer, TokenCodec};
use crate::config::AppConfig;
use crate::password::PasswordHasher;
use crate::storage::{ProfilePicStorage, StorageError};
use crate::store::UserStore;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid exemption rule: {0}")]
    Exemptions(#[from] regex::Error),
    #[error("profile picture storage: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub auth: AuthGate,
    pub hasher: PasswordHasher,
    pub profile_pics: Arc<ProfilePicStorage>,
}

impl AppState {
    /// Wire the gate, hasher and upload storage from the configuration.
    pub fn new(config: AppConfig, users: Arc<dyn UserStore>) -> Result<Self, StateError> {
        let codec = TokenCodec::new(config.token_secret.as_bytes(), config.token_ttl);
        let exemptions = ExemptionTable::default_rules(&config.api_version)?;
        let confirmer = IdentityConfirmer::new(users.clone(), config.identity_lookup_timeout);
        let profile_pics = ProfilePicStorage::open(&config.public_dir, config.profile_pic_max_bytes)?;

        Ok(Self {
            hasher: PasswordHasher::new(config.bcrypt_cost),
            auth: AuthGate::new(codec, exemptions, confirmer),
            profile_pics: Arc::new(profile_pics),
            users,
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::path::Path;

    use crate::store::InMemoryUserStore;

    pub const TEST_SECRET: &str = "test-secret";

    /// State over an in-memory store with cheap hashing and uploads under `public_dir`.
    pub fn state_with(users: Arc<dyn UserStore>, public_dir: &Path) -> AppState {
        let mut config = AppConfig::new(TEST_SECRET);
        config.bcrypt_cost = 4;
        config.public_dir = public_dir.to_path_buf();
        config.profile_pic_max_bytes = 1024;
        AppState::new(config, users).unwrap()
    }

    pub fn memory_state(public_dir: &Path) -> AppState {
        state_with(Arc::new(InMemoryUserStore::new()), public_dir)
    }
}
