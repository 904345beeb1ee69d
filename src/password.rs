// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing.
//!
//! bcrypt is CPU-bound, so both hashing and verification run on the blocking
//! pool instead of the request task.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        Ok(tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("hunter2").await.unwrap();

        assert_ne!(hash, "hunter2");
        assert!(hasher.verify("hunter2", &hash).await.unwrap());
        assert!(!hasher.verify("hunter3", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error() {
        let hasher = PasswordHasher::new(4);
        assert!(hasher.verify("hunter2", "not-a-bcrypt-hash").await.is_err());
    }
}
