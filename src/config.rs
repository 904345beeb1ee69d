// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] value built from them at startup. The configuration is passed
//! explicitly into the token codec, the authentication gate and the handlers;
//! nothing reads the environment after `AppConfig::from_env()` returns.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `API_VERSION` | API route prefix | `/api/v1` |
//! | `SECRET` | Shared secret used to sign bearer tokens | Required |
//! | `TOKEN_TTL_SECS` | Lifetime of issued tokens | Unset (no expiry) |
//! | `IDENTITY_LOOKUP_TIMEOUT_MS` | Bound on the identity confirmation lookup | `5000` |
//! | `BCRYPT_COST` | Password hashing cost | `12` |
//! | `DATA_DIR` | Root of the JSON file user store | Unset (in-memory store) |
//! | `PUBLIC_DIR` | Static file root | `./public` |
//! | `PROFILE_PIC_MAX_BYTES` | Upload size limit | `2097152` |
//! | `TLS_CERT_PATH` | PEM certificate chain for HTTPS | Unset |
//! | `TLS_KEY_PATH` | PEM private key for HTTPS | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const API_VERSION_ENV: &str = "API_VERSION";
pub const SECRET_ENV: &str = "SECRET";
pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const IDENTITY_LOOKUP_TIMEOUT_ENV: &str = "IDENTITY_LOOKUP_TIMEOUT_MS";
pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";

/// Environment variable name for the file-backed user store root.
///
/// When unset the service keeps users in memory, which is only suitable for
/// development and tests.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const PUBLIC_DIR_ENV: &str = "PUBLIC_DIR";
pub const PROFILE_PIC_MAX_BYTES_ENV: &str = "PROFILE_PIC_MAX_BYTES";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_API_VERSION: &str = "/api/v1";
pub const DEFAULT_PUBLIC_DIR: &str = "./public";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
pub const DEFAULT_IDENTITY_LOOKUP_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_PROFILE_PIC_MAX_BYTES: usize = 2 * 1024 * 1024;

/// Upper bound for `TOKEN_TTL_SECS` (ten years).
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Profile picture every new user starts with. Never deleted from disk.
pub const DEFAULT_PROFILE_PIC: &str = "empty-avatar.jpg";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// TLS material for serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Process-wide configuration, built once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Route prefix for the versioned API, e.g. `/api/v1`.
    pub api_version: String,
    pub token_secret: String,
    /// `None` keeps issued tokens valid forever.
    pub token_ttl: Option<Duration>,
    pub identity_lookup_timeout: Duration,
    pub bcrypt_cost: u32,
    pub data_dir: Option<PathBuf>,
    pub public_dir: PathBuf,
    pub profile_pic_max_bytes: usize,
    pub tls: Option<TlsPaths>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_version", &self.api_version)
            .field("token_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("identity_lookup_timeout", &self.identity_lookup_timeout)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("data_dir", &self.data_dir)
            .field("public_dir", &self.public_dir)
            .field("profile_pic_max_bytes", &self.profile_pic_max_bytes)
            .field("tls", &self.tls)
            .finish()
    }
}

impl AppConfig {
    /// Configuration with defaults for everything except the secret.
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_version: DEFAULT_API_VERSION.to_string(),
            token_secret: token_secret.into(),
            token_ttl: None,
            identity_lookup_timeout: DEFAULT_IDENTITY_LOOKUP_TIMEOUT,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            data_dir: None,
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            profile_pic_max_bytes: DEFAULT_PROFILE_PIC_MAX_BYTES,
            tls: None,
        }
    }

    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(SECRET_ENV)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing(SECRET_ENV))?;
        let mut config = Self::new(secret);

        if let Some(host) = lookup(HOST_ENV) {
            config.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.port = parse(PORT_ENV, &port)?;
        }
        if let Some(prefix) = lookup(API_VERSION_ENV) {
            config.api_version = normalize_prefix(&prefix);
        }
        if let Some(ttl) = lookup(TOKEN_TTL_ENV) {
            let secs: u64 = parse(TOKEN_TTL_ENV, &ttl)?;
            if secs > MAX_TOKEN_TTL_SECS {
                return Err(ConfigError::Invalid {
                    name: TOKEN_TTL_ENV,
                    value: ttl,
                });
            }
            config.token_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(ms) = lookup(IDENTITY_LOOKUP_TIMEOUT_ENV) {
            config.identity_lookup_timeout = Duration::from_millis(parse(IDENTITY_LOOKUP_TIMEOUT_ENV, &ms)?);
        }
        if let Some(cost) = lookup(BCRYPT_COST_ENV) {
            let cost: u32 = parse(BCRYPT_COST_ENV, &cost)?;
            if !(4..=31).contains(&cost) {
                return Err(ConfigError::Invalid {
                    name: BCRYPT_COST_ENV,
                    value: cost.to_string(),
                });
            }
            config.bcrypt_cost = cost;
        }
        config.data_dir = lookup(DATA_DIR_ENV).map(PathBuf::from);
        if let Some(dir) = lookup(PUBLIC_DIR_ENV) {
            config.public_dir = PathBuf::from(dir);
        }
        if let Some(max) = lookup(PROFILE_PIC_MAX_BYTES_ENV) {
            config.profile_pic_max_bytes = parse(PROFILE_PIC_MAX_BYTES_ENV, &max)?;
        }
        config.tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(config)
    }

    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            name: HOST_ENV,
            value: raw,
        })
    }

    /// Route prefix of the user endpoints, e.g. `/api/v1/users`.
    pub fn users_prefix(&self) -> String {
        format!("{}/users", self.api_version)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn secret_is_required() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.err(), Some(ConfigError::Missing(SECRET_ENV)));
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup_from(&[("SECRET", "s3cret")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.api_version, "/api/v1");
        assert_eq!(config.users_prefix(), "/api/v1/users");
        assert!(config.token_ttl.is_none());
        assert!(config.data_dir.is_none());
        assert!(config.tls.is_none());
        assert_eq!(config.public_dir, PathBuf::from(DEFAULT_PUBLIC_DIR));
    }

    #[test]
    fn api_version_is_normalized() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SECRET", "s3cret"),
            ("API_VERSION", "api/v2/"),
        ]))
        .unwrap();
        assert_eq!(config.api_version, "/api/v2");
    }

    #[test]
    fn zero_ttl_means_no_expiry() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", "0"),
        ]))
        .unwrap();
        assert!(config.token_ttl.is_none());
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", "18446744073709551615"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: TOKEN_TTL_ENV, .. })));

        let config = AppConfig::from_lookup(lookup_from(&[
            ("SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", &MAX_TOKEN_TTL_SECS.to_string()),
        ]))
        .unwrap();
        assert_eq!(config.token_ttl, Some(Duration::from_secs(MAX_TOKEN_TTL_SECS)));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[("SECRET", "s3cret"), ("PORT", "http")]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: PORT_ENV, .. })));
    }

    #[test]
    fn tls_requires_both_paths() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("SECRET", "s3cret"),
            ("TLS_CERT_PATH", "/etc/cert.pem"),
        ]));
        assert_eq!(result.err(), Some(ConfigError::Missing(TLS_KEY_PATH_ENV)));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = AppConfig::new("very-secret-value");
        assert!(!format!("{config:?}").contains("very-secret-value"));
    }
}
