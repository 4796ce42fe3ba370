// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into a
//! [`ServerConfig`]. Unset variables take their defaults; set but invalid
//! values are a startup error.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `DATA_DIR` | Root directory of the per-user sandboxes | `./files` |
//! | `SESSION_TTL_SECS` | Session lifetime in seconds | `300` |
//! | `SESSION_SWEEP_INTERVAL_SECS` | Expired-session sweep interval | `60` |
//! | `CIPHER_KEY_BITS` | AES key size (`128`, `192`, `256`) | `256` |
//! | `PAYLOAD_PADDING` | Payload padding (`none` or `pkcs7`) | `none` |
//! | `PRINCIPALS_FILE` | JSON array of `{"username", "password"}` entries | built-in users |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{reaper::DEFAULT_SWEEP_INTERVAL, DEFAULT_SESSION_TTL};
use crate::crypto::{KeySize, Padding};
use crate::storage::paths::DATA_ROOT;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
/// Environment variable name for the sandbox root directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const SWEEP_INTERVAL_ENV: &str = "SESSION_SWEEP_INTERVAL_SECS";
pub const CIPHER_KEY_BITS_ENV: &str = "CIPHER_KEY_BITS";
pub const PAYLOAD_PADDING_ENV: &str = "PAYLOAD_PADDING";
pub const PRINCIPALS_FILE_ENV: &str = "PRINCIPALS_FILE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_PORT: u16 = 5000;
/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// An environment variable holding an unusable value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {var}: expected {expected}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub key_size: KeySize,
    pub padding: Padding,
    pub principals_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DATA_ROOT),
            session_ttl: DEFAULT_SESSION_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            key_size: KeySize::default(),
            padding: Padding::default(),
            principals_file: None,
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let host = match get(HOST_ENV) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| invalid(HOST_ENV, &v, "an IP address"))?,
            None => defaults.host,
        };
        let port = match get(PORT_ENV) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| invalid(PORT_ENV, &v, "a port number"))?,
            None => defaults.port,
        };
        let session_ttl = match get(SESSION_TTL_ENV) {
            Some(v) => positive_secs(SESSION_TTL_ENV, &v)?,
            None => defaults.session_ttl,
        };
        let sweep_interval = match get(SWEEP_INTERVAL_ENV) {
            Some(v) => positive_secs(SWEEP_INTERVAL_ENV, &v)?,
            None => defaults.sweep_interval,
        };
        let key_size = match get(CIPHER_KEY_BITS_ENV) {
            Some(v) => v
                .trim()
                .parse()
                .ok()
                .and_then(KeySize::from_bits)
                .ok_or_else(|| invalid(CIPHER_KEY_BITS_ENV, &v, "128, 192 or 256"))?,
            None => defaults.key_size,
        };
        let padding = match get(PAYLOAD_PADDING_ENV) {
            Some(v) => Padding::from_name(v.trim())
                .ok_or_else(|| invalid(PAYLOAD_PADDING_ENV, &v, "none or pkcs7"))?,
            None => defaults.padding,
        };
        let log_format = match get(LOG_FORMAT_ENV) {
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err(invalid(LOG_FORMAT_ENV, &v, "json or pretty")),
            },
            None => defaults.log_format,
        };

        Ok(Self {
            host,
            port,
            data_dir: get(DATA_DIR_ENV).map(PathBuf::from).unwrap_or(defaults.data_dir),
            session_ttl,
            sweep_interval,
            key_size,
            padding,
            principals_file: get(PRINCIPALS_FILE_ENV).map(PathBuf::from),
            log_format,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn invalid(var: &'static str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError {
        var,
        value: value.to_owned(),
        expected,
    }
}

fn positive_secs(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(invalid(var, value, "a positive number of seconds")),
    }
}
