// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Workspace connection settings, from YAML or the environment.

use crate::Result;
use crate::error::PlatformError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const HOST_ENV: &str = "DATABRICKS_HOST";
pub const HTTP_PATH_ENV: &str = "HTTP_PATH";
pub const WAREHOUSE_ID_ENV: &str = "DATABRICKS_WAREHOUSE_ID";
pub const TOKEN_ENV: &str = "DATABRICKS_TOKEN";
pub const CLIENT_ID_ENV: &str = "DATABRICKS_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "DATABRICKS_CLIENT_SECRET";

const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_MAX_POLLS: usize = 600;

/// Connection settings for one workspace
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkspaceConfig {
    /// Hostname, with or without scheme (`adb-123.azuredatabricks.net`)
    pub host: String,
    /// Warehouse connection path, `/sql/1.0/warehouses/{id}`
    #[serde(default)]
    pub http_path: Option<String>,
    /// Takes precedence over `http_path`
    #[serde(default)]
    pub warehouse_id: Option<String>,
    /// Personal access token
    #[serde(default)]
    pub token: Option<String>,
    /// Service principal credentials (OAuth client-credentials grant)
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub statement_poll_interval_ms: u64,
    #[serde(default = "default_max_polls")]
    pub statement_max_polls: usize,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_polls() -> usize {
    DEFAULT_MAX_POLLS
}

/// How requests are authorized
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    Token(String),
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

impl WorkspaceConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            http_path: None,
            warehouse_id: None,
            token: None,
            client_id: None,
            client_secret: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            statement_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            statement_max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV)
            .ok_or_else(|| PlatformError::Configuration(format!("{HOST_ENV} is not set")))?;

        let mut config = Self::new(host);
        config.http_path = get(HTTP_PATH_ENV);
        config.warehouse_id = get(WAREHOUSE_ID_ENV);
        config.token = get(TOKEN_ENV);
        config.client_id = get(CLIENT_ID_ENV);
        config.client_secret = get(CLIENT_SECRET_ENV);

        validate_config(&config)?;
        Ok(config)
    }

    /// Base URL for REST calls, `https://` assumed when no scheme is given
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    /// Hostname without scheme, for user-facing links
    pub fn hostname(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        host.strip_prefix("https://")
            .or_else(|| host.strip_prefix("http://"))
            .unwrap_or(host)
            .to_string()
    }

    /// Warehouse id from `warehouse_id`, or the last segment of `http_path`
    pub fn resolve_warehouse_id(&self) -> Result<String> {
        // Blank ids count as unset, as they do in the environment
        if let Some(id) = self.warehouse_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }

        let path = self.http_path.as_deref().ok_or_else(|| {
            PlatformError::Configuration(format!(
                "neither {WAREHOUSE_ID_ENV} nor {HTTP_PATH_ENV} is set"
            ))
        })?;

        let segments: Vec<&str> = path.trim().trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [.., "warehouses", id] if !id.is_empty() => Ok((*id).to_string()),
            _ => Err(PlatformError::Configuration(format!(
                "{HTTP_PATH_ENV} '{path}' is not a SQL warehouse path (expected /sql/1.0/warehouses/<id>)"
            ))),
        }
    }

    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = &self.token {
            return Ok(Credentials::Token(token.clone()));
        }
        match (&self.client_id, &self.client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Credentials::ClientCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            (Some(_), None) => Err(PlatformError::Configuration(format!(
                "{CLIENT_SECRET_ENV} is required with {CLIENT_ID_ENV}"
            ))),
            _ => Err(PlatformError::Configuration(format!(
                "no credentials: set {TOKEN_ENV} or {CLIENT_ID_ENV}/{CLIENT_SECRET_ENV}"
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.statement_poll_interval_ms)
    }
}

/// Load configuration from YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<WorkspaceConfig> {
    let content = std::fs::read_to_string(&path).map_err(|e| {
        PlatformError::Configuration(format!(
            "Failed to read config file {}: {e}",
            path.as_ref().display()
        ))
    })?;

    let config: WorkspaceConfig = serde_yaml_ng::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &WorkspaceConfig) -> Result<()> {
    if config.host.trim().is_empty() {
        return Err(PlatformError::Configuration("host cannot be empty".into()));
    }
    _ = config.resolve_warehouse_id()?;
    _ = config.credentials()?;

    if config.request_timeout_secs == 0 {
        return Err(PlatformError::Configuration(
            "request_timeout_secs must be greater than 0".into(),
        ));
    }
    if config.statement_max_polls == 0 {
        return Err(PlatformError::Configuration(
            "statement_max_polls must be greater than 0".into(),
        ));
    }
    Ok(())
}
