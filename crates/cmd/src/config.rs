// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result, anyhow};
use databricks::{WorkspaceConfig, validate_config};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Port assigned by the app platform
pub const PORT_ENV: &str = "DATABRICKS_APP_PORT";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Server settings plus the workspace it talks to
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Idle time after which a browser session is forgotten
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    pub workspace: WorkspaceConfig,
}

fn default_listen() -> SocketAddr {
    listen_on(DEFAULT_PORT)
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn listen_on(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

impl AppConfig {
    pub fn new(workspace: WorkspaceConfig) -> Self {
        Self {
            listen: default_listen(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            workspace,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Workspace settings and listen port read through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(PORT_ENV).filter(|v| !v.trim().is_empty()) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{PORT_ENV} '{value}' is not a port number"))?,
            None => DEFAULT_PORT,
        };

        let workspace = WorkspaceConfig::from_lookup(&lookup)
            .context("Invalid workspace settings in environment")?;

        let mut config = Self::new(workspace);
        config.listen = listen_on(port);
        Ok(config)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Load configuration from YAML file
pub fn load_app_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: AppConfig = serde_yaml_ng::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    validate_app_config(&config)?;
    Ok(config)
}

pub fn validate_app_config(config: &AppConfig) -> Result<()> {
    validate_config(&config.workspace)?;
    if config.max_upload_bytes == 0 {
        return Err(anyhow!("max_upload_bytes must be greater than 0"));
    }
    if config.session_ttl_secs == 0 {
        return Err(anyhow!("session_ttl_secs must be greater than 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_uses_app_port() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABRICKS_HOST", "example.cloud.databricks.com"),
            ("HTTP_PATH", "/sql/1.0/warehouses/abc123"),
            ("DATABRICKS_TOKEN", "dapi-test"),
            (PORT_ENV, "8123"),
        ]))
        .unwrap();

        assert_eq!(config.listen.port(), 8123);
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(config.workspace.resolve_warehouse_id().unwrap(), "abc123");
    }

    #[test]
    fn test_from_lookup_rejects_bad_port() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABRICKS_HOST", "example.cloud.databricks.com"),
            ("HTTP_PATH", "/sql/1.0/warehouses/abc123"),
            ("DATABRICKS_TOKEN", "dapi-test"),
            (PORT_ENV, "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(PORT_ENV));
    }

    #[test]
    fn test_load_yaml_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
listen: "127.0.0.1:9000"
session_ttl_secs: 120
workspace:
  host: https://example.cloud.databricks.com
  warehouse_id: wh-1
  client_id: app-id
  client_secret: app-secret
"#
        )
        .unwrap();

        let config = load_app_config(file.path()).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.session_ttl(), Duration::from_secs(120));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.workspace.hostname(), "example.cloud.databricks.com");
    }

    #[test]
    fn test_load_yaml_rejects_zero_upload_limit() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
max_upload_bytes: 0
workspace:
  host: example.cloud.databricks.com
  warehouse_id: wh-1
  token: dapi-test
"#
        )
        .unwrap();

        let err = load_app_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_upload_bytes"));
    }
}
