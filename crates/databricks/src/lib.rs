// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Minimal async client for a Databricks workspace.
//!
//! Covers the calls the volume upload workflow needs:
//!
//! - Unity Catalog volume lookup and effective permissions
//! - SCIM `Me` for the calling principal
//! - Files API upload into `/Volumes/...`
//! - SQL Statement Execution against a warehouse, with a cached connection
//!
//! Authentication is a personal access token or service principal
//! credentials exchanged through the workspace OIDC endpoint.

pub mod auth;
pub mod client;
pub mod config;
mod error;
pub mod models;
pub mod sql;

pub use client::WorkspaceClient;
pub use config::{Credentials, WorkspaceConfig, load_config, validate_config};
pub use error::PlatformError;
pub use models::{
    CurrentUser, EffectivePermissionsList, SecurableType, StatementResult, VolumeInfo,
    WRITE_PRIVILEGES,
};
pub use sql::{ConnectionCache, SqlConnection};

/// Result type for workspace calls
pub type Result<T> = std::result::Result<T, PlatformError>;
