// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP front end: one form page driving the upload workflow.

mod pages;
mod routes;
mod sessions;

pub use pages::{TABLE_PLACEHOLDER, VOLUME_PLACEHOLDER};
pub use routes::{AppState, routes};
pub use sessions::{SESSION_COOKIE, SessionStore};

use crate::config::AppConfig;
use anyhow::{Context, Result};
use databricks::{ConnectionCache, WorkspaceClient};
use diagnostics::*;
use std::sync::Arc;
use volupload::UploadWorkflow;

/// Wire the workflow to the configured workspace
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let client = WorkspaceClient::new(&config.workspace)
        .context("Failed to create workspace client")?;
    let warehouse = ConnectionCache::new(client.clone(), config.workspace.clone());

    Ok(AppState::new(
        UploadWorkflow::for_workspace(client, warehouse),
        SessionStore::new(config.session_ttl()),
        config.workspace.hostname(),
        config.max_upload_bytes,
    ))
}

/// Serve the form until Ctrl-C
pub async fn serve(config: AppConfig) -> Result<()> {
    let state = Arc::new(build_state(&config)?);

    let (addr, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(config.listen, async {
            _ = tokio::signal::ctrl_c().await;
        })
        .with_context(|| format!("Failed to listen on {}", config.listen))?;

    info!(
        "Serving uploads to {host} on {addr}",
        host: config.workspace.hostname(),
        addr: addr.to_string()
    );
    server.await;
    info!("Server stopped");
    Ok(())
}
