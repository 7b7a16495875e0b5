// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! SQL warehouse access through the Statement Execution API.
//!
//! `SqlConnection` binds a client to one warehouse. Statements are submitted
//! with a server-side wait; if they are still running afterwards the
//! connection polls their status at a fixed interval until they finish.
//! `ConnectionCache` opens the connection once and hands out shared handles.

use crate::Result;
use crate::client::WorkspaceClient;
use crate::config::WorkspaceConfig;
use crate::error::PlatformError;
use crate::models::{StatementRequest, StatementResponse, StatementResult, StatementState};
use backon::{ConstantBuilder, Retryable};
use diagnostics::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Server-side wait before the API returns a still-running statement
const WAIT_TIMEOUT: &str = "30s";

pub struct SqlConnection {
    client: WorkspaceClient,
    warehouse_id: String,
    poll_interval: Duration,
    max_polls: usize,
}

impl SqlConnection {
    /// Verify the warehouse exists and bind to it
    pub async fn open(client: WorkspaceClient, config: &WorkspaceConfig) -> Result<Self> {
        let warehouse_id = config.resolve_warehouse_id()?;
        let warehouse = client.get_warehouse(&warehouse_id).await?;

        info!(
            "Opened SQL connection to warehouse {warehouse_id} ({name}, {state})",
            warehouse_id: warehouse.id.as_str(),
            name: warehouse.name.as_deref().unwrap_or("unnamed"),
            state: warehouse.state.as_deref().unwrap_or("UNKNOWN")
        );

        Ok(Self {
            client,
            warehouse_id,
            poll_interval: config.poll_interval(),
            max_polls: config.statement_max_polls,
        })
    }

    pub fn warehouse_id(&self) -> &str {
        &self.warehouse_id
    }

    /// Run one statement to completion
    pub async fn execute(&self, statement: &str) -> Result<StatementResult> {
        debug!("SQL: {statement}", statement: statement);

        let request = StatementRequest {
            statement,
            warehouse_id: &self.warehouse_id,
            wait_timeout: WAIT_TIMEOUT,
            on_wait_timeout: "CONTINUE",
            disposition: "INLINE",
            format: "JSON_ARRAY",
        };

        let response = self.client.submit_statement(&request).await?;
        let response = if response.status.state.is_terminal() {
            response
        } else {
            self.wait_for(&response.statement_id).await?
        };

        finish(response)
    }

    async fn wait_for(&self, statement_id: &str) -> Result<StatementResponse> {
        let poll = || async move { self.poll_once(statement_id).await };

        let outcome = poll
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.poll_interval)
                    // The first poll is not a retry
                    .with_max_times(self.max_polls.saturating_sub(1)),
            )
            .when(PlatformError::is_pending)
            .await;

        if let Err(PlatformError::StatementPending { .. }) = &outcome {
            warn!("Statement {statement_id} did not finish, canceling", statement_id: statement_id);
            if let Err(e) = self.client.cancel_statement(statement_id).await {
                warn!("Cancel of {statement_id} failed: {reason}", statement_id: statement_id, reason: e.to_string());
            }
        }
        outcome
    }

    async fn poll_once(&self, statement_id: &str) -> Result<StatementResponse> {
        let response = self.client.get_statement(statement_id).await?;
        if response.status.state.is_terminal() {
            Ok(response)
        } else {
            Err(PlatformError::StatementPending {
                statement_id: statement_id.to_string(),
                state: response.status.state.as_str().to_string(),
                polls: self.max_polls,
            })
        }
    }
}

fn finish(response: StatementResponse) -> Result<StatementResult> {
    match response.status.state {
        StatementState::Succeeded => Ok(StatementResult::from_response(response)),
        state => {
            let message = response
                .status
                .error
                .and_then(|e| match (e.error_code, e.message) {
                    (Some(code), Some(message)) => Some(format!("[{code}] {message}")),
                    (None, Some(message)) => Some(message),
                    (Some(code), None) => Some(code),
                    (None, None) => None,
                })
                .unwrap_or_else(|| "no error detail returned".to_string());
            Err(PlatformError::StatementFailed {
                statement_id: response.statement_id,
                state: state.as_str().to_string(),
                message,
            })
        }
    }
}

/// Lazily opened, shared warehouse connection
pub struct ConnectionCache {
    client: WorkspaceClient,
    config: WorkspaceConfig,
    connection: OnceCell<Arc<SqlConnection>>,
}

impl ConnectionCache {
    pub fn new(client: WorkspaceClient, config: WorkspaceConfig) -> Self {
        Self {
            client,
            config,
            connection: OnceCell::new(),
        }
    }

    /// The cached connection, opening it on first use.
    ///
    /// A failed open is not cached; the next call tries again.
    pub async fn get(&self) -> Result<Arc<SqlConnection>> {
        self.connection
            .get_or_try_init(|| async {
                SqlConnection::open(self.client.clone(), &self.config)
                    .await
                    .map(Arc::new)
            })
            .await
            .map(Arc::clone)
    }

    pub fn is_open(&self) -> bool {
        self.connection.initialized()
    }
}
