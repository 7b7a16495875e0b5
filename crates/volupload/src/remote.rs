// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Remote collaborators of the workflow, and their workspace implementations.

use async_trait::async_trait;
use bytes::Bytes;
use databricks::{
    ConnectionCache, EffectivePermissionsList, SecurableType, SqlConnection, StatementResult,
    WorkspaceClient,
};
use std::sync::Arc;

/// Identity and grants lookups
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Canonical full name of the named volume
    async fn volume_full_name(&self, name: &str) -> databricks::Result<String>;

    /// Name grants are evaluated against for the calling identity
    async fn current_principal(&self) -> databricks::Result<String>;

    async fn volume_permissions(
        &self,
        full_name: &str,
        principal: &str,
    ) -> databricks::Result<EffectivePermissionsList>;
}

/// Object upload into volume paths
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, path: &str, contents: Bytes, overwrite: bool) -> databricks::Result<()>;
}

#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, statement: &str) -> databricks::Result<StatementResult>;
}

/// Source of a (possibly cached) warehouse connection
#[async_trait]
pub trait SqlWarehouse: Send + Sync {
    async fn connection(&self) -> databricks::Result<Arc<dyn StatementExecutor>>;
}

#[async_trait]
impl CatalogApi for WorkspaceClient {
    async fn volume_full_name(&self, name: &str) -> databricks::Result<String> {
        Ok(self.read_volume(name).await?.full_name)
    }

    async fn current_principal(&self) -> databricks::Result<String> {
        Ok(self.current_user().await?.user_name)
    }

    async fn volume_permissions(
        &self,
        full_name: &str,
        principal: &str,
    ) -> databricks::Result<EffectivePermissionsList> {
        self.effective_permissions(SecurableType::Volume, full_name, principal)
            .await
    }
}

#[async_trait]
impl FileStore for WorkspaceClient {
    async fn put(&self, path: &str, contents: Bytes, overwrite: bool) -> databricks::Result<()> {
        self.upload_file(path, contents, overwrite).await
    }
}

#[async_trait]
impl StatementExecutor for SqlConnection {
    async fn execute(&self, statement: &str) -> databricks::Result<StatementResult> {
        SqlConnection::execute(self, statement).await
    }
}

#[async_trait]
impl SqlWarehouse for ConnectionCache {
    async fn connection(&self) -> databricks::Result<Arc<dyn StatementExecutor>> {
        let connection = self.get().await?;
        Ok(connection as Arc<dyn StatementExecutor>)
    }
}
