// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::WorkflowError;
use crate::identifier::{TableName, VolumeIdentifier, validate_file_name};
use crate::materialize::TableMaterializer;
use crate::permission::PermissionChecker;
use crate::remote::{CatalogApi, FileStore, SqlWarehouse};
use crate::session::{CreatedTable, UploadSession, UploadedFile};
use crate::uploader::FileUploader;
use bytes::Bytes;
use diagnostics::*;
use databricks::{ConnectionCache, WorkspaceClient};
use std::sync::Arc;

/// Sequences check → upload → create table against one session.
///
/// Each call records its outcome in the session before returning it, so a
/// failed step leaves the session in the matching failure phase. Input and
/// sequencing errors are returned without touching the session, apart from
/// settling a phase left in flight by an earlier dropped call.
pub struct UploadWorkflow {
    checker: PermissionChecker,
    uploader: FileUploader,
    materializer: TableMaterializer,
}

impl UploadWorkflow {
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        store: Arc<dyn FileStore>,
        warehouse: Arc<dyn SqlWarehouse>,
    ) -> Self {
        Self {
            checker: PermissionChecker::new(catalog),
            uploader: FileUploader::new(store),
            materializer: TableMaterializer::new(warehouse),
        }
    }

    /// Wire every step to one workspace and its cached warehouse connection
    pub fn for_workspace(client: WorkspaceClient, warehouse: ConnectionCache) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client, Arc::new(warehouse))
    }

    pub async fn check(
        &self,
        session: &mut UploadSession,
        input: &str,
    ) -> Result<VolumeIdentifier, WorkflowError> {
        session.begin_check(input);
        let outcome = self.checker.check(input).await;
        session.finish_check(outcome.as_ref().cloned())?;
        log_failure("check", &outcome);
        outcome
    }

    pub async fn upload(
        &self,
        session: &mut UploadSession,
        file_name: &str,
        contents: Bytes,
    ) -> Result<UploadedFile, WorkflowError> {
        session.settle();
        session.require_volume()?;
        validate_file_name(file_name)?;

        let volume = session.begin_upload()?;
        let outcome = self.uploader.upload(&volume, file_name, contents).await;
        session.finish_upload(outcome.as_ref().cloned())?;
        log_failure("upload", &outcome);
        outcome
    }

    pub async fn create_table(
        &self,
        session: &mut UploadSession,
        table_input: &str,
    ) -> Result<CreatedTable, WorkflowError> {
        session.settle();
        let table = TableName::new(&session.require_upload()?.volume, table_input)?;

        let file = session.begin_create()?;
        let outcome = self.materializer.create_table(&file, table).await;
        session.finish_create(outcome.as_ref().cloned())?;
        log_failure("create table", &outcome);
        outcome
    }
}

fn log_failure<T>(step: &str, outcome: &Result<T, WorkflowError>) {
    match outcome {
        Err(err) if err.is_partial() => {
            error!("Step {step} partially failed: {reason}", step: step, reason: err.to_string());
        }
        Err(err) => {
            warn!("Step {step} failed: {reason}", step: step, reason: err.to_string());
        }
        Ok(_) => {}
    }
}
