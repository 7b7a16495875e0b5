// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::WorkflowError;
use crate::identifier::{VolumeIdentifier, validate_file_name};
use crate::remote::FileStore;
use crate::session::UploadedFile;
use bytes::Bytes;
use chrono::Utc;
use diagnostics::*;
use std::sync::Arc;

/// Writes in-memory files into a volume, replacing existing objects
pub struct FileUploader {
    store: Arc<dyn FileStore>,
}

impl FileUploader {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }

    pub async fn upload(
        &self,
        volume: &VolumeIdentifier,
        file_name: &str,
        contents: Bytes,
    ) -> Result<UploadedFile, WorkflowError> {
        let file_name = validate_file_name(file_name)?;
        let remote_path = volume.file_path(file_name);
        let size = contents.len();

        self.store
            .put(&remote_path, contents, true)
            .await
            .map_err(WorkflowError::Transfer)?;

        info!("Uploaded {size} bytes to {remote_path}", size: size, remote_path: remote_path.as_str());
        Ok(UploadedFile {
            volume: volume.clone(),
            file_name: file_name.to_string(),
            remote_path,
            size,
            uploaded_at: Utc::now(),
        })
    }
}
