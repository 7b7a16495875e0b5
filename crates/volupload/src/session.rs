// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Per-session workflow state.
//!
//! ```text
//! Idle ─check─▶ Checking ─▶ Denied | Validated
//! Validated ─upload─▶ Uploading ─▶ UploadFailed | Uploaded
//! Uploaded ─create─▶ Creating ─▶ CreateFailed | Created
//! ```
//!
//! A check may start from any settled phase and discards everything the
//! session held. Uploads need a validated volume; table creation needs a
//! recorded upload. `Checking`, `Uploading` and `Creating` only exist while
//! the remote call is in flight. Whoever holds the session exclusively knows
//! no call is running, so `settle` rolls a phase left by a dropped request
//! back to where it started.

use crate::error::{ErrorKind, WorkflowError};
use crate::identifier::{TableName, VolumeIdentifier};
use chrono::{DateTime, Utc};
use diagnostics::*;

/// A file written to a volume during this session
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub volume: VolumeIdentifier,
    pub file_name: String,
    pub remote_path: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedTable {
    pub table: TableName,
    /// Rows reported by the bulk load, when the warehouse returns a count
    pub rows_inserted: Option<u64>,
}

/// User-facing record of a failed step
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub partial: bool,
}

impl From<&WorkflowError> for Failure {
    fn from(err: &WorkflowError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            partial: err.is_partial(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Checking,
    Denied(Failure),
    Validated(VolumeIdentifier),
    Uploading(VolumeIdentifier),
    UploadFailed(VolumeIdentifier, Failure),
    Uploaded(UploadedFile),
    Creating(UploadedFile),
    CreateFailed(UploadedFile, Failure),
    Created(UploadedFile, CreatedTable),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Checking => "checking permissions",
            Phase::Denied(_) => "denied",
            Phase::Validated(_) => "validated",
            Phase::Uploading(_) => "uploading",
            Phase::UploadFailed(..) => "upload failed",
            Phase::Uploaded(_) => "uploaded",
            Phase::Creating(_) => "creating table",
            Phase::CreateFailed(..) => "table creation failed",
            Phase::Created(..) => "table created",
        }
    }

    fn is_in_flight(&self) -> bool {
        matches!(self, Phase::Checking | Phase::Uploading(_) | Phase::Creating(_))
    }
}

/// Workflow state for one browser session
#[derive(Debug, Clone, Default)]
pub struct UploadSession {
    phase: Phase,
    /// Raw text of the last volume check, echoed back into the form
    volume_input: String,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn volume_input(&self) -> &str {
        &self.volume_input
    }

    /// Validated volume, if the current phase holds one
    pub fn volume(&self) -> Option<&VolumeIdentifier> {
        match &self.phase {
            Phase::Validated(v) | Phase::Uploading(v) | Phase::UploadFailed(v, _) => Some(v),
            Phase::Uploaded(f) | Phase::Creating(f) | Phase::CreateFailed(f, _) | Phase::Created(f, _) => {
                Some(&f.volume)
            }
            Phase::Idle | Phase::Checking | Phase::Denied(_) => None,
        }
    }

    /// Upload record, if the current phase holds one
    pub fn uploaded(&self) -> Option<&UploadedFile> {
        match &self.phase {
            Phase::Uploaded(f) | Phase::Creating(f) | Phase::CreateFailed(f, _) | Phase::Created(f, _) => Some(f),
            _ => None,
        }
    }

    pub fn can_upload(&self) -> bool {
        !self.phase.is_in_flight() && self.volume().is_some()
    }

    pub fn can_create_table(&self) -> bool {
        !self.phase.is_in_flight() && self.uploaded().is_some()
    }

    /// Start a permission check, discarding all earlier state
    pub fn begin_check(&mut self, input: &str) {
        self.settle();
        self.volume_input = input.trim().to_string();
        self.phase = Phase::Checking;
    }

    pub fn finish_check(
        &mut self,
        outcome: Result<VolumeIdentifier, &WorkflowError>,
    ) -> Result<(), WorkflowError> {
        if self.phase != Phase::Checking {
            return Err(self.out_of_order("finish a permission check"));
        }
        self.phase = match outcome {
            Ok(volume) => Phase::Validated(volume),
            Err(err) => Phase::Denied(err.into()),
        };
        Ok(())
    }

    /// Volume the next upload would go to, without changing phase
    pub fn require_volume(&self) -> Result<&VolumeIdentifier, WorkflowError> {
        match self.volume() {
            Some(volume) if !self.phase.is_in_flight() => Ok(volume),
            _ => Err(self.out_of_order("upload a file")),
        }
    }

    pub fn begin_upload(&mut self) -> Result<VolumeIdentifier, WorkflowError> {
        self.settle();
        let volume = self.require_volume()?.clone();
        self.phase = Phase::Uploading(volume.clone());
        Ok(volume)
    }

    pub fn finish_upload(
        &mut self,
        outcome: Result<UploadedFile, &WorkflowError>,
    ) -> Result<(), WorkflowError> {
        let Phase::Uploading(volume) = &self.phase else {
            return Err(self.out_of_order("finish an upload"));
        };
        let volume = volume.clone();
        self.phase = match outcome {
            Ok(file) => Phase::Uploaded(file),
            Err(err) => Phase::UploadFailed(volume, err.into()),
        };
        Ok(())
    }

    /// Upload record the next table creation would use, without changing phase
    pub fn require_upload(&self) -> Result<&UploadedFile, WorkflowError> {
        match self.uploaded() {
            Some(file) if !self.phase.is_in_flight() => Ok(file),
            _ => Err(self.out_of_order("create a table")),
        }
    }

    pub fn begin_create(&mut self) -> Result<UploadedFile, WorkflowError> {
        self.settle();
        let file = self.require_upload()?.clone();
        self.phase = Phase::Creating(file.clone());
        Ok(file)
    }

    pub fn finish_create(
        &mut self,
        outcome: Result<CreatedTable, &WorkflowError>,
    ) -> Result<(), WorkflowError> {
        let Phase::Creating(file) = &self.phase else {
            return Err(self.out_of_order("finish table creation"));
        };
        let file = file.clone();
        self.phase = match outcome {
            Ok(table) => Phase::Created(file, table),
            Err(err) => Phase::CreateFailed(file, err.into()),
        };
        Ok(())
    }

    /// Roll back an in-flight phase left behind by a dropped request.
    ///
    /// Only call this while holding the session exclusively, when no remote
    /// call can still be running for it.
    pub fn settle(&mut self) {
        if !self.phase.is_in_flight() {
            return;
        }
        warn!("Recovering session abandoned while {phase}", phase: self.phase.name());
        self.phase = match std::mem::take(&mut self.phase) {
            Phase::Uploading(volume) => Phase::Validated(volume),
            Phase::Creating(file) => Phase::Uploaded(file),
            _ => Phase::Idle,
        };
    }

    fn out_of_order(&self, action: &'static str) -> WorkflowError {
        WorkflowError::OutOfOrder {
            action,
            phase: self.phase.name(),
        }
    }
}
