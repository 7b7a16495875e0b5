// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the upload workflow

use databricks::PlatformError;
use thiserror::Error;

/// Broad class of a workflow failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input, rejected before any remote call
    Input,
    Permission,
    Transfer,
    Sql,
    /// Action requested in a phase that does not allow it
    Sequence,
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid volume name '{input}': expected catalog.schema.volume")]
    InvalidIdentifier { input: String },

    #[error("Invalid file name '{name}'")]
    InvalidFileName { name: String },

    #[error("Invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    #[error("Insufficient permissions: No grants found for {principal}.")]
    NoGrants { principal: String },

    #[error("Insufficient permissions: Required privileges not found.")]
    MissingPrivilege { principal: String },

    #[error("Error: {0}")]
    PermissionLookup(#[source] PlatformError),

    #[error("Error uploading file: {0}")]
    Transfer(#[source] PlatformError),

    #[error("Error opening SQL connection: {0}")]
    Connection(#[source] PlatformError),

    #[error("Error creating table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: PlatformError,
    },

    /// The table exists (possibly empty) but the bulk load failed
    #[error("Table {table} was created but loading the file failed: {source}")]
    LoadTable {
        table: String,
        #[source]
        source: PlatformError,
    },

    #[error("Cannot {action} while {phase}")]
    OutOfOrder {
        action: &'static str,
        phase: &'static str,
    },
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::InvalidIdentifier { .. }
            | WorkflowError::InvalidFileName { .. }
            | WorkflowError::InvalidTableName { .. } => ErrorKind::Input,
            WorkflowError::NoGrants { .. }
            | WorkflowError::MissingPrivilege { .. }
            | WorkflowError::PermissionLookup(_) => ErrorKind::Permission,
            WorkflowError::Transfer(_) => ErrorKind::Transfer,
            WorkflowError::Connection(_)
            | WorkflowError::CreateTable { .. }
            | WorkflowError::LoadTable { .. } => ErrorKind::Sql,
            WorkflowError::OutOfOrder { .. } => ErrorKind::Sequence,
        }
    }

    /// True when an earlier step had already changed remote state
    pub fn is_partial(&self) -> bool {
        matches!(self, WorkflowError::LoadTable { .. })
    }
}
