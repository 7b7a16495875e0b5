// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Upload a file into a Unity Catalog volume and optionally load it into a
//! Delta table.
//!
//! The workflow has three user-driven steps, each recorded in an
//! [`UploadSession`]:
//!
//! 1. check that the caller may write to `catalog.schema.volume`
//! 2. upload a file into that volume, replacing any object with the same name
//! 3. create `catalog.schema.<table>` if needed and `COPY INTO` it from the file
//!
//! Remote services sit behind the traits in [`remote`], implemented for the
//! workspace client in the `databricks` crate.

mod error;
pub mod identifier;
pub mod materialize;
pub mod permission;
pub mod remote;
pub mod session;
pub mod uploader;
pub mod workflow;

pub use error::{ErrorKind, WorkflowError};
pub use identifier::{TableName, VolumeIdentifier, base_name};
pub use permission::{PermissionChecker, VALIDATED_MESSAGE};
pub use remote::{CatalogApi, FileStore, SqlWarehouse, StatementExecutor};
pub use session::{CreatedTable, Failure, Phase, UploadSession, UploadedFile};
pub use uploader::FileUploader;
pub use workflow::UploadWorkflow;

pub type Result<T> = std::result::Result<T, WorkflowError>;
