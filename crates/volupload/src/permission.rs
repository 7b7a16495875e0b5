// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::WorkflowError;
use crate::identifier::VolumeIdentifier;
use crate::remote::CatalogApi;
use diagnostics::*;
use std::sync::Arc;

/// Message shown when a volume passes the check
pub const VALIDATED_MESSAGE: &str = "Volume and permissions validated";

/// Decides whether the calling principal may write into a volume
pub struct PermissionChecker {
    catalog: Arc<dyn CatalogApi>,
}

impl PermissionChecker {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }

    /// Resolve the volume and require `ALL_PRIVILEGES` or `WRITE_VOLUME`
    /// for the current principal. Malformed input fails before any
    /// remote call.
    pub async fn check(&self, input: &str) -> Result<VolumeIdentifier, WorkflowError> {
        let requested = VolumeIdentifier::parse(input)?;
        let full_name = requested.full_name();

        debug!("Reading volume {full_name}", full_name: full_name.as_str());
        let canonical = self
            .catalog
            .volume_full_name(&full_name)
            .await
            .map_err(WorkflowError::PermissionLookup)?;

        let principal = self
            .catalog
            .current_principal()
            .await
            .map_err(WorkflowError::PermissionLookup)?;

        let grants = self
            .catalog
            .volume_permissions(&canonical, &principal)
            .await
            .map_err(WorkflowError::PermissionLookup)?;

        if grants.privilege_assignments.is_empty() {
            warn!("No grants for {principal} on {canonical}", principal: principal.as_str(), canonical: canonical.as_str());
            return Err(WorkflowError::NoGrants { principal });
        }
        if !grants.allows_write() {
            warn!("{principal} lacks write privileges on {canonical}", principal: principal.as_str(), canonical: canonical.as_str());
            return Err(WorkflowError::MissingPrivilege { principal });
        }

        info!("Validated volume {canonical} for {principal}", canonical: canonical.as_str(), principal: principal.as_str());

        // Prefer the catalog's spelling of the name when it is well formed
        Ok(VolumeIdentifier::parse(&canonical).unwrap_or(requested))
    }
}
