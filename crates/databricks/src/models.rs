// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Privilege names that allow writing into a volume
pub const WRITE_PRIVILEGES: [&str; 2] = ["ALL_PRIVILEGES", "WRITE_VOLUME"];

/// Securable kinds accepted by the effective-permissions endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurableType {
    Catalog,
    Schema,
    Table,
    Volume,
}

impl SecurableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurableType::Catalog => "catalog",
            SecurableType::Schema => "schema",
            SecurableType::Table => "table",
            SecurableType::Volume => "volume",
        }
    }
}

/// Unity Catalog volume as returned by `volumes/{full_name}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VolumeInfo {
    pub catalog_name: String,
    pub schema_name: String,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub storage_location: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

/// SCIM `Me` response, only the fields used here
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<String>,
    pub user_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EffectivePermissionsList {
    #[serde(default)]
    pub privilege_assignments: Vec<EffectivePrivilegeAssignment>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EffectivePrivilegeAssignment {
    pub principal: String,
    #[serde(default)]
    pub privileges: Vec<EffectivePrivilege>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EffectivePrivilege {
    pub privilege: String,
    #[serde(default)]
    pub inherited_from_type: Option<String>,
    #[serde(default)]
    pub inherited_from_name: Option<String>,
}

impl EffectivePermissionsList {
    /// True when any assignment carries a privilege allowing volume writes
    pub fn allows_write(&self) -> bool {
        self.privilege_assignments
            .iter()
            .flat_map(|a| a.privileges.iter())
            .any(|p| WRITE_PRIVILEGES.contains(&p.privilege.as_str()))
    }
}

/// Error payload returned by workspace APIs
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// SQL warehouse summary from `sql/warehouses/{id}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WarehouseInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct StatementRequest<'a> {
    pub statement: &'a str,
    pub warehouse_id: &'a str,
    pub wait_timeout: &'a str,
    pub on_wait_timeout: &'a str,
    pub disposition: &'a str,
    pub format: &'a str,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StatementResponse {
    pub statement_id: String,
    pub status: StatementStatus,
    #[serde(default)]
    pub manifest: Option<ResultManifest>,
    #[serde(default)]
    pub result: Option<ResultData>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StatementStatus {
    pub state: StatementState,
    #[serde(default)]
    pub error: Option<ServiceError>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
}

impl StatementState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatementState::Pending | StatementState::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementState::Pending => "PENDING",
            StatementState::Running => "RUNNING",
            StatementState::Succeeded => "SUCCEEDED",
            StatementState::Failed => "FAILED",
            StatementState::Canceled => "CANCELED",
            StatementState::Closed => "CLOSED",
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServiceError {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResultManifest {
    #[serde(default)]
    pub schema: Option<ResultSchema>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResultSchema {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResultData {
    #[serde(default)]
    pub data_array: Vec<Vec<Option<String>>>,
}

/// Outcome of a finished statement, inline JSON rows only
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    pub statement_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl StatementResult {
    pub fn from_response(response: StatementResponse) -> Self {
        let columns = response
            .manifest
            .and_then(|m| m.schema)
            .map(|s| s.columns.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();
        let rows = response.result.map(|r| r.data_array).unwrap_or_default();
        Self {
            statement_id: response.statement_id,
            columns,
            rows,
        }
    }

    /// First-row value of the named column, parsed as a count
    pub fn first_row_count(&self, column: &str) -> Option<u64> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.first()?.get(index)?.as_deref()?.parse().ok()
    }
}
