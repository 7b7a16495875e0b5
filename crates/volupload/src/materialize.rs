// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Turning an uploaded CSV file into a managed Delta table.
//!
//! Two statements run on the cached warehouse connection: a
//! `CREATE TABLE IF NOT EXISTS` and a `COPY INTO` from the file. They are
//! not wrapped in a transaction; when the load fails the (empty) table
//! stays behind and the error says so.

use crate::error::WorkflowError;
use crate::identifier::{TableName, quote_literal};
use crate::remote::SqlWarehouse;
use crate::session::{CreatedTable, UploadedFile};
use diagnostics::*;
use std::sync::Arc;

const INSERTED_ROWS_COLUMN: &str = "num_inserted_rows";

pub fn create_table_statement(table: &TableName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {}\nUSING DELTA",
        table.quoted()
    )
}

pub fn copy_into_statement(table: &TableName, remote_path: &str) -> String {
    format!(
        "COPY INTO {}\n\
         FROM {}\n\
         FILEFORMAT = CSV\n\
         FORMAT_OPTIONS ('header' = 'true', 'inferSchema' = 'true')\n\
         COPY_OPTIONS ('mergeSchema' = 'true')",
        table.quoted(),
        quote_literal(remote_path)
    )
}

pub struct TableMaterializer {
    warehouse: Arc<dyn SqlWarehouse>,
}

impl TableMaterializer {
    pub fn new(warehouse: Arc<dyn SqlWarehouse>) -> Self {
        Self { warehouse }
    }

    pub async fn create_table(
        &self,
        file: &UploadedFile,
        table: TableName,
    ) -> Result<CreatedTable, WorkflowError> {
        let connection = self
            .warehouse
            .connection()
            .await
            .map_err(WorkflowError::Connection)?;

        connection
            .execute(&create_table_statement(&table))
            .await
            .map_err(|source| WorkflowError::CreateTable {
                table: table.to_string(),
                source,
            })?;
        debug!("Ensured table {table}", table: table.to_string());

        let loaded = connection
            .execute(&copy_into_statement(&table, &file.remote_path))
            .await
            .map_err(|source| WorkflowError::LoadTable {
                table: table.to_string(),
                source,
            })?;

        let rows_inserted = loaded.first_row_count(INSERTED_ROWS_COLUMN);
        info!(
            "Loaded {path} into {table}",
            path: file.remote_path.as_str(),
            table: table.to_string()
        );
        Ok(CreatedTable {
            table,
            rows_inserted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::VolumeIdentifier;

    #[test]
    fn test_statements_target_volume_catalog_and_schema() {
        let volume = VolumeIdentifier::parse("main.marketing.raw_files").unwrap();
        let table = TableName::new(&volume, "sales").unwrap();

        assert_eq!(
            create_table_statement(&table),
            "CREATE TABLE IF NOT EXISTS `main`.`marketing`.`sales`\nUSING DELTA"
        );

        let copy = copy_into_statement(&table, &volume.file_path("data.csv"));
        assert_eq!(
            copy,
            "COPY INTO `main`.`marketing`.`sales`\n\
             FROM '/Volumes/main/marketing/raw_files/data.csv'\n\
             FILEFORMAT = CSV\n\
             FORMAT_OPTIONS ('header' = 'true', 'inferSchema' = 'true')\n\
             COPY_OPTIONS ('mergeSchema' = 'true')"
        );
    }
}
