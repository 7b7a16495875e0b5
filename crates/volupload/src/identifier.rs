// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Names used by the workflow: volumes, uploaded files, and tables.

use crate::error::WorkflowError;
use std::fmt;

/// Three-part volume name, `catalog.schema.volume`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeIdentifier {
    catalog: String,
    schema: String,
    volume: String,
}

impl VolumeIdentifier {
    /// Parse user input. Surrounding whitespace is ignored; anything but
    /// exactly three non-empty dot-separated segments is rejected.
    pub fn parse(input: &str) -> Result<Self, WorkflowError> {
        let trimmed = input.trim();
        let invalid = || WorkflowError::InvalidIdentifier {
            input: trimmed.to_string(),
        };

        let parts: Vec<&str> = trimmed.split('.').collect();
        match parts.as_slice() {
            [catalog, schema, volume]
                if [catalog, schema, volume]
                    .iter()
                    .all(|p| !p.is_empty() && !p.contains(['/', '\\'])) =>
            {
                Ok(Self {
                    catalog: (*catalog).to_string(),
                    schema: (*schema).to_string(),
                    volume: (*volume).to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn volume(&self) -> &str {
        &self.volume
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.volume)
    }

    /// Volume directory in the Files API namespace
    pub fn volume_path(&self) -> String {
        format!("/Volumes/{}/{}/{}", self.catalog, self.schema, self.volume)
    }

    /// `/Volumes/{catalog}/{schema}/{volume}/{file_name}`
    pub fn file_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.volume_path(), file_name)
    }

    /// Catalog explorer page for this volume
    pub fn explore_url(&self, hostname: &str) -> String {
        format!(
            "https://{}/explore/data/volumes/{}/{}/{}",
            hostname, self.catalog, self.schema, self.volume
        )
    }
}

impl fmt::Display for VolumeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.volume)
    }
}

/// Check an uploaded file's name before it becomes part of a remote path
pub fn validate_file_name(name: &str) -> Result<&str, WorkflowError> {
    let invalid = || WorkflowError::InvalidFileName {
        name: name.to_string(),
    };
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control)
    {
        return Err(invalid());
    }
    Ok(name)
}

/// Final path component of a browser-supplied file name
pub fn base_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(name)
        .trim()
}

/// Single-part table name, qualified by the uploaded volume's catalog/schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    catalog: String,
    schema: String,
    table: String,
}

impl TableName {
    pub fn new(volume: &VolumeIdentifier, input: &str) -> Result<Self, WorkflowError> {
        let table = input.trim();
        let invalid = |reason| WorkflowError::InvalidTableName {
            name: table.to_string(),
            reason,
        };

        if table.is_empty() {
            return Err(invalid("a table name is required"));
        }
        if table.contains('.') {
            return Err(invalid("give the table name only, without catalog or schema"));
        }
        if table.chars().any(char::is_control) {
            return Err(invalid("control characters are not allowed"));
        }

        Ok(Self {
            catalog: volume.catalog().to_string(),
            schema: volume.schema().to_string(),
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Backtick-quoted three-part name for SQL text
    pub fn quoted(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_ident(&self.catalog),
            quote_ident(&self.schema),
            quote_ident(&self.table)
        )
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Single-quoted SQL string literal
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_parts() {
        let id = VolumeIdentifier::parse("  main.marketing.raw_files ").unwrap();
        assert_eq!(id.catalog(), "main");
        assert_eq!(id.schema(), "marketing");
        assert_eq!(id.volume(), "raw_files");
        assert_eq!(id.full_name(), "main.marketing.raw_files");
        assert_eq!(id.to_string(), "main.marketing.raw_files");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for input in [
            "",
            "main",
            "main.marketing",
            "main.marketing.raw_files.extra",
            "main..raw_files",
            ".marketing.raw_files",
            "main.marketing.",
            "main.mar/keting.raw",
        ] {
            let err = VolumeIdentifier::parse(input).unwrap_err();
            assert!(
                matches!(err, WorkflowError::InvalidIdentifier { .. }),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_paths() {
        let id = VolumeIdentifier::parse("main.marketing.raw_files").unwrap();
        assert_eq!(
            id.file_path("data.csv"),
            "/Volumes/main/marketing/raw_files/data.csv"
        );
        assert_eq!(
            id.explore_url("adb-1.azuredatabricks.net"),
            "https://adb-1.azuredatabricks.net/explore/data/volumes/main/marketing/raw_files"
        );
    }

    #[test]
    fn test_file_names() {
        assert_eq!(validate_file_name("data.csv").unwrap(), "data.csv");
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("a/b.csv").is_err());

        assert_eq!(base_name("C:\\Users\\me\\data.csv"), "data.csv");
        assert_eq!(base_name("dir/sub/data.csv"), "data.csv");
        assert_eq!(base_name("data.csv"), "data.csv");
    }

    #[test]
    fn test_table_name() {
        let id = VolumeIdentifier::parse("main.marketing.raw_files").unwrap();
        let table = TableName::new(&id, " sales ").unwrap();
        assert_eq!(table.to_string(), "main.marketing.sales");
        assert_eq!(table.quoted(), "`main`.`marketing`.`sales`");

        let odd = TableName::new(&id, "we`ird").unwrap();
        assert_eq!(odd.quoted(), "`main`.`marketing`.`we``ird`");

        assert!(TableName::new(&id, "   ").is_err());
        assert!(TableName::new(&id, "other.sales").is_err());
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("/Volumes/a/b/c/x.csv"), "'/Volumes/a/b/c/x.csv'");
        assert_eq!(quote_literal("it's"), "'it\\'s'");
    }
}
