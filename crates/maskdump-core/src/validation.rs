use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::SchemaSnapshot;

/// Validate internal consistency of a schema snapshot.
///
/// This checks:
/// - table and column names are non-empty
/// - duplicate tables
/// - duplicate columns within a table
pub fn validate_snapshot(snapshot: &SchemaSnapshot) -> Result<()> {
    let mut tables = BTreeSet::new();

    for table in &snapshot.tables {
        if table.name.is_empty() {
            return Err(Error::InvalidSchema("empty table name".to_string()));
        }
        if !tables.insert(table.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if column.name.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "empty column name in table {}",
                    table.name
                )));
            }
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.name, column.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, TableDescriptor};

    fn snapshot(tables: Vec<TableDescriptor>) -> SchemaSnapshot {
        SchemaSnapshot {
            schema_version: crate::SCHEMA_VERSION.to_string(),
            engine: "sqlite".to_string(),
            database: None,
            tables,
        }
    }

    #[test]
    fn accepts_distinct_tables() {
        let tables = vec![
            TableDescriptor::new("a", vec![ColumnDescriptor::new(1, "id", "integer", false)]),
            TableDescriptor::new("b", vec![ColumnDescriptor::new(1, "id", "integer", false)]),
        ];
        assert!(validate_snapshot(&snapshot(tables)).is_ok());
    }

    #[test]
    fn rejects_duplicate_tables() {
        let tables = vec![
            TableDescriptor::new("users", Vec::new()),
            TableDescriptor::new("users", Vec::new()),
        ];
        let err = validate_snapshot(&snapshot(tables)).unwrap_err();
        assert!(err.to_string().contains("duplicate table name: users"));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let tables = vec![TableDescriptor::new(
            "users",
            vec![
                ColumnDescriptor::new(1, "email", "text", true),
                ColumnDescriptor::new(2, "email", "text", true),
            ],
        )];
        let err = validate_snapshot(&snapshot(tables)).unwrap_err();
        assert!(err.to_string().contains("users.email"));
    }
}
