use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single row read from a table, aligned with the table's column order.
pub type Row = Vec<serde_json::Value>;

/// One read of the live database's table/column catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaSnapshot {
    /// Contract version for this snapshot format.
    pub schema_version: String,
    /// Backend identifier (e.g. `pgsql`).
    pub engine: String,
    /// Database name when available.
    pub database: Option<String>,
    /// Tables in a stable order.
    pub tables: Vec<TableDescriptor>,
}

impl SchemaSnapshot {
    /// Look up a table by its exact name.
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|table| table.name.as_str())
    }
}

/// Table name plus its columns in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Look up a column by its exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Position of a column within a [`Row`].
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Column metadata as declared by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDescriptor {
    /// 1-based position in the table definition.
    pub ordinal_position: i32,
    pub name: String,
    /// Type as formatted by the database (e.g. `character varying(255)`).
    pub data_type: String,
    pub is_nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(
        ordinal_position: i32,
        name: impl Into<String>,
        data_type: impl Into<String>,
        is_nullable: bool,
    ) -> Self {
        Self {
            ordinal_position,
            name: name.into(),
            data_type: data_type.into(),
            is_nullable,
        }
    }

    /// Whether the declared type stores raw bytes. Values of such columns
    /// are exported as uppercase hex.
    pub fn is_binary(&self) -> bool {
        let lowered = self.data_type.to_ascii_lowercase();
        let base = lowered.split('(').next().unwrap_or_default().trim();
        matches!(
            base,
            "bytea" | "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob"
        )
    }
}
