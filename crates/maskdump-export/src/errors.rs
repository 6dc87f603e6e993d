use thiserror::Error;

/// Errors emitted while exporting a dump plan.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A mask rule references a generator the registry does not know.
    #[error("unknown generator '{generator}' for {table}.{column}")]
    UnknownGenerator {
        table: String,
        column: String,
        generator: String,
    },
    /// A streamed row does not line up with the table's columns.
    #[error("row {row} of {table} has {found} values, expected {expected}")]
    RowShape {
        table: String,
        row: u64,
        expected: usize,
        found: usize,
    },
    #[error("invalid export options: {0}")]
    InvalidOptions(String),
    /// Sink called out of order (e.g. rows before `begin_table`).
    #[error("sink error: {0}")]
    Sink(String),
    #[error(transparent)]
    Core(#[from] maskdump_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
