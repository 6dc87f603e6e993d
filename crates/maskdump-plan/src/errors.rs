use thiserror::Error;

/// Errors raised while declaring, resolving or replaying a dump plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// An override names a table that is not in the live schema.
    #[error("unknown table: {table}")]
    UnknownTable { table: String },
    /// A mask rule names a column that is not in its table.
    #[error("unknown column: {table}.{column}")]
    UnknownColumn { table: String, column: String },
    /// A builder argument or config entry is malformed.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
    /// A stored plan no longer matches the live schema.
    #[error("plan does not match the live schema: {0}")]
    SchemaDrift(String),
    /// Plan JSON does not satisfy the plan JSON Schema.
    #[error("schema error: {0}")]
    Schema(String),
    #[error(transparent)]
    Core(#[from] maskdump_core::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for plan operations.
pub type Result<T> = std::result::Result<T, PlanError>;
