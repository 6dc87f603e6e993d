use thiserror::Error;

/// Core error type shared across maskdump crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The driver identifier has no mapping to an introspection backend.
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),
    /// The database could not be reached or refused the credentials.
    #[error("connection error: {0}")]
    Connection(String),
    /// A query failed after the connection was established.
    #[error("database error: {0}")]
    Db(String),
    /// The schema snapshot violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by maskdump crates.
pub type Result<T> = std::result::Result<T, Error>;
