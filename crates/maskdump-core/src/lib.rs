//! Core contracts and helpers for maskdump.
//!
//! This crate defines the schema snapshot types, the connection descriptor
//! and driver mapping, and the error type shared across adapters, the plan
//! resolver, and the CLI.

pub mod connection;
pub mod driver;
pub mod error;
pub mod redaction;
pub mod schema;
pub mod validation;

pub use connection::ConnectionDescriptor;
pub use driver::Backend;
pub use error::{Error, Result};
pub use redaction::{redact_connection, RedactedConnection};
pub use schema::{ColumnDescriptor, Row, SchemaSnapshot, TableDescriptor};
pub use validation::validate_snapshot;

/// Current contract version for snapshot artifacts.
pub const SCHEMA_VERSION: &str = "0.1";
