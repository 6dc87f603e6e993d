//! Database introspection and row streaming adapters.

pub mod adapter;
pub mod connect;
pub mod loader;
mod mapper;
pub mod memory;
pub mod mysql;
pub mod options;
pub mod postgres;
pub mod sqlite;

pub use adapter::{Adapter, RowSource, RowVisitor};
pub use connect::{connect, DatabaseConnection};
pub use loader::SnapshotLoader;
pub use memory::InMemoryDatabase;
pub use mysql::MySqlAdapter;
pub use options::IntrospectOptions;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

pub use maskdump_core::SchemaSnapshot;
