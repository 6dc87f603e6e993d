use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use maskdump_core::{Backend, ConnectionDescriptor, Error, Result, SchemaSnapshot, TableDescriptor};

use crate::adapter::{Adapter, RowSource, RowVisitor};
use crate::mysql::MySqlAdapter;
use crate::options::IntrospectOptions;
use crate::postgres::PostgresAdapter;
use crate::sqlite::SqliteAdapter;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONNECTIONS: u32 = 2;

/// Open connection to one of the supported backends.
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Postgres(PostgresAdapter),
    MySql(MySqlAdapter),
    Sqlite(SqliteAdapter),
}

/// Connect using a descriptor.
///
/// The driver identifier is resolved before any network activity, so an
/// unknown driver fails with [`Error::UnsupportedDriver`] without a connection
/// attempt. Transport and authentication failures map to
/// [`Error::Connection`].
pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<DatabaseConnection> {
    let backend = descriptor.backend()?;
    tracing::info!(
        event = "connection_opening",
        connection = %descriptor.name,
        backend = %backend
    );

    let connection = match backend {
        Backend::Postgres => {
            let mut options = PgConnectOptions::new().database(&descriptor.database);
            if let Some(host) = &descriptor.host {
                options = options.host(host);
            }
            if let Some(port) = descriptor.port {
                options = options.port(port);
            }
            if let Some(username) = &descriptor.username {
                options = options.username(username);
            }
            if let Some(password) = &descriptor.password {
                options = options.password(password);
            }
            if let Some(charset) = &descriptor.charset {
                options = options.options([("client_encoding", charset.as_str())]);
            }
            let pool = PgPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect_with(options)
                .await
                .map_err(connection_error)?;
            DatabaseConnection::Postgres(PostgresAdapter::new(pool, descriptor.schema.clone()))
        }
        Backend::MySql => {
            let mut options = MySqlConnectOptions::new().database(&descriptor.database);
            if let Some(host) = &descriptor.host {
                options = options.host(host);
            }
            if let Some(port) = descriptor.port {
                options = options.port(port);
            }
            if let Some(username) = &descriptor.username {
                options = options.username(username);
            }
            if let Some(password) = &descriptor.password {
                options = options.password(password);
            }
            if let Some(charset) = &descriptor.charset {
                options = options.charset(charset);
            }
            let pool = MySqlPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect_with(options)
                .await
                .map_err(connection_error)?;
            DatabaseConnection::MySql(MySqlAdapter::new(pool, descriptor.database.clone()))
        }
        Backend::Sqlite => {
            let options = SqliteConnectOptions::new()
                .filename(&descriptor.database)
                .read_only(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect_with(options)
                .await
                .map_err(connection_error)?;
            DatabaseConnection::Sqlite(SqliteAdapter::new(pool))
        }
        Backend::IbmDb2 | Backend::SqlServer => {
            return Err(Error::UnsupportedDriver(format!(
                "{} (no {backend} transport in this build)",
                descriptor.driver
            )));
        }
    };

    Ok(connection)
}

fn connection_error(err: sqlx::Error) -> Error {
    Error::Connection(err.to_string())
}

impl DatabaseConnection {
    pub fn backend(&self) -> Backend {
        match self {
            DatabaseConnection::Postgres(_) => Backend::Postgres,
            DatabaseConnection::MySql(_) => Backend::MySql,
            DatabaseConnection::Sqlite(_) => Backend::Sqlite,
        }
    }

    /// Close the underlying pool, waiting for checked-out connections.
    pub async fn close(&self) {
        match self {
            DatabaseConnection::Postgres(adapter) => adapter.close().await,
            DatabaseConnection::MySql(adapter) => adapter.close().await,
            DatabaseConnection::Sqlite(adapter) => adapter.close().await,
        }
    }

    fn adapter(&self) -> &dyn Adapter {
        match self {
            DatabaseConnection::Postgres(adapter) => adapter,
            DatabaseConnection::MySql(adapter) => adapter,
            DatabaseConnection::Sqlite(adapter) => adapter,
        }
    }

    fn row_source(&self) -> &dyn RowSource {
        match self {
            DatabaseConnection::Postgres(adapter) => adapter,
            DatabaseConnection::MySql(adapter) => adapter,
            DatabaseConnection::Sqlite(adapter) => adapter,
        }
    }
}

#[async_trait]
impl Adapter for DatabaseConnection {
    fn engine(&self) -> &'static str {
        self.adapter().engine()
    }

    async fn list_tables(&self, opts: &IntrospectOptions) -> Result<SchemaSnapshot> {
        self.adapter().list_tables(opts).await
    }
}

#[async_trait]
impl RowSource for DatabaseConnection {
    async fn for_each_row(
        &self,
        table: &TableDescriptor,
        visit: &mut RowVisitor<'_>,
    ) -> Result<u64> {
        self.row_source().for_each_row(table, visit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_driver_fails_before_connecting() {
        let descriptor = ConnectionDescriptor::new("legacy", "oracle", "orcl")
            .with_host("unreachable.invalid", Some(1521));
        let err = connect(&descriptor).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedDriver(ref driver) if driver.starts_with("oracle (known: ")));
    }

    #[tokio::test]
    async fn mapped_driver_without_transport_is_unsupported() {
        let descriptor = ConnectionDescriptor::new("warehouse", "mssql", "dw")
            .with_host("unreachable.invalid", Some(1433));
        let err = connect(&descriptor).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedDriver(ref message) if message.contains("sqlsrv")));
    }

    #[tokio::test]
    async fn missing_sqlite_file_is_a_connection_error() {
        let path = std::env::temp_dir().join(format!("maskdump-missing-{}.db", uuid::Uuid::new_v4()));
        let descriptor = ConnectionDescriptor::new("local", "sqlite3", path.display().to_string());
        let err = connect(&descriptor).await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
