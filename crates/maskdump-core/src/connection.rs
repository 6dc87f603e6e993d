use std::fmt;

use serde::{Deserialize, Serialize};

use crate::driver::Backend;
use crate::error::Result;

/// Everything needed to reach one database.
///
/// The descriptor is never mutated once built. Its `Debug` output hides the
/// password; use [`crate::redact_connection`] for anything that is persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Logical connection name used in logs and run metadata.
    pub name: String,
    /// Driver family identifier (e.g. `pgsql`, `mysql2`, `sqlite3`).
    pub driver: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Database name, or the file path for SQLite.
    pub database: String,
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub charset: Option<String>,
    /// Namespace to dump (postgres `search_path` schema). Ignored elsewhere.
    pub schema: Option<String>,
}

impl ConnectionDescriptor {
    pub fn new(
        name: impl Into<String>,
        driver: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            host: None,
            port: None,
            database: database.into(),
            username: None,
            password: None,
            charset: None,
            schema: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>, port: Option<u16>) -> Self {
        self.host = Some(host.into());
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Resolve the driver identifier into a backend.
    pub fn backend(&self) -> Result<Backend> {
        Backend::from_driver(&self.driver)
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("name", &self.name)
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("charset", &self.charset)
            .field("schema", &self.schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_password() {
        let descriptor = ConnectionDescriptor::new("primary", "pgsql", "app")
            .with_credentials("app", Some("hunter2".to_string()));
        let rendered = format!("{descriptor:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn serialized_form_omits_password() {
        let descriptor = ConnectionDescriptor::new("primary", "pgsql", "app")
            .with_credentials("app", Some("hunter2".to_string()));
        let json = serde_json::to_string(&descriptor).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password"));
    }
}
