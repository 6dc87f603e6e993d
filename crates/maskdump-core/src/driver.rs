use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Schema-introspection backend a driver family maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    IbmDb2,
    SqlServer,
    MySql,
    Postgres,
    Sqlite,
}

/// Logical driver identifiers accepted in connection descriptors.
///
/// `mysql2` is what Amazon RDS reports for MySQL connections.
const DRIVER_MAPPING: &[(&str, Backend)] = &[
    ("db2", Backend::IbmDb2),
    ("mssql", Backend::SqlServer),
    ("mysql", Backend::MySql),
    ("mysql2", Backend::MySql),
    ("postgres", Backend::Postgres),
    ("postgresql", Backend::Postgres),
    ("pgsql", Backend::Postgres),
    ("sqlite", Backend::Sqlite),
    ("sqlite3", Backend::Sqlite),
];

impl Backend {
    /// Resolve a driver identifier. Unknown identifiers fail closed.
    pub fn from_driver(driver: &str) -> Result<Self> {
        DRIVER_MAPPING
            .iter()
            .find(|(name, _)| *name == driver)
            .map(|(_, backend)| *backend)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::known_drivers().collect();
                Error::UnsupportedDriver(format!("{driver} (known: {})", known.join(", ")))
            })
    }

    /// Every driver identifier with a known mapping.
    pub fn known_drivers() -> impl Iterator<Item = &'static str> {
        DRIVER_MAPPING.iter().map(|(name, _)| *name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::IbmDb2 => "ibm_db2",
            Backend::SqlServer => "sqlsrv",
            Backend::MySql => "mysql",
            Backend::Postgres => "pgsql",
            Backend::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_postgres_alias() {
        for driver in ["postgres", "postgresql", "pgsql"] {
            assert_eq!(Backend::from_driver(driver).unwrap(), Backend::Postgres);
        }
    }

    #[test]
    fn rds_mysql_alias_maps_to_mysql() {
        assert_eq!(Backend::from_driver("mysql2").unwrap(), Backend::MySql);
    }

    #[test]
    fn unknown_driver_fails_closed() {
        let err = Backend::from_driver("cockroach-ish").unwrap_err();
        let Error::UnsupportedDriver(message) = err else {
            panic!("expected UnsupportedDriver, got {err:?}");
        };
        assert!(message.starts_with("cockroach-ish (known: "));
        assert!(message.contains("mysql2"));
        assert!(message.contains("sqlite3"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(Backend::from_driver("MySQL").is_err());
    }
}
