use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use maskdump_core::ConnectionDescriptor;
use maskdump_introspect::IntrospectOptions;

use crate::definition::{DEFAULT_MASK_CHARACTER, TableDefinition};
use crate::dump_schema::DumpSchema;
use crate::errors::{PlanError, Result};

/// TOML dump configuration: connection, default policy and table overrides.
///
/// ```toml
/// seed = 42
/// include_all_tables = true
///
/// [connection]
/// driver = "pgsql"
/// host = "localhost"
/// database = "app"
/// username = "app"
/// password_env = "APP_DB_PASSWORD"
///
/// [[tables]]
/// name = "users"
/// masks = [{ column = "email", faker = "internet.safe_email" }]
///
/// [[tables]]
/// name = "audit_log"
/// schema_only = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub include_all_tables: bool,
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub introspect: IntrospectConfig,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    #[serde(default = "default_connection_name")]
    pub name: String,
    pub driver: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: String,
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Environment variable holding the password.
    pub password_env: Option<String>,
    pub charset: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntrospectConfig {
    /// Namespace to dump; PostgreSQL only.
    pub schema: Option<String>,
    #[serde(default)]
    pub include_views: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    pub name: String,
    #[serde(default)]
    pub schema_only: bool,
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub masks: Vec<MaskConfig>,
}

/// One column rule. Exactly one of `faker`, `mask` or `replace` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaskConfig {
    pub column: String,
    pub faker: Option<String>,
    pub mask: Option<String>,
    pub replace: Option<Value>,
}

fn default_connection_name() -> String {
    "default".to_string()
}

impl DumpConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Build the connection descriptor, reading `password_env` if set.
    pub fn connection_descriptor(&self) -> Result<ConnectionDescriptor> {
        let connection = &self.connection;
        let mut descriptor = ConnectionDescriptor::new(
            connection.name.clone(),
            connection.driver.clone(),
            connection.database.clone(),
        );
        if let Some(host) = &connection.host {
            descriptor = descriptor.with_host(host.clone(), connection.port);
        }

        let password = match (&connection.password, &connection.password_env) {
            (Some(password), _) => Some(password.clone()),
            (None, Some(var)) => Some(std::env::var(var).map_err(|_| {
                PlanError::InvalidDefinition(format!(
                    "environment variable {var} for connection {} is not set",
                    connection.name
                ))
            })?),
            (None, None) => None,
        };
        if let Some(username) = &connection.username {
            descriptor = descriptor.with_credentials(username.clone(), password);
        } else if password.is_some() {
            descriptor.password = password;
        }

        if let Some(charset) = &connection.charset {
            descriptor = descriptor.with_charset(charset.clone());
        }
        if let Some(schema) = &self.introspect.schema {
            descriptor = descriptor.with_schema(schema.clone());
        }
        Ok(descriptor)
    }

    pub fn introspect_options(&self) -> IntrospectOptions {
        IntrospectOptions {
            include_views: self.introspect.include_views,
        }
    }

    /// Translate the configuration into a [`DumpSchema`] declaration.
    pub fn dump_schema(&self) -> DumpSchema {
        let mut schema =
            DumpSchema::for_connection(self.connection.name.clone()).with_seed(self.seed);
        if self.include_all_tables {
            schema = schema.include_all_tables();
        }

        for table in &self.tables {
            let table = table.clone();
            schema = schema.define_table(table.name.clone(), move |definition| {
                table.apply(definition)
            });
        }
        schema
    }

    fn check(&self) -> Result<()> {
        if self.connection.password.is_some() && self.connection.password_env.is_some() {
            return Err(PlanError::InvalidDefinition(format!(
                "connection {} sets both password and password_env",
                self.connection.name
            )));
        }
        for table in &self.tables {
            if table.chunk_size == Some(0) {
                return Err(PlanError::InvalidDefinition(format!(
                    "chunk_size for table {} must be greater than zero",
                    table.name
                )));
            }
            for mask in &table.masks {
                mask.check(&table.name)?;
            }
        }
        Ok(())
    }
}

impl TableConfig {
    fn apply(&self, definition: &mut TableDefinition) -> Result<()> {
        if self.schema_only {
            definition.set_schema_only();
        }
        if let Some(rows) = self.chunk_size {
            definition.output_in_chunks_of(rows)?;
        }
        for mask in &self.masks {
            mask.apply(definition)?;
        }
        Ok(())
    }
}

impl MaskConfig {
    fn check(&self, table: &str) -> Result<()> {
        let strategies = [
            self.faker.is_some(),
            self.mask.is_some(),
            self.replace.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if strategies != 1 {
            return Err(PlanError::InvalidDefinition(format!(
                "mask for {table}.{} must set exactly one of faker, mask or replace",
                self.column
            )));
        }
        if let Some(mask) = &self.mask {
            mask_character(mask).ok_or_else(|| {
                PlanError::InvalidDefinition(format!(
                    "mask for {table}.{} must be a single character",
                    self.column
                ))
            })?;
        }
        Ok(())
    }

    fn apply(&self, definition: &mut TableDefinition) -> Result<()> {
        if let Some(generator) = &self.faker {
            definition.mask_column(&self.column, generator.as_str())?;
        } else if let Some(mask) = &self.mask {
            let character = mask_character(mask).unwrap_or(DEFAULT_MASK_CHARACTER);
            definition.mask_with_character(&self.column, character)?;
        } else if let Some(value) = &self.replace {
            definition.replace_column(&self.column, value.clone())?;
        }
        Ok(())
    }
}

/// Empty string selects the default character.
fn mask_character(mask: &str) -> Option<char> {
    let mut chars = mask.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Some(DEFAULT_MASK_CHARACTER),
        (Some(character), None) => Some(character),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_character_defaults_to_x() {
        assert_eq!(mask_character(""), Some('x'));
        assert_eq!(mask_character("*"), Some('*'));
        assert_eq!(mask_character("**"), None);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = DumpConfig::from_toml_str(
            r#"
            include_everything = true
            [connection]
            driver = "sqlite"
            database = "app.db"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::Config(_)));
    }

    #[test]
    fn rejects_mask_with_two_strategies() {
        let err = DumpConfig::from_toml_str(
            r#"
            [connection]
            driver = "sqlite"
            database = "app.db"

            [[tables]]
            name = "users"
            masks = [{ column = "email", faker = "internet.safe_email", mask = "*" }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::InvalidDefinition(_)));
    }

    #[test]
    fn missing_password_env_is_reported() {
        let config = DumpConfig::from_toml_str(
            r#"
            [connection]
            driver = "pgsql"
            database = "app"
            username = "app"
            password_env = "MASKDUMP_TEST_PASSWORD_THAT_IS_NEVER_SET"
            "#,
        )
        .unwrap();
        let err = config.connection_descriptor().unwrap_err();
        assert!(matches!(err, PlanError::InvalidDefinition(_)));
    }
}
