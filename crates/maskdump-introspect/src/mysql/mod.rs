use futures::TryStreamExt;
use sqlx::MySqlPool;

use maskdump_core::{Result, SchemaSnapshot, TableDescriptor};

use crate::adapter::{Adapter, RowSource, RowVisitor};
use crate::mapper::{build_snapshot, db_error, json_object_expr, map_tables, quote_ident, row_from_json};
use crate::options::IntrospectOptions;

mod queries;

/// Adapter for MySQL and MariaDB databases.
#[derive(Debug, Clone)]
pub struct MySqlAdapter {
    pool: MySqlPool,
    database: String,
}

impl MySqlAdapter {
    /// Create a new adapter reading tables of `database`.
    pub fn new(pool: MySqlPool, database: impl Into<String>) -> Self {
        Self {
            pool,
            database: database.into(),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl Adapter for MySqlAdapter {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    async fn list_tables(&self, opts: &IntrospectOptions) -> Result<SchemaSnapshot> {
        let table_names =
            queries::list_tables_in_schema(&self.pool, &self.database, opts.include_views).await?;
        let raw_columns = queries::list_columns_in_schema(&self.pool, &self.database).await?;

        Ok(build_snapshot(
            self.engine(),
            Some(self.database.clone()),
            map_tables(table_names, raw_columns),
        ))
    }
}

#[async_trait::async_trait]
impl RowSource for MySqlAdapter {
    async fn for_each_row(
        &self,
        table: &TableDescriptor,
        visit: &mut RowVisitor<'_>,
    ) -> Result<u64> {
        let sql = format!(
            "select cast({} as char) from {}.{}",
            json_object_expr(table, '`'),
            quote_ident(&self.database, '`'),
            quote_ident(&table.name, '`')
        );
        let mut rows = sqlx::query_scalar::<_, String>(&sql).fetch(&self.pool);
        let mut count = 0u64;
        while let Some(text) = rows.try_next().await.map_err(db_error)? {
            visit(row_from_json(table, &text)?)?;
            count += 1;
        }
        Ok(count)
    }
}
