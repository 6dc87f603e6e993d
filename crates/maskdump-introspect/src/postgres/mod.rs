use futures::TryStreamExt;
use sqlx::PgPool;

use maskdump_core::{Result, SchemaSnapshot, TableDescriptor};

use crate::adapter::{Adapter, RowSource, RowVisitor};
use crate::mapper::{build_snapshot, db_error, map_tables, quote_ident, row_from_json};
use crate::options::IntrospectOptions;

mod queries;

const DEFAULT_SCHEMA: &str = "public";

/// Adapter for PostgreSQL databases.
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pool: PgPool,
    schema: String,
}

impl PostgresAdapter {
    /// Create a new adapter using a pre-configured pool.
    ///
    /// `schema` selects the namespace to dump and defaults to `public`.
    pub fn new(pool: PgPool, schema: Option<String>) -> Self {
        Self {
            pool,
            schema: schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn qualified_name(&self, table: &TableDescriptor) -> String {
        format!(
            "{}.{}",
            quote_ident(&self.schema, '"'),
            quote_ident(&table.name, '"')
        )
    }
}

#[async_trait::async_trait]
impl Adapter for PostgresAdapter {
    fn engine(&self) -> &'static str {
        "pgsql"
    }

    async fn list_tables(&self, opts: &IntrospectOptions) -> Result<SchemaSnapshot> {
        introspect(&self.pool, &self.schema, opts).await
    }
}

#[async_trait::async_trait]
impl RowSource for PostgresAdapter {
    async fn for_each_row(
        &self,
        table: &TableDescriptor,
        visit: &mut RowVisitor<'_>,
    ) -> Result<u64> {
        let sql = format!(
            "select row_to_json(t)::text from {} t",
            self.qualified_name(table)
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

/// Introspect a Postgres namespace according to the provided options.
pub async fn introspect(
    pool: &PgPool,
    schema: &str,
    opts: &IntrospectOptions,
) -> Result<SchemaSnapshot> {
    let database = queries::fetch_database_name(pool).await?;
    let table_names = queries::list_tables_in_schema(pool, schema, opts.include_views).await?;
    let raw_columns = queries::list_columns_in_schema(pool, schema).await?;

    Ok(build_snapshot(
        "pgsql",
        Some(database),
        map_tables(table_names, raw_columns),
    ))
}
