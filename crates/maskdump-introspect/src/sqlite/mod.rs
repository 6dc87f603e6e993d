use futures::TryStreamExt;
use serde_json::{Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row as _, SqlitePool, TypeInfo, ValueRef};

use maskdump_core::{Result, Row, SchemaSnapshot, TableDescriptor};

use crate::adapter::{Adapter, RowSource, RowVisitor};
use crate::mapper::{build_snapshot, db_error, map_tables, quote_ident};
use crate::options::IntrospectOptions;

mod queries;

/// Adapter for SQLite database files.
#[derive(Debug, Clone)]
pub struct SqliteAdapter {
    pool: SqlitePool,
}

impl SqliteAdapter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl Adapter for SqliteAdapter {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    async fn list_tables(&self, opts: &IntrospectOptions) -> Result<SchemaSnapshot> {
        let table_names = queries::list_tables(&self.pool, opts.include_views).await?;
        let mut raw_columns = Vec::new();
        for table in &table_names {
            raw_columns.extend(queries::list_columns(&self.pool, table).await?);
        }

        Ok(build_snapshot(
            self.engine(),
            Some("main".to_string()),
            map_tables(table_names, raw_columns),
        ))
    }
}

#[async_trait::async_trait]
impl RowSource for SqliteAdapter {
    async fn for_each_row(
        &self,
        table: &TableDescriptor,
        visit: &mut RowVisitor<'_>,
    ) -> Result<u64> {
        let sql = format!(
            "select {} from {}",
            select_list(table),
            quote_ident(&table.name, '"')
        );
        let mut rows = sqlx::query(&sql).fetch(&self.pool);
        let mut count = 0u64;
        while let Some(row) = rows.try_next().await.map_err(db_error)? {
            visit(decode_row(table, &row)?)?;
            count += 1;
        }
        Ok(count)
    }
}

/// One expression per column. Blobs are read as uppercase hex whatever the
/// declared type, since any SQLite column can hold one.
fn select_list(table: &TableDescriptor) -> String {
    if table.columns.is_empty() {
        return "null".to_string();
    }
    table
        .columns
        .iter()
        .map(|column| {
            let ident = quote_ident(&column.name, '"');
            format!("case when typeof({ident}) = 'blob' then hex({ident}) else {ident} end")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_row(table: &TableDescriptor, row: &SqliteRow) -> Result<Row> {
    (0..table.columns.len())
        .map(|index| decode_value(row, index))
        .collect()
}

/// Decode by the storage class of the value, not the declared column type.
fn decode_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(db_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match raw.type_info().name() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(index).map_err(db_error)?),
        "REAL" => Number::from_f64(row.try_get::<f64, _>(index).map_err(db_error)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::String(row.try_get::<String, _>(index).map_err(db_error)?),
    };
    Ok(value)
}
