use sqlx::PgPool;

use maskdump_core::Result;

use crate::mapper::{RawColumn, db_error};

pub async fn fetch_database_name(pool: &PgPool) -> Result<String> {
    sqlx::query_scalar::<_, String>("select current_database()::text")
        .fetch_one(pool)
        .await
        .map_err(db_error)
}

pub async fn list_tables_in_schema(
    pool: &PgPool,
    schema: &str,
    include_views: bool,
) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select c.relname::text
        from pg_class c
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and (c.relkind in ('r', 'p') or ($2 and c.relkind in ('v', 'm')))
          and not c.relispartition
        order by c.relname
        "#,
    )
    .bind(schema)
    .bind(include_views)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub async fn list_columns_in_schema(pool: &PgPool, schema: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, (String, i32, String, String, bool)>(
        r#"
        select
          c.relname::text,
          a.attnum::int4,
          a.attname::text,
          pg_catalog.format_type(a.atttypid, a.atttypmod),
          a.attnotnull
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and a.attnum > 0
          and not a.attisdropped
        order by c.relname, a.attnum
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    Ok(rows
        .into_iter()
        .map(|(table, position, name, data_type, not_null)| RawColumn {
            table,
            ordinal_position: i64::from(position),
            name,
            data_type,
            is_nullable: !not_null,
        })
        .collect())
}
