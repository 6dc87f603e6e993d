use sqlx::MySqlPool;

use maskdump_core::Result;

use crate::mapper::{RawColumn, db_error};

pub async fn list_tables_in_schema(
    pool: &MySqlPool,
    schema: &str,
    include_views: bool,
) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select cast(table_name as char)
        from information_schema.tables
        where table_schema = ?
          and (table_type = 'BASE TABLE' or (? and table_type = 'VIEW'))
        order by table_name
        "#,
    )
    .bind(schema)
    .bind(include_views)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub async fn list_columns_in_schema(pool: &MySqlPool, schema: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, (String, i64, String, String, String)>(
        r#"
        select
          cast(table_name as char),
          cast(ordinal_position as signed),
          cast(column_name as char),
          cast(column_type as char),
          cast(is_nullable as char)
        from information_schema.columns
        where table_schema = ?
        order by table_name, ordinal_position
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    Ok(rows
        .into_iter()
        .map(|(table, position, name, data_type, nullable)| RawColumn {
            table,
            ordinal_position: position,
            name,
            data_type,
            is_nullable: nullable == "YES",
        })
        .collect())
}
