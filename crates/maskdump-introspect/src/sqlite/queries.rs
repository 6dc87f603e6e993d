use sqlx::SqlitePool;

use maskdump_core::Result;

use crate::mapper::{RawColumn, db_error};

pub async fn list_tables(pool: &SqlitePool, include_views: bool) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        select name
        from sqlite_master
        where (type = 'table' or (?1 and type = 'view'))
          and name not like 'sqlite\_%' escape '\'
        order by name
        "#,
    )
    .bind(include_views)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub async fn list_columns(pool: &SqlitePool, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query_as::<_, (i64, String, String, i64)>(
        r#"select cid, name, type, "notnull" from pragma_table_info(?1) order by cid"#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_error)?;

    Ok(rows
        .into_iter()
        .map(|(cid, name, data_type, not_null)| RawColumn {
            table: table.to_string(),
            ordinal_position: cid + 1,
            name,
            data_type,
            is_nullable: not_null == 0,
        })
        .collect())
}
