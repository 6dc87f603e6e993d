use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use maskdump_core::{ConnectionDescriptor, Row};
use maskdump_introspect::{Adapter, IntrospectOptions, RowSource, SnapshotLoader, connect};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

const FIXTURE: &[&str] = &[
    "create table users (id integer primary key, email text not null, name text)",
    "create table audit_log (id integer primary key, payload text)",
    "create view user_emails as select email from users",
    "insert into users (id, email, name) values (1, 'ada@example.com', 'Ada'), (2, 'bob@example.com', null)",
    "insert into audit_log (id, payload) values (1, 'login')",
];

async fn seed_database() -> Result<PathBuf> {
    seed_with(FIXTURE.iter().map(|statement| statement.to_string())).await
}

async fn seed_with(statements: impl IntoIterator<Item = String>) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("maskdump-{}.db", uuid::Uuid::new_v4()));
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true),
        )
        .await
        .context("creating sqlite fixture")?;

    for statement in statements {
        sqlx::query(&statement)
            .execute(&pool)
            .await
            .with_context(|| format!("executing fixture {statement}"))?;
    }
    pool.close().await;
    Ok(path)
}

fn descriptor(path: &PathBuf) -> ConnectionDescriptor {
    ConnectionDescriptor::new("fixture", "sqlite3", path.display().to_string())
}

#[tokio::test]
async fn introspects_tables_in_name_order() -> Result<()> {
    let path = seed_database().await?;
    let connection = connect(&descriptor(&path)).await?;

    let snapshot = connection.list_tables(&IntrospectOptions::default()).await?;
    assert_eq!(snapshot.engine, "sqlite");
    let names: Vec<&str> = snapshot.table_names().collect();
    assert_eq!(names, vec!["audit_log", "users"]);

    let users = snapshot
        .table("users")
        .ok_or_else(|| anyhow!("expected users table"))?;
    let columns: Vec<(&str, &str, bool)> = users
        .columns
        .iter()
        .map(|col| (col.name.as_str(), col.data_type.as_str(), col.is_nullable))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("id", "integer", true),
            ("email", "text", false),
            ("name", "text", true),
        ]
    );

    connection.close().await;
    std::fs::remove_file(&path).ok();
    Ok(())
}

#[tokio::test]
async fn includes_views_when_requested() -> Result<()> {
    let path = seed_database().await?;
    let connection = connect(&descriptor(&path)).await?;

    let mut loader = SnapshotLoader::new(&connection, IntrospectOptions { include_views: true });
    let snapshot = loader.load().await?;
    assert!(snapshot.table("user_emails").is_some());

    connection.close().await;
    std::fs::remove_file(&path).ok();
    Ok(())
}

#[tokio::test]
async fn streams_rows_aligned_with_columns() -> Result<()> {
    let path = seed_database().await?;
    let connection = connect(&descriptor(&path)).await?;

    let snapshot = connection.list_tables(&IntrospectOptions::default()).await?;
    let users = snapshot
        .table("users")
        .ok_or_else(|| anyhow!("expected users table"))?;

    let mut rows: Vec<Row> = Vec::new();
    let count = connection
        .for_each_row(users, &mut |row: Row| -> maskdump_core::Result<()> {
            rows.push(row);
            Ok(())
        })
        .await?;

    assert_eq!(count, 2);
    assert_eq!(
        rows,
        vec![
            vec![json!(1), json!("ada@example.com"), json!("Ada")],
            vec![json!(2), json!("bob@example.com"), json!(null)],
        ]
    );

    connection.close().await;
    std::fs::remove_file(&path).ok();
    Ok(())
}

async fn read_all(connection: &maskdump_introspect::DatabaseConnection, table: &str) -> Result<Vec<Row>> {
    let snapshot = connection.list_tables(&IntrospectOptions::default()).await?;
    let table = snapshot
        .table(table)
        .ok_or_else(|| anyhow!("expected {table} table"))?;

    let mut rows: Vec<Row> = Vec::new();
    connection
        .for_each_row(table, &mut |row: Row| -> maskdump_core::Result<()> {
            rows.push(row);
            Ok(())
        })
        .await?;
    Ok(rows)
}

#[tokio::test]
async fn streams_tables_wider_than_function_argument_limit() -> Result<()> {
    let columns: Vec<String> = (1..=70).map(|index| format!("c{index} integer")).collect();
    let values: Vec<String> = (1..=70).map(|index| index.to_string()).collect();
    let path = seed_with([
        format!("create table wide ({})", columns.join(", ")),
        format!("insert into wide values ({})", values.join(", ")),
    ])
    .await?;
    let connection = connect(&descriptor(&path)).await?;

    let rows = read_all(&connection, "wide").await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 70);
    assert_eq!(rows[0][0], json!(1));
    assert_eq!(rows[0][69], json!(70));

    connection.close().await;
    std::fs::remove_file(&path).ok();
    Ok(())
}

#[tokio::test]
async fn streams_blobs_as_uppercase_hex() -> Result<()> {
    let path = seed_with([
        "create table files (id integer primary key, data blob, note text)".to_string(),
        "insert into files (id, data, note) values (1, x'00ff10', x'ab'), (2, null, 'plain')"
            .to_string(),
    ])
    .await?;
    let connection = connect(&descriptor(&path)).await?;

    let rows = read_all(&connection, "files").await?;
    assert_eq!(
        rows,
        vec![
            vec![json!(1), json!("00FF10"), json!("AB")],
            vec![json!(2), json!(null), json!("plain")],
        ]
    );

    connection.close().await;
    std::fs::remove_file(&path).ok();
    Ok(())
}

#[tokio::test]
async fn keeps_reals_and_underscore_prefixed_names() -> Result<()> {
    let path = seed_with([
        "create table sqliteXdata (id integer primary key, ratio real)".to_string(),
        "insert into sqliteXdata (id, ratio) values (1, 0.125)".to_string(),
    ])
    .await?;
    let connection = connect(&descriptor(&path)).await?;

    let snapshot = connection.list_tables(&IntrospectOptions::default()).await?;
    let names: Vec<&str> = snapshot.table_names().collect();
    assert_eq!(names, vec!["sqliteXdata"]);

    let rows = read_all(&connection, "sqliteXdata").await?;
    assert_eq!(rows, vec![vec![json!(1), json!(0.125)]]);

    connection.close().await;
    std::fs::remove_file(&path).ok();
    Ok(())
}
