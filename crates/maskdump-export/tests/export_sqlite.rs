use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use maskdump_core::ConnectionDescriptor;
use maskdump_export::{CsvDirSink, ExportDriver, ExportOptions, GeneratorRegistry};
use maskdump_introspect::{IntrospectOptions, SnapshotLoader, connect};
use maskdump_plan::DumpSchema;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

const FIXTURE: &[&str] = &[
    "create table customers (id integer primary key, email text not null, phone text, city text)",
    "create table sessions (id integer primary key, token text not null)",
    "insert into customers (id, email, phone, city) values \
     (1, 'ada@corp.example', '555-0100', 'London'), \
     (2, 'bob@corp.example', null, 'Paris'), \
     (3, 'eve@corp.example', '555-0199', null)",
    "insert into sessions (id, token) values (1, 'secret-token')",
];

async fn seed_database(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("source.db");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true),
        )
        .await
        .context("creating sqlite fixture")?;

    for statement in FIXTURE {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .with_context(|| format!("executing fixture {statement}"))?;
    }
    pool.close().await;
    Ok(path)
}

fn temp_dir() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("maskdump-export-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[tokio::test]
async fn dumps_sqlite_database_to_csv() -> Result<()> {
    let dir = temp_dir()?;
    let source = seed_database(&dir).await?;
    let connection = connect(&ConnectionDescriptor::new(
        "fixture",
        "sqlite",
        source.display().to_string(),
    ))
    .await?;

    let mut loader = SnapshotLoader::new(&connection, IntrospectOptions::default());
    let plan = DumpSchema::new()
        .with_seed(1)
        .include_all_tables()
        .schema_only_table("sessions")
        .define_table("customers", |table| {
            table
                .mask_column("email", "internet.safe_email")?
                .mask_with_character("phone", 'x')?
                .replace_column("city", "Springfield")?;
            Ok(())
        })
        .load(&mut loader)
        .await?;

    let registry = GeneratorRegistry::new();
    let driver = ExportDriver::new(&registry, ExportOptions::default())?;
    let out_dir = dir.join("out");
    let mut sink = CsvDirSink::create(&out_dir)?;
    let report = driver.export(&plan, &connection, &mut sink).await?;
    connection.close().await;

    assert_eq!(report.rows_total, 3);

    let mut reader = csv::Reader::from_path(out_dir.join("customers.csv"))?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    assert_eq!(headers, vec!["id", "email", "phone", "city"]);

    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 3);
    assert_eq!(&records[0][0], "1");
    assert!(records[0][1].contains('@'));
    assert!(!records[0][1].ends_with("corp.example"));
    assert_eq!(&records[0][2], "xxxxxxxx");
    assert_eq!(&records[1][2], "");
    assert_eq!(&records[2][3], "Springfield");

    assert!(!out_dir.join("sessions.csv").exists());
    let structure = fs::read_to_string(out_dir.join("structure.json"))?;
    assert!(structure.contains("\"schema_only\""));
    assert!(!structure.contains("secret-token"));

    fs::remove_dir_all(&dir).ok();
    Ok(())
}
