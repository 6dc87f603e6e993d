use serde_json::Value;

use maskdump_core::{ColumnDescriptor, Error, Result, Row, SchemaSnapshot, TableDescriptor, SCHEMA_VERSION};

pub struct RawColumn {
    pub table: String,
    pub ordinal_position: i64,
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// Group raw columns under their tables, keeping tables without columns.
pub fn map_tables(table_names: Vec<String>, raw_columns: Vec<RawColumn>) -> Vec<TableDescriptor> {
    let mut tables: Vec<TableDescriptor> = table_names
        .into_iter()
        .map(|name| TableDescriptor::new(name, Vec::new()))
        .collect();

    for raw in raw_columns {
        if let Some(table) = tables.iter_mut().find(|table| table.name == raw.table) {
            table.columns.push(ColumnDescriptor {
                ordinal_position: i32::try_from(raw.ordinal_position).unwrap_or(i32::MAX),
                name: raw.name,
                data_type: raw.data_type,
                is_nullable: raw.is_nullable,
            });
        }
    }

    for table in &mut tables {
        table.columns.sort_by_key(|column| column.ordinal_position);
    }
    tables.sort_by(|left, right| left.name.cmp(&right.name));
    tables
}

pub fn build_snapshot(
    engine: &str,
    database: Option<String>,
    tables: Vec<TableDescriptor>,
) -> SchemaSnapshot {
    SchemaSnapshot {
        schema_version: SCHEMA_VERSION.to_string(),
        engine: engine.to_string(),
        database,
        tables,
    }
}

/// Decode a JSON object row produced by the database into column order.
///
/// Numbers keep their exact text. Binary columns end up as uppercase hex,
/// with Postgres' `\x` prefix dropped.
pub fn row_from_json(table: &TableDescriptor, text: &str) -> Result<Row> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| Error::Db(format!("invalid row json for {}: {err}", table.name)))?;
    let Value::Object(mut object) = value else {
        return Err(Error::Db(format!(
            "expected a json object row for {}",
            table.name
        )));
    };

    Ok(table
        .columns
        .iter()
        .map(|column| {
            let value = object.remove(&column.name).unwrap_or(Value::Null);
            match value {
                Value::String(text) if column.is_binary() => Value::String(normalize_hex(&text)),
                other => other,
            }
        })
        .collect())
}

fn normalize_hex(text: &str) -> String {
    text.strip_prefix("\\x")
        .unwrap_or(text)
        .to_ascii_uppercase()
}

/// Quote an identifier with the given quote character, doubling embedded quotes.
pub fn quote_ident(name: &str, quote: char) -> String {
    let doubled = format!("{quote}{quote}");
    format!("{quote}{}{quote}", name.replace(quote, &doubled))
}

/// Quote a string literal for use inside generated SQL.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build a `json_object('col', col, ...)` expression over every column.
/// Binary columns go through `hex()`.
pub fn json_object_expr(table: &TableDescriptor, quote: char) -> String {
    let pairs: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let ident = quote_ident(&column.name, quote);
            let value = if column.is_binary() {
                format!("hex({ident})")
            } else {
                ident
            };
            format!("{}, {value}", quote_literal(&column.name))
        })
        .collect();
    format!("json_object({})", pairs.join(", "))
}

pub fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}
