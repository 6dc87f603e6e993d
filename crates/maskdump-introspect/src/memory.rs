use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use maskdump_core::{Error, Result, Row, SchemaSnapshot, TableDescriptor, SCHEMA_VERSION};

use crate::adapter::{Adapter, RowSource, RowVisitor};
use crate::options::IntrospectOptions;

/// Database held entirely in memory.
///
/// Used for dry runs and tests. Counts introspection passes and row reads so
/// callers can assert on database round-trips.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    database: Option<String>,
    tables: Vec<(TableDescriptor, Vec<Row>)>,
    introspections: AtomicUsize,
    row_reads: AtomicUsize,
}

impl InMemoryDatabase {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            ..Self::default()
        }
    }

    /// Add a table with its rows. Rows must be aligned with the columns.
    pub fn with_table(mut self, table: TableDescriptor, rows: Vec<Row>) -> Self {
        self.tables.push((table, rows));
        self
    }

    /// Number of `list_tables` calls served so far.
    pub fn introspection_count(&self) -> usize {
        self.introspections.load(Ordering::SeqCst)
    }

    /// Number of `for_each_row` calls served so far.
    pub fn row_read_count(&self) -> usize {
        self.row_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adapter for InMemoryDatabase {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn list_tables(&self, _opts: &IntrospectOptions) -> Result<SchemaSnapshot> {
        self.introspections.fetch_add(1, Ordering::SeqCst);
        let mut tables: Vec<TableDescriptor> =
            self.tables.iter().map(|(table, _)| table.clone()).collect();
        tables.sort_by(|left, right| left.name.cmp(&right.name));

        Ok(SchemaSnapshot {
            schema_version: SCHEMA_VERSION.to_string(),
            engine: self.engine().to_string(),
            database: self.database.clone(),
            tables,
        })
    }
}

#[async_trait]
impl RowSource for InMemoryDatabase {
    async fn for_each_row(
        &self,
        table: &TableDescriptor,
        visit: &mut RowVisitor<'_>,
    ) -> Result<u64> {
        self.row_reads.fetch_add(1, Ordering::SeqCst);
        let (_, rows) = self
            .tables
            .iter()
            .find(|(candidate, _)| candidate.name == table.name)
            .ok_or_else(|| Error::Db(format!("relation \"{}\" does not exist", table.name)))?;

        let mut count = 0u64;
        for row in rows {
            visit(row.clone())?;
            count += 1;
        }
        Ok(count)
    }
}
