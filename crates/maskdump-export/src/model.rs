use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use maskdump_plan::InclusionMode;

/// Rows per batch when neither the table plan nor the caller picks one.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Options for the export driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Rows per batch for tables without their own chunk size.
    pub chunk_size: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Summary of one exported table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub mode: InclusionMode,
    pub rows_exported: u64,
    /// Batches handed to the sink.
    pub batches: u64,
    /// Columns whose values were not passed through.
    pub masked_columns: Vec<String>,
    pub bytes_written: u64,
}

/// Report for an export run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportReport {
    pub tables: Vec<TableReport>,
    pub rows_total: u64,
    pub generator_usage: BTreeMap<String, u64>,
    pub duration_ms: u64,
}

impl ExportReport {
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|table| table.table == name)
    }

    pub fn record_generator_usage(&mut self, id: &str, count: u64) {
        if count == 0 {
            return;
        }
        *self.generator_usage.entry(id.to_string()).or_insert(0) += count;
    }

    pub(crate) fn record_table(&mut self, table: TableReport) {
        self.rows_total += table.rows_exported;
        self.tables.push(table);
    }
}
