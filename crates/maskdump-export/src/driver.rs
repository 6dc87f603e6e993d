use std::time::Instant;

use maskdump_core::Row;
use maskdump_introspect::RowSource;
use maskdump_plan::{DumpPlan, MaskStrategy, TablePlan};

use crate::errors::{ExportError, Result};
use crate::generators::GeneratorRegistry;
use crate::masking::TableMasker;
use crate::model::{ExportOptions, ExportReport, TableReport};
use crate::sink::DumpSink;

/// Walks a dump plan, streaming and masking rows into a sink.
pub struct ExportDriver<'a> {
    registry: &'a GeneratorRegistry,
    options: ExportOptions,
}

impl<'a> ExportDriver<'a> {
    pub fn new(registry: &'a GeneratorRegistry, options: ExportOptions) -> Result<Self> {
        if options.chunk_size == 0 {
            return Err(ExportError::InvalidOptions(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { registry, options })
    }

    /// Fail on the first generator reference the registry cannot serve.
    pub fn check_generators(&self, plan: &DumpPlan) -> Result<()> {
        for table in plan.tables() {
            for rule in table.rules() {
                if let MaskStrategy::Generator { generator } = &rule.strategy
                    && !self.registry.contains(generator.id())
                {
                    return Err(ExportError::UnknownGenerator {
                        table: table.name().to_string(),
                        column: rule.column.clone(),
                        generator: generator.id().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Export every table of `plan` in plan order.
    ///
    /// Generator references are checked before any row is read. On error the
    /// sink is left unfinished.
    pub async fn export<S, K>(
        &self,
        plan: &DumpPlan,
        source: &S,
        sink: &mut K,
    ) -> Result<ExportReport>
    where
        S: RowSource + ?Sized,
        K: DumpSink + ?Sized,
    {
        self.check_generators(plan)?;

        let started = Instant::now();
        let mut report = ExportReport::default();
        tracing::info!(
            event = "export_started",
            engine = %plan.engine(),
            tables = plan.len(),
            seed = plan.seed()
        );

        for table_plan in plan.tables() {
            let table_report = self
                .export_table(table_plan, plan.seed(), source, sink, &mut report)
                .await?;
            report.record_table(table_report);
        }

        sink.finish()?;
        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            event = "export_finished",
            tables = report.tables.len(),
            rows = report.rows_total,
            duration_ms = report.duration_ms
        );
        Ok(report)
    }

    async fn export_table<S, K>(
        &self,
        table_plan: &TablePlan,
        seed: u64,
        source: &S,
        sink: &mut K,
        report: &mut ExportReport,
    ) -> Result<TableReport>
    where
        S: RowSource + ?Sized,
        K: DumpSink + ?Sized,
    {
        let table_start = Instant::now();
        sink.begin_table(table_plan.table(), table_plan.mode())?;

        let mut rows_exported = 0;
        let mut batches = 0;
        if !table_plan.is_schema_only() {
            let chunk_size = table_plan.chunk_size().unwrap_or(self.options.chunk_size);
            let mut masker = TableMasker::new(table_plan, self.registry, seed)?;
            let mut batch: Vec<Row> = Vec::with_capacity(chunk_size);
            let mut failure: Option<ExportError> = None;
            let mut row_index = 0u64;

            let streamed = {
                let mut visit = |row: Row| -> maskdump_core::Result<()> {
                    let result = masker.apply(row_index, row).and_then(|masked| {
                        batch.push(masked);
                        if batch.len() >= chunk_size {
                            sink.write_rows(&batch)?;
                            batch.clear();
                            batches += 1;
                        }
                        Ok(())
                    });
                    row_index += 1;
                    result.map_err(|err| {
                        let message = err.to_string();
                        failure = Some(err);
                        maskdump_core::Error::Other(message)
                    })
                };
                source.for_each_row(table_plan.table(), &mut visit).await
            };

            if let Some(err) = failure {
                return Err(err);
            }
            rows_exported = streamed?;
            if !batch.is_empty() {
                sink.write_rows(&batch)?;
                batches += 1;
            }
            for (id, count) in masker.generator_usage() {
                report.record_generator_usage(id, count);
            }
        }

        let bytes_written = sink.finish_table()?;
        let masked_columns: Vec<String> = table_plan
            .rules()
            .iter()
            .filter(|rule| rule.strategy != MaskStrategy::PassThrough)
            .map(|rule| rule.column.clone())
            .collect();

        tracing::info!(
            event = "table_exported",
            table = %table_plan.name(),
            mode = ?table_plan.mode(),
            rows = rows_exported,
            batches,
            masked_columns = masked_columns.len(),
            duration_ms = table_start.elapsed().as_millis() as u64
        );

        Ok(TableReport {
            table: table_plan.name().to_string(),
            mode: table_plan.mode(),
            rows_exported,
            batches,
            masked_columns,
            bytes_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_chunk_size_is_rejected() {
        let registry = GeneratorRegistry::new();
        let err = ExportDriver::new(&registry, ExportOptions { chunk_size: 0 })
            .err()
            .unwrap();
        assert!(matches!(err, ExportError::InvalidOptions(_)));
    }
}
