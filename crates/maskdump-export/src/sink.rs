use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use maskdump_core::{Row, TableDescriptor};
use maskdump_plan::InclusionMode;

use crate::errors::{ExportError, Result};

/// Destination of a dump. Calls arrive as
/// `(begin_table write_rows* finish_table)* finish`.
pub trait DumpSink: Send {
    /// Emit the structure of `table`.
    fn begin_table(&mut self, table: &TableDescriptor, mode: InclusionMode) -> Result<()>;

    /// Append a batch of masked rows to the open table.
    fn write_rows(&mut self, rows: &[Row]) -> Result<()>;

    /// Close the open table, returning the bytes written for it.
    fn finish_table(&mut self) -> Result<u64>;

    /// Flush everything; no calls follow.
    fn finish(&mut self) -> Result<()>;
}

/// Text encoding of binary values in data files.
pub const BINARY_ENCODING: &str = "hex";

/// Entry of `structure.json`.
#[derive(Debug, Clone, Serialize)]
struct StructureEntry {
    table: TableDescriptor,
    mode: InclusionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_file: Option<String>,
    /// Columns whose values are written as uppercase hex.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    binary_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    binary_encoding: Option<&'static str>,
}

struct OpenCsv {
    writer: csv::Writer<CountingWriter<BufWriter<File>>>,
}

/// Writes one CSV per full table plus `structure.json` into a directory.
pub struct CsvDirSink {
    out_dir: PathBuf,
    structure: Vec<StructureEntry>,
    open: Option<OpenCsv>,
    in_table: bool,
}

impl CsvDirSink {
    /// Create `out_dir` if needed.
    pub fn create(out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            structure: Vec::new(),
            open: None,
            in_table: false,
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl DumpSink for CsvDirSink {
    fn begin_table(&mut self, table: &TableDescriptor, mode: InclusionMode) -> Result<()> {
        if self.in_table {
            return Err(ExportError::Sink(format!(
                "begin_table({}) while another table is open",
                table.name
            )));
        }

        let data_file = match mode {
            InclusionMode::SchemaOnly => None,
            InclusionMode::Full => {
                let file_name = format!("{}.csv", file_stem(&table.name));
                let file = File::create(self.out_dir.join(&file_name))?;
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(CountingWriter::new(BufWriter::new(file)));
                let header: Vec<&str> = table.columns.iter().map(|col| col.name.as_str()).collect();
                writer.write_record(&header)?;
                self.open = Some(OpenCsv { writer });
                Some(file_name)
            }
        };

        let binary_columns: Vec<String> = table
            .columns
            .iter()
            .filter(|column| column.is_binary())
            .map(|column| column.name.clone())
            .collect();
        self.structure.push(StructureEntry {
            table: table.clone(),
            mode,
            data_file,
            binary_encoding: (!binary_columns.is_empty()).then_some(BINARY_ENCODING),
            binary_columns,
        });
        self.in_table = true;
        Ok(())
    }

    fn write_rows(&mut self, rows: &[Row]) -> Result<()> {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| ExportError::Sink("write_rows without an open data table".to_string()))?;
        for row in rows {
            let record: Vec<String> = row.iter().map(csv_field).collect();
            open.writer.write_record(&record)?;
        }
        Ok(())
    }

    fn finish_table(&mut self) -> Result<u64> {
        if !self.in_table {
            return Err(ExportError::Sink("finish_table without begin_table".to_string()));
        }
        self.in_table = false;

        let Some(open) = self.open.take() else {
            return Ok(0);
        };
        let mut writer = open.writer;
        writer.flush()?;
        let counting = writer
            .into_inner()
            .map_err(|err| ExportError::Io(err.into_error()))?;
        Ok(counting.bytes_written())
    }

    fn finish(&mut self) -> Result<()> {
        if self.in_table {
            self.finish_table()?;
        }
        let file = File::create(self.out_dir.join("structure.json"))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.structure)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// CSV text for one value. `NULL` is an empty field; strings are written
/// as-is; everything else as JSON.
fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Table names can carry characters that are not valid in file names.
fn file_stem(table: &str) -> String {
    table
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Table captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedTable {
    pub table: TableDescriptor,
    pub mode: InclusionMode,
    pub rows: Vec<Row>,
    pub batches: usize,
}

/// Keeps everything in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Vec<CapturedTable>,
    open: bool,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[CapturedTable] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&CapturedTable> {
        self.tables.iter().find(|captured| captured.table.name == name)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl DumpSink for MemorySink {
    fn begin_table(&mut self, table: &TableDescriptor, mode: InclusionMode) -> Result<()> {
        if self.open {
            return Err(ExportError::Sink(format!(
                "begin_table({}) while another table is open",
                table.name
            )));
        }
        self.tables.push(CapturedTable {
            table: table.clone(),
            mode,
            rows: Vec::new(),
            batches: 0,
        });
        self.open = true;
        Ok(())
    }

    fn write_rows(&mut self, rows: &[Row]) -> Result<()> {
        match self.tables.last_mut() {
            Some(captured) if self.open && captured.mode == InclusionMode::Full => {
                captured.rows.extend_from_slice(rows);
                captured.batches += 1;
                Ok(())
            }
            _ => Err(ExportError::Sink(
                "write_rows without an open data table".to_string(),
            )),
        }
    }

    fn finish_table(&mut self) -> Result<u64> {
        if !self.open {
            return Err(ExportError::Sink("finish_table without begin_table".to_string()));
        }
        self.open = false;
        Ok(0)
    }

    fn finish(&mut self) -> Result<()> {
        self.open = false;
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use maskdump_core::ColumnDescriptor;
    use serde_json::json;

    use super::*;

    fn table(name: &str) -> TableDescriptor {
        TableDescriptor::new(
            name,
            vec![
                ColumnDescriptor::new(1, "id", "integer", false),
                ColumnDescriptor::new(2, "note", "text", true),
            ],
        )
    }

    #[test]
    fn csv_fields_render_null_as_empty() {
        assert_eq!(csv_field(&Value::Null), "");
        assert_eq!(csv_field(&json!("a,b")), "a,b");
        assert_eq!(csv_field(&json!(true)), "true");
        assert_eq!(csv_field(&json!({"k": 1})), "{\"k\":1}");
    }

    #[test]
    fn file_stem_replaces_separators() {
        assert_eq!(file_stem("public.users"), "public.users");
        assert_eq!(file_stem("../etc/passwd"), ".._etc_passwd");
    }

    #[test]
    fn memory_sink_rejects_rows_for_schema_only_table() {
        let mut sink = MemorySink::new();
        sink.begin_table(&table("audit"), InclusionMode::SchemaOnly)
            .unwrap();
        let err = sink.write_rows(&[vec![json!(1), Value::Null]]).unwrap_err();
        assert!(matches!(err, ExportError::Sink(_)));
    }

    #[test]
    fn csv_sink_writes_header_rows_and_structure() {
        let out_dir = std::env::temp_dir().join(format!("maskdump-sink-{}", uuid::Uuid::new_v4()));
        let mut sink = CsvDirSink::create(&out_dir).unwrap();

        sink.begin_table(&table("notes"), InclusionMode::Full).unwrap();
        sink.write_rows(&[vec![json!(1), json!("hello, world")], vec![json!(2), Value::Null]])
            .unwrap();
        let bytes = sink.finish_table().unwrap();
        sink.begin_table(&table("audit"), InclusionMode::SchemaOnly)
            .unwrap();
        assert_eq!(sink.finish_table().unwrap(), 0);
        sink.finish().unwrap();

        let csv = fs::read_to_string(out_dir.join("notes.csv")).unwrap();
        assert_eq!(csv, "id,note\n1,\"hello, world\"\n2,\n");
        assert_eq!(bytes, csv.len() as u64);
        assert!(!out_dir.join("audit.csv").exists());

        let structure: Value =
            serde_json::from_str(&fs::read_to_string(out_dir.join("structure.json")).unwrap())
                .unwrap();
        assert_eq!(structure[0]["data_file"], "notes.csv");
        assert_eq!(structure[1]["mode"], "schema_only");
        assert!(structure[1].get("data_file").is_none());

        fs::remove_dir_all(&out_dir).ok();
    }

    #[test]
    fn structure_names_binary_columns_and_encoding() {
        let out_dir = std::env::temp_dir().join(format!("maskdump-sink-{}", uuid::Uuid::new_v4()));
        let mut sink = CsvDirSink::create(&out_dir).unwrap();
        let files = TableDescriptor::new(
            "files",
            vec![
                ColumnDescriptor::new(1, "id", "integer", false),
                ColumnDescriptor::new(2, "data", "bytea", true),
            ],
        );

        sink.begin_table(&files, InclusionMode::Full).unwrap();
        sink.write_rows(&[vec![json!(1), json!("00FF10")]]).unwrap();
        sink.finish_table().unwrap();
        sink.begin_table(&table("notes"), InclusionMode::Full).unwrap();
        sink.finish().unwrap();

        let structure: Value =
            serde_json::from_str(&fs::read_to_string(out_dir.join("structure.json")).unwrap())
                .unwrap();
        assert_eq!(structure[0]["binary_columns"], json!(["data"]));
        assert_eq!(structure[0]["binary_encoding"], BINARY_ENCODING);
        assert!(structure[1].get("binary_columns").is_none());
        assert!(structure[1].get("binary_encoding").is_none());

        fs::remove_dir_all(&out_dir).ok();
    }
}
