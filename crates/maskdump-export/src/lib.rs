//! Export driver for maskdump.
//!
//! Walks a resolved [`maskdump_plan::DumpPlan`], streams each full table from
//! a [`maskdump_introspect::RowSource`], applies the column rules and hands
//! the rows to a [`DumpSink`].

pub mod driver;
pub mod errors;
pub mod generators;
pub mod masking;
pub mod model;
pub mod sink;

pub use driver::ExportDriver;
pub use errors::{ExportError, Result};
pub use generators::{Generator, GeneratorRegistry};
pub use masking::{TableMasker, mask_value};
pub use model::{DEFAULT_CHUNK_SIZE, ExportOptions, ExportReport, TableReport};
pub use sink::{BINARY_ENCODING, CapturedTable, CsvDirSink, DumpSink, MemorySink};
