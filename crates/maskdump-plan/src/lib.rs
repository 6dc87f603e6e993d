//! Table definitions, masking rules and dump plan resolution.
//!
//! A [`DumpSchema`] collects the default policy and per-table overrides.
//! Resolving it against a [`maskdump_core::SchemaSnapshot`] yields an ordered
//! [`DumpPlan`] that the export driver walks.

pub mod config;
pub mod definition;
pub mod dump_schema;
pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use config::{ConnectionConfig, DumpConfig, IntrospectConfig, MaskConfig, TableConfig};
pub use definition::{DEFAULT_MASK_CHARACTER, TableDefinition};
pub use dump_schema::{DumpSchema, TableDefiner};
pub use errors::{PlanError, Result};
pub use model::{
    ColumnMaskRule, DumpPlan, GeneratorRef, InclusionMode, MaskStrategy, PLAN_VERSION, TablePlan,
};
pub use schema::plan_json_schema;
pub use validate::{parse_plan, validate_plan_against_snapshot, validate_plan_json};
