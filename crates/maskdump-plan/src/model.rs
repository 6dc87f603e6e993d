use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use maskdump_core::{SchemaSnapshot, TableDescriptor};

/// Contract version for `plan.json`.
pub const PLAN_VERSION: &str = "0.1";

/// Opaque generator identifier, resolved by the export driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GeneratorRef(String);

impl GeneratorRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GeneratorRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for GeneratorRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for GeneratorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a column's exported value is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MaskStrategy {
    /// Export the real value unchanged.
    PassThrough,
    /// Replace the value with the output of a named generator.
    Generator { generator: GeneratorRef },
    /// Replace every character of the value with `character`.
    Mask { character: char },
    /// Replace the value with a constant.
    Replace { value: serde_json::Value },
}

static PASS_THROUGH: MaskStrategy = MaskStrategy::PassThrough;

/// Rule bound to a single column of a table plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnMaskRule {
    pub column: String,
    #[serde(flatten)]
    pub strategy: MaskStrategy,
}

/// Whether a table's rows are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InclusionMode {
    /// Structure plus every row, masked per column rules.
    Full,
    /// Structure only, zero rows.
    SchemaOnly,
}

/// Export decision for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TablePlan {
    table: TableDescriptor,
    mode: InclusionMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rules: Vec<ColumnMaskRule>,
    /// Rows per batch handed to the sink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chunk_size: Option<usize>,
}

impl TablePlan {
    /// Fresh plan: full dump, every column passed through.
    pub fn new(table: TableDescriptor) -> Self {
        Self {
            table,
            mode: InclusionMode::Full,
            rules: Vec::new(),
            chunk_size: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.table.name
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn mode(&self) -> InclusionMode {
        self.mode
    }

    pub fn is_schema_only(&self) -> bool {
        self.mode == InclusionMode::SchemaOnly
    }

    pub fn rules(&self) -> &[ColumnMaskRule] {
        &self.rules
    }

    pub fn rule(&self, column: &str) -> Option<&ColumnMaskRule> {
        self.rules.iter().find(|rule| rule.column == column)
    }

    /// Strategy for `column`; columns without a rule pass through.
    pub fn strategy_for(&self, column: &str) -> &MaskStrategy {
        self.rule(column)
            .map(|rule| &rule.strategy)
            .unwrap_or(&PASS_THROUGH)
    }

    pub fn chunk_size(&self) -> Option<usize> {
        self.chunk_size
    }

    pub(crate) fn set_mode(&mut self, mode: InclusionMode) {
        self.mode = mode;
    }

    pub(crate) fn set_chunk_size(&mut self, rows: usize) {
        self.chunk_size = Some(rows);
    }

    /// Insert a rule, replacing any existing rule for the same column.
    pub(crate) fn set_rule(&mut self, rule: ColumnMaskRule) {
        match self.rules.iter_mut().find(|existing| existing.column == rule.column) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    pub(crate) fn remove_rule(&mut self, column: &str) {
        self.rules.retain(|rule| rule.column != column);
    }
}

/// Ordered, validated set of per-table export decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DumpPlan {
    /// Contract version for the plan format.
    plan_version: String,
    /// Seed for deterministic generator output.
    seed: u64,
    /// Backend the plan was resolved against.
    engine: String,
    database: Option<String>,
    tables: Vec<TablePlan>,
}

impl DumpPlan {
    pub(crate) fn new(seed: u64, snapshot: &SchemaSnapshot) -> Self {
        Self {
            plan_version: PLAN_VERSION.to_string(),
            seed,
            engine: snapshot.engine.clone(),
            database: snapshot.database.clone(),
            tables: Vec::new(),
        }
    }

    pub fn plan_version(&self) -> &str {
        &self.plan_version
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn tables(&self) -> &[TablePlan] {
        &self.tables
    }

    pub fn get(&self, table: &str) -> Option<&TablePlan> {
        self.tables.iter().find(|plan| plan.name() == table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(TablePlan::name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Every generator referenced by a rule, in plan order.
    pub fn generator_refs(&self) -> impl Iterator<Item = &GeneratorRef> {
        self.tables
            .iter()
            .flat_map(|plan| plan.rules.iter())
            .filter_map(|rule| match &rule.strategy {
                MaskStrategy::Generator { generator } => Some(generator),
                _ => None,
            })
    }

    /// Insert a table plan, replacing an existing plan for the same table in
    /// place. New tables are appended.
    pub(crate) fn upsert(&mut self, plan: TablePlan) {
        match self
            .tables
            .iter_mut()
            .find(|existing| existing.name() == plan.name())
        {
            Some(existing) => *existing = plan,
            None => self.tables.push(plan),
        }
    }
}
