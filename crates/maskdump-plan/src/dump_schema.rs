use std::fmt;

use maskdump_core::SchemaSnapshot;
use maskdump_introspect::{Adapter, SnapshotLoader};

use crate::definition::TableDefinition;
use crate::errors::{PlanError, Result};
use crate::model::{DumpPlan, TablePlan};

/// Callback that customizes one table. Invoked exactly once per resolution.
pub type TableDefiner = Box<dyn FnOnce(&mut TableDefinition) -> Result<()> + Send>;

/// Declarative description of a dump: a default policy plus ordered per-table
/// overrides.
///
/// Registration does no I/O. Table and column names are checked when the
/// declaration is resolved against a schema snapshot.
pub struct DumpSchema {
    connection: Option<String>,
    include_all_tables: bool,
    seed: u64,
    overrides: Vec<(String, TableDefiner)>,
}

impl DumpSchema {
    /// Default-exclude declaration with seed 0.
    pub fn new() -> Self {
        Self {
            connection: None,
            include_all_tables: false,
            seed: 0,
            overrides: Vec::new(),
        }
    }

    /// Declaration bound to a named connection.
    pub fn for_connection(name: impl Into<String>) -> Self {
        let mut schema = Self::new();
        schema.connection = Some(name.into());
        schema
    }

    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Export every table that has no override as a full dump.
    pub fn include_all_tables(mut self) -> Self {
        self.include_all_tables = true;
        self
    }

    /// Seed for deterministic generator output.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Register a customization for `table`.
    ///
    /// Registering the same table again replaces the earlier callback and
    /// keeps its position.
    pub fn define_table<F>(mut self, table: impl Into<String>, definer: F) -> Self
    where
        F: FnOnce(&mut TableDefinition) -> Result<()> + Send + 'static,
    {
        let table = table.into();
        let definer: TableDefiner = Box::new(definer);
        match self.overrides.iter_mut().find(|(name, _)| *name == table) {
            Some(existing) => existing.1 = definer,
            None => self.overrides.push((table, definer)),
        }
        self
    }

    /// Export `table` as structure only.
    pub fn schema_only_table(self, table: impl Into<String>) -> Self {
        self.define_table(table, |definition| {
            definition.set_schema_only();
            Ok(())
        })
    }

    /// Overridden tables in registration order.
    pub fn registered_tables(&self) -> impl Iterator<Item = &str> {
        self.overrides.iter().map(|(name, _)| name.as_str())
    }

    /// Resolve the declaration against a loaded snapshot.
    ///
    /// Any failure aborts resolution; no partial plan is returned.
    pub fn resolve(self, snapshot: &SchemaSnapshot) -> Result<DumpPlan> {
        let mut plan = DumpPlan::new(self.seed, snapshot);

        if self.include_all_tables {
            for table in &snapshot.tables {
                plan.upsert(TablePlan::new(table.clone()));
            }
        }

        let overrides = self.overrides.len();
        for (name, definer) in self.overrides {
            let table = snapshot
                .table(&name)
                .ok_or_else(|| PlanError::UnknownTable {
                    table: name.clone(),
                })?;

            let mut definition = TableDefinition::new(table.clone());
            definer(&mut definition)?;
            plan.upsert(definition.into_plan());
        }

        tracing::info!(
            event = "plan_resolved",
            connection = self.connection.as_deref().unwrap_or("default"),
            engine = %plan.engine(),
            include_all_tables = self.include_all_tables,
            overrides,
            tables = plan.len()
        );

        Ok(plan)
    }

    /// Load the snapshot through `loader` (at most one introspection pass) and
    /// resolve against it.
    pub async fn load<A>(self, loader: &mut SnapshotLoader<'_, A>) -> Result<DumpPlan>
    where
        A: Adapter + ?Sized,
    {
        let snapshot = loader.load().await?;
        self.resolve(snapshot)
    }
}

impl Default for DumpSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DumpSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpSchema")
            .field("connection", &self.connection)
            .field("include_all_tables", &self.include_all_tables)
            .field("seed", &self.seed)
            .field(
                "overrides",
                &self.registered_tables().collect::<Vec<_>>(),
            )
            .finish()
    }
}
