use serde_json::Value;

use maskdump_core::TableDescriptor;

use crate::errors::{PlanError, Result};
use crate::model::{ColumnMaskRule, GeneratorRef, InclusionMode, MaskStrategy, TablePlan};

/// Default character used by [`TableDefinition::mask_with_character`] callers
/// that do not pick one.
pub const DEFAULT_MASK_CHARACTER: char = 'x';

/// Builder bound to one table, handed to table definers during resolution.
///
/// Column names are checked against the live table as soon as a rule is
/// registered, so a typo fails before any row is read. Re-registering a column
/// replaces its rule; mode calls follow last-call-wins.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    plan: TablePlan,
}

impl TableDefinition {
    pub fn new(table: TableDescriptor) -> Self {
        Self {
            plan: TablePlan::new(table),
        }
    }

    pub fn table(&self) -> &TableDescriptor {
        self.plan.table()
    }

    /// Export the structure only.
    pub fn set_schema_only(&mut self) -> &mut Self {
        self.plan.set_mode(InclusionMode::SchemaOnly);
        self
    }

    /// Export structure and rows (the default).
    pub fn set_full_dump(&mut self) -> &mut Self {
        self.plan.set_mode(InclusionMode::Full);
        self
    }

    /// Replace `column` with values from the named generator.
    pub fn mask_column(
        &mut self,
        column: &str,
        generator: impl Into<GeneratorRef>,
    ) -> Result<&mut Self> {
        self.register(
            column,
            MaskStrategy::Generator {
                generator: generator.into(),
            },
        )
    }

    /// Replace every character of `column` with `character`.
    pub fn mask_with_character(&mut self, column: &str, character: char) -> Result<&mut Self> {
        self.register(column, MaskStrategy::Mask { character })
    }

    /// Replace `column` with a constant.
    pub fn replace_column(&mut self, column: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.register(
            column,
            MaskStrategy::Replace {
                value: value.into(),
            },
        )
    }

    /// Drop any rule on `column` so its real value is exported.
    pub fn pass_through_column(&mut self, column: &str) -> Result<&mut Self> {
        self.check_column(column)?;
        self.plan.remove_rule(column);
        Ok(self)
    }

    /// Hand rows to the sink in batches of `rows`.
    pub fn output_in_chunks_of(&mut self, rows: usize) -> Result<&mut Self> {
        if rows == 0 {
            return Err(PlanError::InvalidDefinition(format!(
                "chunk size for table {} must be greater than zero",
                self.plan.name()
            )));
        }
        self.plan.set_chunk_size(rows);
        Ok(self)
    }

    pub fn plan(&self) -> &TablePlan {
        &self.plan
    }

    pub fn into_plan(self) -> TablePlan {
        self.plan
    }

    fn check_column(&self, column: &str) -> Result<()> {
        if !self.plan.table().has_column(column) {
            return Err(PlanError::UnknownColumn {
                table: self.plan.name().to_string(),
                column: column.to_string(),
            });
        }
        Ok(())
    }

    fn register(&mut self, column: &str, strategy: MaskStrategy) -> Result<&mut Self> {
        self.check_column(column)?;
        self.plan.set_rule(ColumnMaskRule {
            column: column.to_string(),
            strategy,
        });
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use maskdump_core::ColumnDescriptor;
    use serde_json::json;

    use super::*;

    fn users() -> TableDescriptor {
        TableDescriptor::new(
            "users",
            vec![
                ColumnDescriptor::new(1, "id", "integer", false),
                ColumnDescriptor::new(2, "email", "text", false),
                ColumnDescriptor::new(3, "name", "text", true),
            ],
        )
    }

    #[test]
    fn unknown_column_is_rejected_eagerly() {
        let mut definition = TableDefinition::new(users());
        let err = definition
            .mask_column("phone", "phone_number.phone_number")
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::UnknownColumn { ref table, ref column } if table == "users" && column == "phone"
        ));
        assert!(definition.plan().rules().is_empty());
    }

    #[test]
    fn later_rule_overwrites_earlier_one() {
        let mut definition = TableDefinition::new(users());
        definition
            .mask_column("email", "internet.free_email")
            .unwrap()
            .mask_column("email", "internet.safe_email")
            .unwrap();

        let plan = definition.into_plan();
        assert_eq!(plan.rules().len(), 1);
        assert_eq!(
            plan.strategy_for("email"),
            &MaskStrategy::Generator {
                generator: GeneratorRef::new("internet.safe_email")
            }
        );
    }

    #[test]
    fn overwrite_keeps_rule_position() {
        let mut definition = TableDefinition::new(users());
        definition.mask_with_character("name", DEFAULT_MASK_CHARACTER).unwrap();
        definition.mask_column("email", "internet.safe_email").unwrap();
        definition.replace_column("name", json!("redacted")).unwrap();

        let columns: Vec<&str> = definition
            .plan()
            .rules()
            .iter()
            .map(|rule| rule.column.as_str())
            .collect();
        assert_eq!(columns, vec!["name", "email"]);
    }

    #[test]
    fn schema_only_is_idempotent() {
        let mut once = TableDefinition::new(users());
        once.set_schema_only();
        let mut twice = TableDefinition::new(users());
        twice.set_schema_only().set_schema_only();

        assert_eq!(once.into_plan(), twice.into_plan());
    }

    #[test]
    fn last_mode_call_wins() {
        let mut definition = TableDefinition::new(users());
        definition.set_schema_only().set_full_dump();
        assert_eq!(definition.plan().mode(), InclusionMode::Full);

        definition.set_schema_only();
        assert_eq!(definition.plan().mode(), InclusionMode::SchemaOnly);
    }

    #[test]
    fn unmasked_columns_pass_through() {
        let definition = TableDefinition::new(users());
        assert_eq!(definition.plan().strategy_for("id"), &MaskStrategy::PassThrough);
    }

    #[test]
    fn pass_through_drops_existing_rule() {
        let mut definition = TableDefinition::new(users());
        definition
            .mask_column("email", "internet.safe_email")
            .unwrap()
            .mask_with_character("name", 'x')
            .unwrap()
            .pass_through_column("email")
            .unwrap();

        let plan = definition.into_plan();
        assert!(plan.rule("email").is_none());
        assert_eq!(plan.rules().len(), 1);
        assert_eq!(plan.strategy_for("email"), &MaskStrategy::PassThrough);
    }

    #[test]
    fn pass_through_checks_column() {
        let mut definition = TableDefinition::new(users());
        assert!(matches!(
            definition.pass_through_column("phone"),
            Err(PlanError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn zero_chunk_size_is_invalid() {
        let mut definition = TableDefinition::new(users());
        assert!(matches!(
            definition.output_in_chunks_of(0),
            Err(PlanError::InvalidDefinition(_))
        ));
        definition.output_in_chunks_of(250).unwrap();
        assert_eq!(definition.plan().chunk_size(), Some(250));
    }
}
