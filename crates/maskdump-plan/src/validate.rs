use std::collections::HashSet;

use jsonschema::JSONSchema;
use serde_json::Value;

use maskdump_core::SchemaSnapshot;

use crate::errors::{PlanError, Result};
use crate::model::{DumpPlan, PLAN_VERSION};
use crate::schema::plan_json_schema;

/// Validate a plan JSON document against the plan JSON Schema.
///
/// Every violation is reported, one per line, prefixed by its JSON pointer.
pub fn validate_plan_json(plan_json: &Value) -> Result<()> {
    let schema = serde_json::to_value(plan_json_schema())?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    if let Err(errors) = compiled.validate(plan_json) {
        let issues: Vec<String> = errors
            .map(|error| {
                format!(
                    "{}: {}",
                    normalized_json_pointer(&error.instance_path.to_string()),
                    error
                )
            })
            .collect();
        return Err(PlanError::Schema(issues.join("\n")));
    }

    Ok(())
}

/// Parse a stored `plan.json`, checking structure and format version.
///
/// A table may appear once, and a column may carry at most one rule.
pub fn parse_plan(plan_json: &Value) -> Result<DumpPlan> {
    validate_plan_json(plan_json)?;
    let plan: DumpPlan = serde_json::from_value(plan_json.clone())?;
    if plan.plan_version() != PLAN_VERSION {
        return Err(PlanError::Schema(format!(
            "/plan_version: expected '{PLAN_VERSION}', found '{}'",
            plan.plan_version()
        )));
    }
    check_unique_entries(&plan)?;
    Ok(plan)
}

fn check_unique_entries(plan: &DumpPlan) -> Result<()> {
    let mut tables = HashSet::new();
    for table_plan in plan.tables() {
        if !tables.insert(table_plan.name()) {
            return Err(PlanError::InvalidDefinition(format!(
                "table '{}' appears more than once in the plan",
                table_plan.name()
            )));
        }

        let mut columns = HashSet::new();
        for rule in table_plan.rules() {
            if !columns.insert(rule.column.as_str()) {
                return Err(PlanError::InvalidDefinition(format!(
                    "column '{}.{}' has more than one rule",
                    table_plan.name(),
                    rule.column
                )));
            }
        }
    }
    Ok(())
}

/// Check that a stored plan still matches the live schema.
///
/// Tables and rule columns must exist, and each table's recorded structure
/// must equal the live one.
pub fn validate_plan_against_snapshot(plan: &DumpPlan, snapshot: &SchemaSnapshot) -> Result<()> {
    if plan.engine() != snapshot.engine {
        return Err(PlanError::SchemaDrift(format!(
            "plan engine '{}' does not match schema engine '{}'",
            plan.engine(),
            snapshot.engine
        )));
    }

    for table_plan in plan.tables() {
        let live = snapshot
            .table(table_plan.name())
            .ok_or_else(|| PlanError::UnknownTable {
                table: table_plan.name().to_string(),
            })?;

        for rule in table_plan.rules() {
            if !live.has_column(&rule.column) {
                return Err(PlanError::UnknownColumn {
                    table: table_plan.name().to_string(),
                    column: rule.column.clone(),
                });
            }
        }

        if live != table_plan.table() {
            return Err(PlanError::SchemaDrift(format!(
                "structure of table '{}' changed since the plan was resolved",
                table_plan.name()
            )));
        }
    }

    Ok(())
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reports_pointer_of_schema_violation() {
        let err = validate_plan_json(&json!({
            "plan_version": "0.1",
            "seed": "not-a-number",
            "engine": "sqlite",
            "database": null,
            "tables": []
        }))
        .unwrap_err();

        match err {
            PlanError::Schema(message) => assert!(message.contains("/seed"), "{message}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn users_entry(rules: Value) -> Value {
        json!({
            "table": {
                "name": "users",
                "columns": [
                    { "ordinal_position": 1, "name": "id", "data_type": "integer", "is_nullable": false },
                    { "ordinal_position": 2, "name": "email", "data_type": "text", "is_nullable": false }
                ]
            },
            "mode": "full",
            "rules": rules
        })
    }

    fn plan_with(tables: Vec<Value>) -> Value {
        json!({
            "plan_version": PLAN_VERSION,
            "seed": 0,
            "engine": "sqlite",
            "database": null,
            "tables": tables
        })
    }

    #[test]
    fn accepts_unique_entries() {
        let rules = json!([{ "column": "email", "strategy": "mask", "character": "x" }]);
        let plan = parse_plan(&plan_with(vec![users_entry(rules)])).unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn rejects_duplicate_table_entries() {
        let err = parse_plan(&plan_with(vec![
            users_entry(json!([])),
            users_entry(json!([])),
        ]))
        .unwrap_err();
        match err {
            PlanError::InvalidDefinition(message) => assert!(message.contains("'users'"), "{message}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_two_rules_on_one_column() {
        let rules = json!([
            { "column": "email", "strategy": "generator", "generator": "internet.safe_email" },
            { "column": "email", "strategy": "mask", "character": "x" }
        ]);
        let err = parse_plan(&plan_with(vec![users_entry(rules)])).unwrap_err();
        match err {
            PlanError::InvalidDefinition(message) => {
                assert!(message.contains("users.email"), "{message}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_foreign_plan_version() {
        let err = parse_plan(&json!({
            "plan_version": "9.9",
            "seed": 0,
            "engine": "sqlite",
            "database": null,
            "tables": []
        }))
        .unwrap_err();
        assert!(matches!(err, PlanError::Schema(_)));
    }
}
