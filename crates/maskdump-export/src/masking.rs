use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use maskdump_core::Row;
use maskdump_plan::{MaskStrategy, TablePlan};

use crate::errors::{ExportError, Result};
use crate::generators::{Generator, GeneratorRegistry};

enum ColumnAction<'a> {
    PassThrough,
    Generate {
        generator: &'a dyn Generator,
        seed: u64,
    },
    Mask(char),
    Replace(&'a Value),
}

/// Per-table row transformer, one action per column in column order.
pub struct TableMasker<'a> {
    table: &'a str,
    actions: Vec<ColumnAction<'a>>,
    generated: Vec<u64>,
}

impl<'a> TableMasker<'a> {
    /// Resolve every rule of `plan` against `registry`.
    pub fn new(plan: &'a TablePlan, registry: &'a GeneratorRegistry, seed: u64) -> Result<Self> {
        let table_seed = hash_seed(seed, plan.name());
        let mut actions = Vec::with_capacity(plan.table().columns.len());

        for column in &plan.table().columns {
            let action = match plan.strategy_for(&column.name) {
                MaskStrategy::PassThrough => ColumnAction::PassThrough,
                MaskStrategy::Generator { generator } => {
                    let resolved = registry.generator(generator.id()).ok_or_else(|| {
                        ExportError::UnknownGenerator {
                            table: plan.name().to_string(),
                            column: column.name.clone(),
                            generator: generator.id().to_string(),
                        }
                    })?;
                    ColumnAction::Generate {
                        generator: resolved,
                        seed: hash_seed(table_seed, &column.name),
                    }
                }
                MaskStrategy::Mask { character } => ColumnAction::Mask(*character),
                MaskStrategy::Replace { value } => ColumnAction::Replace(value),
            };
            actions.push(action);
        }

        let generated = vec![0; actions.len()];
        Ok(Self {
            table: plan.name(),
            actions,
            generated,
        })
    }

    /// Apply the column actions to one row.
    pub fn apply(&mut self, row_index: u64, row: Row) -> Result<Row> {
        if row.len() != self.actions.len() {
            return Err(ExportError::RowShape {
                table: self.table.to_string(),
                row: row_index,
                expected: self.actions.len(),
                found: row.len(),
            });
        }

        let masked = row
            .into_iter()
            .zip(&self.actions)
            .zip(self.generated.iter_mut())
            .map(|((value, action), generated)| match action {
                ColumnAction::PassThrough => value,
                ColumnAction::Generate { generator, seed } => {
                    *generated += 1;
                    let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(*seed, row_index));
                    generator.generate(&mut rng)
                }
                ColumnAction::Mask(character) => mask_value(&value, *character),
                ColumnAction::Replace(literal) => (*literal).clone(),
            })
            .collect();
        Ok(masked)
    }

    /// Values produced so far per generator id.
    pub fn generator_usage(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.actions
            .iter()
            .zip(&self.generated)
            .filter_map(|(action, count)| match action {
                ColumnAction::Generate { generator, .. } => Some((generator.id(), *count)),
                _ => None,
            })
    }
}

/// Replace each character of the value's text with `character`. `NULL` stays
/// `NULL`; non-string values are masked through their JSON text.
pub fn mask_value(value: &Value, character: char) -> Value {
    let text = match value {
        Value::Null => return Value::Null,
        Value::String(text) => text.chars().count(),
        other => other.to_string().chars().count(),
    };
    Value::String(std::iter::repeat_n(character, text).collect())
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hash_row_seed(column_seed: u64, row_index: u64) -> u64 {
    let hash = column_seed ^ row_index.wrapping_mul(0x9e3779b97f4a7c15);
    hash.wrapping_mul(0x100000001b3)
}
