use std::collections::BTreeMap;
use std::fmt;

use rand::RngCore;
use serde_json::Value;

pub mod faker;

/// Named synthetic value source.
///
/// Implementations must be side-effect free: the same RNG state yields the
/// same value.
pub trait Generator: Send + Sync {
    fn id(&self) -> &'static str;

    fn generate(&self, rng: &mut dyn RngCore) -> Value;
}

/// Generators addressable by id.
pub struct GeneratorRegistry {
    generators: BTreeMap<&'static str, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    /// Registry with no generators.
    pub fn empty() -> Self {
        Self {
            generators: BTreeMap::new(),
        }
    }

    /// Registry with the built-in faker generators.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        faker::register(&mut registry);
        registry
    }

    /// Add a generator, replacing any generator with the same id.
    pub fn register_generator(&mut self, generator: Box<dyn Generator>) {
        self.generators.insert(generator.id(), generator);
    }

    pub fn generator(&self, id: &str) -> Option<&dyn Generator> {
        self.generators.get(id).map(|generator| generator.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.generators.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.generators.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.generators.keys()).finish()
    }
}
