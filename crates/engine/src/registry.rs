//! Section registry: maps a section id to its generator.
//!
//! Generators are pure functions of the [`Context`]. They never get a
//! database handle or a clock; anything live must already be resolved into
//! the context by the caller.

use promptward_core::{Context, EngineError, SectionId, SectionOutput};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A section generator.
pub type Generator = Arc<dyn Fn(&Context) -> SectionOutput + Send + Sync>;

/// Registry of section generators.
#[derive(Clone, Default)]
pub struct SectionRegistry {
    generators: HashMap<SectionId, Generator>,
}

impl std::fmt::Debug for SectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionRegistry")
            .field("sections", &self.list_registered())
            .finish()
    }
}

impl SectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator. Fails if `id` already has one.
    pub fn register<F>(&mut self, id: SectionId, generator: F) -> Result<(), EngineError>
    where
        F: Fn(&Context) -> SectionOutput + Send + Sync + 'static,
    {
        if self.generators.contains_key(&id) {
            return Err(EngineError::DuplicateSection(id));
        }
        self.generators.insert(id, Arc::new(generator));
        Ok(())
    }

    /// Register or replace a generator, returning whether one was replaced.
    pub fn replace<F>(&mut self, id: SectionId, generator: F) -> bool
    where
        F: Fn(&Context) -> SectionOutput + Send + Sync + 'static,
    {
        self.generators.insert(id, Arc::new(generator)).is_some()
    }

    /// Run the generator for `id` and return its output unchanged.
    ///
    /// The output must carry `id`; a generator that emits another section is
    /// rejected so policy gating always applies to what is rendered.
    pub fn generate(&self, id: SectionId, context: &Context) -> Result<SectionOutput, EngineError> {
        let generator = self
            .generators
            .get(&id)
            .ok_or(EngineError::UnregisteredSection(id))?;
        let output = generator(context);
        if output.id() != id {
            return Err(EngineError::MislabelledSection {
                expected: id,
                produced: output.id(),
            });
        }
        Ok(output)
    }

    /// Registered ids in declaration order.
    pub fn list_registered(&self) -> BTreeSet<SectionId> {
        self.generators.keys().copied().collect()
    }

    pub fn contains(&self, id: SectionId) -> bool {
        self.generators.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}
