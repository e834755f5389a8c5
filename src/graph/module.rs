//! Reusable modules and the per-individual module library.

use crate::error::{EngineError, EngineResult};
use crate::graph::node::{Node, Wire};
use serde::{Deserialize, Serialize};

/// A self-contained DAG of primitive-only nodes with declared input arity and
/// a non-empty ordered output list.
///
/// Module-local addresses follow the individual's convention rescaled:
/// `[0, input_count)` are the module inputs, `[input_count, input_count +
/// nodes.len())` the body nodes. Outputs must reference body nodes, never
/// inputs. Modules never nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Identifier, unique within the owning library.
    pub id: usize,
    /// Declared input arity, within `[2, 2 * nodes.len()]`.
    pub input_count: usize,
    /// Ordered declared outputs, each wired to a body node. Never empty.
    pub outputs: Vec<Wire>,
    /// Body nodes, primitive-only, addressed locally.
    pub nodes: Vec<Node>,
}

impl Module {
    /// Number of declared outputs.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

/// The module collection owned by exactly one individual.
///
/// Ids are allocated lowest-unused-first and never reused while referenced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLibrary {
    modules: Vec<Module>,
}

impl ModuleLibrary {
    /// An empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of modules currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the library holds no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The smallest non-negative id not currently in use.
    #[must_use]
    pub fn first_unused_id(&self) -> usize {
        let mut id = 0;
        while self.modules.iter().any(|m| m.id == id) {
            id += 1;
        }
        id
    }

    /// Look up a module by id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownModule`] if no module has this id.
    pub fn get(&self, id: usize) -> EngineResult<&Module> {
        self.modules
            .iter()
            .find(|m| m.id == id)
            .ok_or(EngineError::UnknownModule(id))
    }

    /// Look up a module by id for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownModule`] if no module has this id.
    pub fn get_mut(&mut self, id: usize) -> EngineResult<&mut Module> {
        self.modules
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(EngineError::UnknownModule(id))
    }

    /// Add a module to the library.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateModule`] if the id is already in use.
    pub fn add(&mut self, module: Module) -> EngineResult<()> {
        if self.modules.iter().any(|m| m.id == module.id) {
            return Err(EngineError::DuplicateModule(module.id));
        }
        self.modules.push(module);
        Ok(())
    }

    /// Remove the module with this id. No-op if absent.
    pub fn remove(&mut self, id: usize) {
        self.modules.retain(|m| m.id != id);
    }

    /// Iterate over the modules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Ids of all modules, in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<usize> {
        self.modules.iter().map(|m| m.id).collect()
    }
}
