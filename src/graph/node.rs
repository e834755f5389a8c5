//! A single computation node and its input wiring.

use serde::{Deserialize, Serialize};

/// One resolved input or output connection: which address feeds it, and which
/// output slot of that source is taken.
///
/// Sources below the enclosing graph's input count are external inputs and
/// always carry slot 0; primitive nodes also expose only slot 0. Module calls
/// expose one slot per declared module output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    /// Address of the source (input or strict-predecessor node).
    pub source: usize,
    /// Output slot taken from the source.
    pub slot: usize,
}

impl Wire {
    /// Wire to slot 0 of `source`.
    #[must_use]
    pub fn to(source: usize) -> Self {
        Self { source, slot: 0 }
    }
}

/// The function gene of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeFunction {
    /// A primitive function from the run's function set.
    Primitive(usize),
    /// A call into the individual's module library.
    ModuleCall {
        /// Library id of the called module.
        id: usize,
        /// Whether this call was created by function-gene mutation
        /// (replicated) rather than by compression (original). Only original
        /// calls are candidates for expansion, and only replicated calls may
        /// have their function gene mutated away.
        replicated: bool,
    },
}

impl NodeFunction {
    /// Library id if this is a module call.
    #[must_use]
    pub fn module_id(self) -> Option<usize> {
        match self {
            Self::Primitive(_) => None,
            Self::ModuleCall { id, .. } => Some(id),
        }
    }

    /// Whether this is a primitive function gene.
    #[must_use]
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::Primitive(_))
    }
}

/// One computation unit of a genotype or module body.
///
/// Primitive nodes carry exactly two inputs; module calls carry as many
/// inputs as the called module declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// The function gene.
    pub function: NodeFunction,
    /// Ordered input wires, each a strict predecessor of this node's address.
    pub inputs: Vec<Wire>,
}

impl Node {
    /// A primitive node computing function `id` over two sources.
    #[must_use]
    pub fn primitive(id: usize, a: Wire, b: Wire) -> Self {
        Self {
            function: NodeFunction::Primitive(id),
            inputs: vec![a, b],
        }
    }

    /// Gene count of this node: one function gene plus one per input.
    #[must_use]
    pub fn gene_count(&self) -> usize {
        1 + self.inputs.len()
    }
}
