//! Genotype data model: nodes, modules, the module library and the individual.
//!
//! Graphs are arenas of nodes addressed by position rather than linked
//! objects. Per individual the address space is `[0, input_count)` for the
//! external inputs and `[input_count, input_count + node_count)` for genotype
//! nodes; output wiring is a separate, non-addressable list. The same
//! convention, rescaled, applies inside each module.
//!
//! All types are plain owned data: `Clone` is a deep copy with zero aliasing,
//! so mutating a copy can never affect the original.

mod individual;
mod module;
mod node;

pub use individual::Individual;
pub(crate) use individual::random_source;
pub use module::{Module, ModuleLibrary};
pub use node::{Node, NodeFunction, Wire};
