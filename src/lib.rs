// Allow unwrap and exact float comparison in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::float_cmp))]
//! An embedded Cartesian Genetic Programming engine.
//!
//! Individuals are feed-forward graphs over a primitive function registry,
//! extended with a per-individual library of compressed modules: reusable
//! subgraphs extracted from the genotype and re-inlined by later mutations.
//! Every structural operator keeps integer addressing valid across graph
//! surgery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Runner (tries, stats)        │
//! ├─────────────────────────────────────┤
//! │   (mu+lambda) Evolution Driver      │
//! ├─────────────────────────────────────┤
//! │  Mutation Pipeline │ Fitness (par)  │
//! ├─────────────────────────────────────┤
//! │  Genotype Graph + Module Library    │
//! └─────────────────────────────────────┘
//! ```

pub mod dataset;
pub mod error;
pub mod eval;
pub mod evolve;
pub mod fitness;
pub mod functions;
pub mod graph;
pub mod mutate;
pub mod persist;
pub mod select;
pub mod stats;

pub use error::{EngineError, EngineResult};
pub use functions::FunctionSet;

// Re-export the core data model at the crate root for convenience
pub use graph::{Individual, Module, ModuleLibrary, Node, NodeFunction, Wire};
