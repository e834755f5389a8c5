//! The mutation pipeline: point mutation, compression, expansion, module
//! mutation and library garbage collection.
//!
//! Each pipeline step edits a graph whose nodes reference shared,
//! variable-arity modules and must keep every address valid: operators remap
//! all affected addresses immediately and never leave a dangling reference to
//! be caught later. A pipeline pass invalidates the used-nodes cache and
//! recomputes the genotype size; fitness is untouched because offspring start
//! unscored.

mod compress;
mod expand;
mod module;
mod point;

pub use compress::compress;
pub use expand::expand;
pub use module::mutate_modules;
pub use point::point_mutation;

use crate::error::EngineResult;
use crate::graph::{Individual, NodeFunction, Wire, random_source};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration for the mutation pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Point mutations per pass are `round(mutation_rate * genotype_size)`.
    pub mutation_rate: f64,
    /// Probability of one compression attempt; expansion runs at twice this.
    pub p_compress: f64,
    /// Per-module probability of one module-local point mutation.
    pub p_module_point: f64,
    /// Per-module probability of adding an input; removal runs at twice this.
    pub p_add_input: f64,
    /// Per-module probability of adding an output; removal runs at twice this.
    pub p_add_output: f64,
    /// Library size cap for the compressor; `None` is unbounded.
    pub max_modules: Option<usize>,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.06,
            p_compress: 0.2,
            p_module_point: 0.5,
            p_add_input: 0.05,
            p_add_output: 0.02,
            max_modules: None,
        }
    }
}

/// Run one full mutation pass over an offspring.
///
/// # Errors
///
/// Propagates structural-inconsistency errors, which indicate an operator bug.
pub fn mutate<R: Rng>(
    individual: &mut Individual,
    config: &MutationConfig,
    rng: &mut R,
) -> EngineResult<()> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[allow(clippy::cast_precision_loss)]
    let mutations = (config.mutation_rate * individual.genotype_size() as f64).round() as usize;
    for _ in 0..mutations {
        point_mutation(individual, rng)?;
    }

    if rng.gen_bool(config.p_compress.clamp(0.0, 1.0)) {
        compress(individual, config.max_modules, rng)?;
    }
    if rng.gen_bool((config.p_compress * 2.0).clamp(0.0, 1.0)) {
        expand(individual, rng)?;
    }

    mutate_modules(individual, config, rng)?;

    collect_garbage(individual);
    individual.recompute_genotype_size();
    individual.invalidate_used_nodes();
    Ok(())
}

/// Delete every module referenced by zero nodes.
pub fn collect_garbage(individual: &mut Individual) {
    let referenced = individual.referenced_module_ids();
    for id in individual.library.ids() {
        if !referenced.contains(&id) {
            individual.library.remove(id);
        }
    }
}

/// Draw a complete `(address, slot)` wire for a node at `position` (or for an
/// output gene, with `position` = node count).
///
/// The address follows the levels-back policy; the slot is 0 when the source
/// is an input or primitive node, otherwise a uniformly random valid output
/// slot of the resolved module.
pub(crate) fn random_wire<R: Rng>(
    individual: &Individual,
    position: usize,
    rng: &mut R,
) -> EngineResult<Wire> {
    let source = random_source(
        rng,
        individual.input_count,
        position,
        individual.levels_back,
    );
    let slot = if source < individual.input_count {
        0
    } else {
        match individual.nodes[source - individual.input_count].function {
            NodeFunction::Primitive(_) => 0,
            NodeFunction::ModuleCall { id, .. } => {
                rng.gen_range(0..individual.library.get(id)?.output_count())
            }
        }
    };
    Ok(Wire { source, slot })
}
