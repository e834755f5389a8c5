//! Single-gene point mutation over the individual's flat gene enumeration.
//!
//! Gene indices enumerate, per node, one function gene followed by its input
//! genes, and after all nodes the output genes.

use crate::error::EngineResult;
use crate::graph::{Individual, NodeFunction};
use crate::mutate::random_wire;
use rand::Rng;

/// Perform exactly one single-gene edit at a uniformly random gene index.
///
/// # Errors
///
/// Propagates structural-inconsistency errors from wire resolution.
pub fn point_mutation<R: Rng>(individual: &mut Individual, rng: &mut R) -> EngineResult<()> {
    let gene = rng.gen_range(0..individual.genotype_size());
    let node_genes = individual.genotype_size() - individual.outputs.len();

    if gene >= node_genes {
        let index = gene - node_genes;
        let wire = random_wire(individual, individual.nodes.len(), rng)?;
        individual.outputs[index] = wire;
        return Ok(());
    }

    // locate the node and the gene offset within it
    let mut remaining = gene;
    for position in 0..individual.nodes.len() {
        let count = individual.nodes[position].gene_count();
        if remaining < count {
            if remaining == 0 {
                mutate_function_gene(individual, position, rng)?;
            } else {
                let wire = random_wire(individual, position, rng)?;
                individual.nodes[position].inputs[remaining - 1] = wire;
            }
            return Ok(());
        }
        remaining -= count;
    }
    Ok(())
}

/// Redraw a function gene uniformly over all primitive functions and all
/// current modules.
///
/// Original module calls are never mutated away; mutating onto a module
/// produces a replicated call. Switching kind resizes the input list, and
/// downstream references to output slots that no longer exist are reassigned
/// to a random valid slot.
fn mutate_function_gene<R: Rng>(
    individual: &mut Individual,
    position: usize,
    rng: &mut R,
) -> EngineResult<()> {
    let old_function = individual.nodes[position].function;
    if matches!(
        old_function,
        NodeFunction::ModuleCall {
            replicated: false,
            ..
        }
    ) {
        return Ok(());
    }

    let old_outputs = match old_function {
        NodeFunction::Primitive(_) => 1,
        NodeFunction::ModuleCall { id, .. } => individual.library.get(id)?.output_count(),
    };

    let primitive_count = individual.function_set.count();
    let drawn = rng.gen_range(0..primitive_count + individual.library.len());

    let new_outputs = if drawn < primitive_count {
        individual.nodes[position].function = NodeFunction::Primitive(drawn);
        if !old_function.is_primitive() {
            // module arity is at least 2, so the first two inputs exist
            individual.nodes[position].inputs.truncate(2);
        }
        1
    } else {
        let ids = individual.library.ids();
        let id = ids[drawn - primitive_count];
        let module = individual.library.get(id)?;
        let arity = module.input_count;
        let outputs = module.output_count();

        individual.nodes[position].function = NodeFunction::ModuleCall {
            id,
            replicated: true,
        };
        individual.nodes[position].inputs.truncate(arity);
        while individual.nodes[position].inputs.len() < arity {
            let wire = random_wire(individual, position, rng)?;
            individual.nodes[position].inputs.push(wire);
        }
        outputs
    };

    if new_outputs < old_outputs {
        reassign_lost_slots(individual, position, new_outputs, rng);
    }
    // switching kind can resize the input list, and the next point mutation
    // in the same pass draws its gene index from the stored size
    individual.recompute_genotype_size();
    Ok(())
}

/// Reassign every downstream reference to a now-nonexistent output slot of
/// the node at `position` to a random valid slot.
fn reassign_lost_slots<R: Rng>(
    individual: &mut Individual,
    position: usize,
    new_outputs: usize,
    rng: &mut R,
) {
    let address = individual.input_count + position;
    for node in individual.nodes.iter_mut().skip(position + 1) {
        for wire in &mut node.inputs {
            if wire.source == address && wire.slot >= new_outputs {
                wire.slot = rng.gen_range(0..new_outputs);
            }
        }
    }
    for wire in &mut individual.outputs {
        if wire.source == address && wire.slot >= new_outputs {
            wire.slot = rng.gen_range(0..new_outputs);
        }
    }
}
