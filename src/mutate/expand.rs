//! Expansion: inline an original module call back into the node list.

use crate::error::EngineResult;
use crate::graph::{Individual, NodeFunction, Wire};
use rand::Rng;

/// Attempt one expansion: pick a uniformly random original module call and
/// splice its body back into the node list in place of the call.
///
/// Replicated calls are never expanded. No-op when the individual holds no
/// original call. The inlined body's input references are rewritten through
/// the call-site wires, later references to the call are redirected through
/// the module's output table, and later addresses shift up by the body length
/// minus one. The library entry is left for garbage collection.
///
/// # Errors
///
/// Fails if the chosen call references a module id absent from the library,
/// which indicates an operator bug.
pub fn expand<R: Rng>(individual: &mut Individual, rng: &mut R) -> EngineResult<()> {
    let candidates: Vec<usize> = individual
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(position, node)| {
            matches!(
                node.function,
                NodeFunction::ModuleCall {
                    replicated: false,
                    ..
                }
            )
            .then_some(position)
        })
        .collect();
    if candidates.is_empty() {
        return Ok(());
    }
    let position = candidates[rng.gen_range(0..candidates.len())];
    inline(individual, position)
}

/// Inline the original call at `position`.
fn inline(individual: &mut Individual, position: usize) -> EngineResult<()> {
    let Some(id) = individual.nodes[position].function.module_id() else {
        return Ok(());
    };
    let module = individual.library.get(id)?.clone();
    let call_inputs = individual.nodes[position].inputs.clone();
    let call_address = individual.input_count + position;
    let shift = module.nodes.len() - 1;

    // renumber the body into the individual's address space, routing module
    // input references through the call-site wires
    let mut body = module.nodes;
    for node in &mut body {
        for wire in &mut node.inputs {
            if wire.source < module.input_count {
                *wire = call_inputs[wire.source];
            } else {
                wire.source = wire.source - module.input_count + call_address;
                wire.slot = 0;
            }
        }
    }
    let body_len = body.len();
    individual.nodes.splice(position..=position, body);

    // redirect later references: a wire onto the vanished call resolves its
    // slot through the module's output table, anything past it shifts up
    let redirect = |wire: &mut Wire| {
        if wire.source == call_address {
            let routed = module.outputs[wire.slot];
            wire.source = routed.source - module.input_count + call_address;
            wire.slot = 0;
        } else if wire.source > call_address {
            wire.source += shift;
        }
    };
    for node in individual.nodes.iter_mut().skip(position + body_len) {
        for wire in &mut node.inputs {
            redirect(wire);
        }
    }
    for wire in &mut individual.outputs {
        redirect(wire);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::evaluate;
    use crate::functions::FunctionSet;
    use crate::mutate::{collect_garbage, compress};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_expand_is_inverse_of_compress_behavior() {
        let mut rng = SmallRng::seed_from_u64(41);
        for _ in 0..50 {
            let individual =
                Individual::random(&mut rng, 15, 3, 2, FunctionSet::Arithmetic, 5, None);
            let mut transformed = individual.offspring();
            compress(&mut transformed, None, &mut rng).unwrap();
            expand(&mut transformed, &mut rng).unwrap();
            collect_garbage(&mut transformed);
            transformed.invalidate_used_nodes();
            transformed.recompute_genotype_size();

            let input = [0.25, 4.0, -1.0];
            let mut original = individual.offspring();
            let before = evaluate(&mut original, &input).unwrap();
            let after = evaluate(&mut transformed, &input).unwrap();
            assert_eq!(before, after);
        }
    }

    #[test]
    fn test_expand_restores_node_count() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut individual =
            Individual::random(&mut rng, 20, 3, 1, FunctionSet::Arithmetic, 5, None);
        while individual.library.is_empty() {
            compress(&mut individual, None, &mut rng).unwrap();
        }
        expand(&mut individual, &mut rng).unwrap();
        collect_garbage(&mut individual);
        assert_eq!(individual.nodes.len(), 20);
        assert!(individual.library.is_empty());
        assert!(individual.nodes.iter().all(|n| n.function.is_primitive()));
    }

    #[test]
    fn test_expand_without_original_calls_is_noop() {
        let mut rng = SmallRng::seed_from_u64(43);
        let mut individual =
            Individual::random(&mut rng, 10, 2, 1, FunctionSet::Boolean, 4, None);
        let snapshot = individual.offspring();
        expand(&mut individual, &mut rng).unwrap();
        assert_eq!(individual.nodes, snapshot.nodes);
        assert_eq!(individual.outputs, snapshot.outputs);
    }
}
