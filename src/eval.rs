//! Forward evaluation and backward reachability over genotype graphs.
//!
//! Because every input address is a strict predecessor of its node, one
//! descending sweep computes reachability and one ascending sweep computes
//! outputs; no fixpoint iteration is needed. The individual's used-nodes mask
//! is memoized write-once until a structural mutation invalidates it.

use crate::error::{EngineError, EngineResult};
use crate::graph::{Individual, Module, NodeFunction};

/// Compute the individual's output vector for one input vector.
///
/// Only nodes marked used are computed. Primitive nodes invoke the function
/// registry on their two resolved inputs; module calls recursively evaluate
/// their library entry, producing that module's declared output arity.
///
/// # Errors
///
/// Fails if the input length disagrees with the declared input count, or if a
/// node references a module id absent from the library.
pub fn evaluate(individual: &mut Individual, input: &[f64]) -> EngineResult<Vec<f64>> {
    if input.len() != individual.input_count {
        return Err(EngineError::InputArity {
            expected: individual.input_count,
            actual: input.len(),
        });
    }
    ensure_used_nodes(individual)?;

    let used = individual.used_nodes()?.to_vec();
    let mut results: Vec<Option<Vec<f64>>> = vec![None; individual.nodes.len()];

    for position in 0..individual.nodes.len() {
        if !used[position] {
            continue;
        }
        let node = &individual.nodes[position];
        let mut operands = Vec::with_capacity(node.inputs.len());
        for wire in &node.inputs {
            operands.push(resolve(individual, &results, input, wire.source, wire.slot)?);
        }
        let outputs = match node.function {
            NodeFunction::Primitive(id) => {
                vec![individual.function_set.apply(id, operands[0], operands[1])]
            }
            NodeFunction::ModuleCall { id, .. } => {
                let module = individual.library.get(id)?;
                evaluate_module(module, &operands, individual)?
            }
        };
        results[position] = Some(outputs);
    }

    let mut output_vector = Vec::with_capacity(individual.outputs.len());
    for wire in &individual.outputs {
        output_vector.push(resolve(individual, &results, input, wire.source, wire.slot)?);
    }
    Ok(output_vector)
}

/// Resolve one source address to a value: a raw input component below the
/// input count, otherwise the cached result of the addressed node.
fn resolve(
    individual: &Individual,
    results: &[Option<Vec<f64>>],
    input: &[f64],
    source: usize,
    slot: usize,
) -> EngineResult<f64> {
    if source < individual.input_count {
        return Ok(input[source]);
    }
    let position = source - individual.input_count;
    let outputs = results
        .get(position)
        .and_then(Option::as_ref)
        .ok_or(EngineError::AddressOutOfRange {
            address: source,
            limit: individual.address_limit(),
        })?;
    outputs
        .get(slot)
        .copied()
        .ok_or(EngineError::AddressOutOfRange {
            address: slot,
            limit: outputs.len(),
        })
}

/// Evaluate a module body over its resolved inputs, yielding the declared
/// output arity.
///
/// # Errors
///
/// Fails if the input length disagrees with the module's declared arity or an
/// output slot is out of range.
pub fn evaluate_module(
    module: &Module,
    inputs: &[f64],
    individual: &Individual,
) -> EngineResult<Vec<f64>> {
    if inputs.len() != module.input_count {
        return Err(EngineError::InputArity {
            expected: module.input_count,
            actual: inputs.len(),
        });
    }
    let used = module_used_nodes(module);
    let mut results: Vec<Option<f64>> = vec![None; module.nodes.len()];

    for position in 0..module.nodes.len() {
        if !used[position] {
            continue;
        }
        let node = &module.nodes[position];
        let mut operands = [0.0f64; 2];
        for (operand, wire) in operands.iter_mut().zip(&node.inputs) {
            *operand = if wire.source < module.input_count {
                inputs[wire.source]
            } else {
                results[wire.source - module.input_count].ok_or(
                    EngineError::AddressOutOfRange {
                        address: wire.source,
                        limit: module.input_count + position,
                    },
                )?
            };
        }
        let NodeFunction::Primitive(id) = node.function else {
            // module bodies are primitive-only by construction
            return Err(EngineError::Config(
                "module body contains a nested module call".into(),
            ));
        };
        results[position] = Some(individual.function_set.apply(id, operands[0], operands[1]));
    }

    let mut outputs = Vec::with_capacity(module.outputs.len());
    for wire in &module.outputs {
        if wire.source < module.input_count {
            return Err(EngineError::AddressOutOfRange {
                address: wire.source,
                limit: module.input_count,
            });
        }
        outputs.push(
            results[wire.source - module.input_count].ok_or(EngineError::AddressOutOfRange {
                address: wire.source,
                limit: module.input_count + module.nodes.len(),
            })?,
        );
    }
    Ok(outputs)
}

/// Compute and memoize the used-nodes mask if not already present.
///
/// # Errors
///
/// Propagates write-once violations, which indicate an operator bug.
pub fn ensure_used_nodes(individual: &mut Individual) -> EngineResult<()> {
    if individual.has_used_nodes() {
        return Ok(());
    }
    let mask = compute_used_nodes(individual);
    individual.set_used_nodes(mask)
}

/// Backward reachability from the declared outputs: a single descending
/// sweep, marking a node used when anything already-used references it.
#[must_use]
pub fn compute_used_nodes(individual: &Individual) -> Vec<bool> {
    let mut used = vec![false; individual.nodes.len()];
    for wire in &individual.outputs {
        if wire.source >= individual.input_count {
            used[wire.source - individual.input_count] = true;
        }
    }
    for position in (0..individual.nodes.len()).rev() {
        if !used[position] {
            continue;
        }
        for wire in &individual.nodes[position].inputs {
            if wire.source >= individual.input_count {
                used[wire.source - individual.input_count] = true;
            }
        }
    }
    used
}

/// Backward reachability inside a module, seeded from its declared outputs.
#[must_use]
pub fn module_used_nodes(module: &Module) -> Vec<bool> {
    let mut used = vec![false; module.nodes.len()];
    for wire in &module.outputs {
        if wire.source >= module.input_count {
            used[wire.source - module.input_count] = true;
        }
    }
    for position in (0..module.nodes.len()).rev() {
        if !used[position] {
            continue;
        }
        for wire in &module.nodes[position].inputs {
            if wire.source >= module.input_count {
                used[wire.source - module.input_count] = true;
            }
        }
    }
    used
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionSet;
    use crate::graph::{ModuleLibrary, Node, Wire};

    /// Two inputs, nodes [a+b, (a+b)*b], output = node 1.
    fn chain() -> Individual {
        Individual::from_parts(
            vec![
                Node::primitive(0, Wire::to(0), Wire::to(1)),
                Node::primitive(2, Wire::to(2), Wire::to(1)),
            ],
            2,
            vec![Wire::to(3)],
            FunctionSet::Arithmetic,
            4,
            None,
            ModuleLibrary::new(),
        )
    }

    #[test]
    fn test_forward_evaluation() {
        let mut individual = chain();
        let out = evaluate(&mut individual, &[2.0, 3.0]).unwrap();
        assert!((out[0] - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_input_arity_checked() {
        let mut individual = chain();
        assert_eq!(
            evaluate(&mut individual, &[1.0]),
            Err(EngineError::InputArity {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_used_nodes_single_pass() {
        let mut individual = chain();
        // rewire the output to node 0 only
        individual.outputs[0] = Wire::to(2);
        let used = compute_used_nodes(&individual);
        assert_eq!(used, vec![true, false]);
        // memoization
        ensure_used_nodes(&mut individual).unwrap();
        assert!(individual.has_used_nodes());
    }

    #[test]
    fn test_module_evaluation() {
        let individual = chain();
        let module = Module {
            id: 0,
            input_count: 2,
            // nodes: [in0 - in1, n0 * n0]; outputs both slots of n1 and n0
            outputs: vec![Wire::to(3), Wire::to(2)],
            nodes: vec![
                Node::primitive(1, Wire::to(0), Wire::to(1)),
                Node::primitive(2, Wire::to(2), Wire::to(2)),
            ],
        };
        let out = evaluate_module(&module, &[5.0, 3.0], &individual).unwrap();
        assert!((out[0] - 4.0).abs() < f64::EPSILON);
        assert!((out[1] - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_module_is_error() {
        let mut individual = chain();
        individual.nodes[1].function = NodeFunction::ModuleCall {
            id: 9,
            replicated: false,
        };
        individual.invalidate_used_nodes();
        assert_eq!(
            evaluate(&mut individual, &[1.0, 2.0]),
            Err(EngineError::UnknownModule(9))
        );
    }
}
