//! Compression: extract a primitive-only node range into a new module.

use crate::error::EngineResult;
use crate::graph::{Individual, Module, NodeFunction, Wire};
use rand::Rng;

/// Attempt one compression: pick a random start node and a random end within
/// `max_module_size` nodes after it, and extract the range into a new module
/// referenced by a fresh original call at the range start.
///
/// No-op when the module cap is reached, the size limit leaves no room for a
/// two-node range, the chosen range collapses to one node, or any node in
/// range is itself a module call.
///
/// External references of the range become the module's inputs in encounter
/// order, duplicates preserved. Later references into the range each become a
/// module output, duplicates preserved; a range nothing references gets one
/// fabricated output. Later addresses shift down by the range length minus
/// one.
///
/// # Errors
///
/// Propagates library errors, which indicate an operator bug.
pub fn compress<R: Rng>(
    individual: &mut Individual,
    max_modules: Option<usize>,
    rng: &mut R,
) -> EngineResult<()> {
    if let Some(cap) = max_modules
        && individual.library.len() >= cap
    {
        return Ok(());
    }
    let node_count = individual.nodes.len();
    if node_count < 2 || individual.max_module_size < 2 {
        return Ok(());
    }

    let start = rng.gen_range(0..node_count);
    if start == node_count - 1 {
        // one node cannot become a module
        return Ok(());
    }
    let end_bound = (start + individual.max_module_size).min(node_count);
    let end = rng.gen_range(start + 1..end_bound);

    if individual.nodes[start..=end]
        .iter()
        .any(|n| !n.function.is_primitive())
    {
        return Ok(());
    }

    extract(individual, start, end, rng)
}

/// Perform the extraction of `start..=end` (all primitive, length >= 2).
fn extract<R: Rng>(
    individual: &mut Individual,
    start: usize,
    end: usize,
    rng: &mut R,
) -> EngineResult<()> {
    let range_start = individual.input_count + start;
    let range_end = individual.input_count + end;
    let shift = end - start;

    let mut body: Vec<_> = individual.nodes[start..=end].to_vec();

    // every reference to a pre-range address becomes one module input
    let module_inputs = body
        .iter()
        .flat_map(|n| &n.inputs)
        .filter(|w| w.source < range_start)
        .count();

    // renumber the body into module-local address space, capturing the
    // external wires for the call site in encounter order
    let mut captured = Vec::with_capacity(module_inputs);
    for node in &mut body {
        for wire in &mut node.inputs {
            if wire.source >= range_start {
                wire.source = wire.source - range_start + module_inputs;
            } else {
                captured.push(*wire);
                wire.source = captured.len() - 1;
            }
            // body nodes are primitive, so only slot 0 exists internally
            wire.slot = 0;
        }
    }

    // rewire every later reference into the range onto a fresh module output
    let mut outputs: Vec<Wire> = Vec::new();
    let mut redirect = |wire: &mut Wire| {
        if wire.source >= range_start && wire.source <= range_end {
            outputs.push(Wire::to(wire.source - range_start + module_inputs));
            wire.source = range_start;
            wire.slot = outputs.len() - 1;
        } else if wire.source > range_end {
            wire.source -= shift;
        }
    };
    for node in individual.nodes.iter_mut().skip(end + 1) {
        for wire in &mut node.inputs {
            redirect(wire);
        }
    }
    for wire in &mut individual.outputs {
        redirect(wire);
    }

    if outputs.is_empty() {
        // a module is never output-less
        let position = rng.gen_range(0..body.len());
        outputs.push(Wire::to(position + module_inputs));
    }

    let id = individual.library.first_unused_id();
    individual.library.add(Module {
        id,
        input_count: module_inputs,
        outputs,
        nodes: body,
    })?;

    individual.nodes.drain(start + 1..=end);
    let call = &mut individual.nodes[start];
    call.function = NodeFunction::ModuleCall {
        id,
        replicated: false,
    };
    call.inputs = captured;
    Ok(())
}
