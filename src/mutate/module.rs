//! Module-local mutation: point edits inside module bodies and arity changes
//! propagated to every call site.

use crate::error::EngineResult;
use crate::graph::{Individual, Module, NodeFunction, Wire, random_source};
use crate::mutate::{MutationConfig, random_wire};
use rand::Rng;

/// Mutate every module in the library, each with five independent draws:
/// one local point mutation, add input, remove input at twice that
/// probability, add output, remove output at twice that probability.
///
/// Arity changes renumber the module's internal references and edit every
/// call site so that call input lists and referenced output slots stay
/// consistent.
///
/// # Errors
///
/// Propagates structural-inconsistency errors, which indicate an operator bug.
pub fn mutate_modules<R: Rng>(
    individual: &mut Individual,
    config: &MutationConfig,
    rng: &mut R,
) -> EngineResult<()> {
    for id in individual.library.ids() {
        if rng.gen_bool(config.p_module_point.clamp(0.0, 1.0)) {
            let levels_back = individual.levels_back;
            let function_count = individual.function_set.count();
            point_mutation(individual.library.get_mut(id)?, function_count, levels_back, rng);
        }
        if rng.gen_bool(config.p_add_input.clamp(0.0, 1.0)) {
            add_input(individual, id, rng)?;
        }
        if rng.gen_bool((config.p_add_input * 2.0).clamp(0.0, 1.0)) {
            remove_input(individual, id, rng)?;
        }
        if rng.gen_bool(config.p_add_output.clamp(0.0, 1.0)) {
            add_output(individual, id, rng)?;
        }
        if rng.gen_bool((config.p_add_output * 2.0).clamp(0.0, 1.0)) {
            remove_output(individual, id, rng)?;
        }
    }
    Ok(())
}

/// One point mutation in the module's local gene enumeration: per body node a
/// function gene and two input genes, then the output genes.
fn point_mutation<R: Rng>(
    module: &mut Module,
    function_count: usize,
    levels_back: Option<usize>,
    rng: &mut R,
) {
    let node_genes = module.nodes.len() * 3;
    let gene = rng.gen_range(0..node_genes + module.outputs.len());

    if gene < node_genes {
        let position = gene / 3;
        let offset = gene % 3;
        if offset == 0 {
            module.nodes[position].function = NodeFunction::Primitive(rng.gen_range(0..function_count));
        } else {
            let source = random_source(rng, module.input_count, position, levels_back);
            // body nodes are primitive, slot 0 is the only slot
            module.nodes[position].inputs[offset - 1] = Wire::to(source);
        }
    } else {
        let index = gene - node_genes;
        module.outputs[index] = Wire::to(random_output_source(module, levels_back, rng));
    }
}

/// Draw a node address for a module output. Outputs never reference module
/// inputs; the levels-back window counts back from the body's end.
fn random_output_source<R: Rng>(
    module: &Module,
    levels_back: Option<usize>,
    rng: &mut R,
) -> usize {
    let node_count = module.nodes.len();
    match levels_back {
        None => module.input_count + rng.gen_range(0..node_count),
        Some(window) => {
            let reach = window.min(node_count);
            let distance = rng.gen_range(0..reach);
            module.input_count + node_count - distance - 1
        }
    }
}

/// Append one input to the module and one policy-drawn wire to every call
/// site. Refused at the cap of twice the body size.
fn add_input<R: Rng>(individual: &mut Individual, id: usize, rng: &mut R) -> EngineResult<()> {
    let module = individual.library.get_mut(id)?;
    let old_inputs = module.input_count;
    if old_inputs >= module.nodes.len() * 2 {
        return Ok(());
    }

    // the new input takes the address just past the old ones, so every
    // internal node reference and every output shifts up by one
    for node in &mut module.nodes {
        for wire in &mut node.inputs {
            if wire.source >= old_inputs {
                wire.source += 1;
            }
        }
    }
    for output in &mut module.outputs {
        output.source += 1;
    }
    module.input_count += 1;

    let call_sites: Vec<usize> = call_sites(individual, id);
    for position in call_sites {
        let wire = random_wire(individual, position, rng)?;
        individual.nodes[position].inputs.push(wire);
    }
    Ok(())
}

/// Remove one uniformly chosen input from the module and the matching wire
/// from every call site. Refused below two inputs.
fn remove_input<R: Rng>(individual: &mut Individual, id: usize, rng: &mut R) -> EngineResult<()> {
    let module = individual.library.get_mut(id)?;
    if module.input_count <= 2 {
        return Ok(());
    }
    let removed = rng.gen_range(0..module.input_count);

    module.input_count -= 1;
    for node in &mut module.nodes {
        for wire in &mut node.inputs {
            if wire.source >= removed && wire.source > 0 {
                wire.source -= 1;
            }
        }
    }
    for output in &mut module.outputs {
        output.source -= 1;
    }

    let call_sites: Vec<usize> = call_sites(individual, id);
    for position in call_sites {
        individual.nodes[position].inputs.remove(removed);
    }
    Ok(())
}

/// Append one policy-drawn output to the module. Call sites are untouched,
/// the new slot simply becomes available. Refused at the body-size cap.
fn add_output<R: Rng>(individual: &mut Individual, id: usize, rng: &mut R) -> EngineResult<()> {
    let levels_back = individual.levels_back;
    let module = individual.library.get_mut(id)?;
    if module.output_count() >= module.nodes.len() {
        return Ok(());
    }
    let source = random_output_source(module, levels_back, rng);
    module.outputs.push(Wire::to(source));
    Ok(())
}

/// Remove one uniformly chosen output from the module and renumber every
/// wire in the individual that addresses a call of this module past the
/// removed slot. Refused below one output.
fn remove_output<R: Rng>(individual: &mut Individual, id: usize, rng: &mut R) -> EngineResult<()> {
    let module = individual.library.get_mut(id)?;
    if module.output_count() <= 1 {
        return Ok(());
    }
    let removed = rng.gen_range(0..module.output_count());
    module.outputs.remove(removed);

    let addresses: Vec<usize> = call_sites(individual, id)
        .into_iter()
        .map(|position| individual.input_count + position)
        .collect();
    let renumber = |wire: &mut Wire| {
        if addresses.contains(&wire.source) && wire.slot >= removed && wire.slot > 0 {
            wire.slot -= 1;
        }
    };
    for node in &mut individual.nodes {
        for wire in &mut node.inputs {
            renumber(wire);
        }
    }
    for wire in &mut individual.outputs {
        renumber(wire);
    }
    Ok(())
}

/// Positions of every node calling the module, original or replicated.
fn call_sites(individual: &Individual, id: usize) -> Vec<usize> {
    individual
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(position, node)| (node.function.module_id() == Some(id)).then_some(position))
        .collect()
}
