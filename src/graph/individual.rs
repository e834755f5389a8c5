//! The individual: node sequence, output wiring and an owned module library.

use crate::error::{EngineError, EngineResult};
use crate::functions::FunctionSet;
use crate::graph::module::ModuleLibrary;
use crate::graph::node::{Node, Wire};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A complete genotype.
///
/// Fitness and the used-nodes mask are write-once per structural generation:
/// cloning for reproduction clears both, and every structural mutation
/// invalidates the mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Ordered genotype nodes. Node `i` has address `input_count + i`.
    pub nodes: Vec<Node>,
    /// Number of external inputs, occupying addresses `[0, input_count)`.
    pub input_count: usize,
    /// Output wiring, one wire per declared output. Not addressable.
    pub outputs: Vec<Wire>,
    /// The primitive function set used by this genotype.
    pub function_set: FunctionSet,
    /// Largest node range the compressor may extract.
    pub max_module_size: usize,
    /// Connectivity window for input addresses; `None` disables it.
    pub levels_back: Option<usize>,
    /// Module library owned by this individual alone.
    pub library: ModuleLibrary,
    genotype_size: usize,
    fitness: Option<u32>,
    used_nodes: Option<Vec<bool>>,
}

impl Individual {
    /// Create a random individual with `node_amount` primitive nodes, an
    /// empty library and policy-drawn wiring.
    #[must_use]
    pub fn random<R: Rng>(
        rng: &mut R,
        node_amount: usize,
        input_count: usize,
        output_count: usize,
        function_set: FunctionSet,
        max_module_size: usize,
        levels_back: Option<usize>,
    ) -> Self {
        let mut nodes = Vec::with_capacity(node_amount);
        for position in 0..node_amount {
            let function = rng.gen_range(0..function_set.count());
            let a = random_source(rng, input_count, position, levels_back);
            let b = random_source(rng, input_count, position, levels_back);
            nodes.push(Node::primitive(function, Wire::to(a), Wire::to(b)));
        }

        let outputs = (0..output_count)
            .map(|_| Wire::to(random_source(rng, input_count, node_amount, levels_back)))
            .collect();

        let mut individual = Self {
            nodes,
            input_count,
            outputs,
            function_set,
            max_module_size,
            levels_back,
            library: ModuleLibrary::new(),
            genotype_size: 0,
            fitness: None,
            used_nodes: None,
        };
        individual.recompute_genotype_size();
        individual
    }

    /// Create an individual from explicit parts, unscored, with the genotype
    /// size computed from the parts.
    #[must_use]
    pub fn from_parts(
        nodes: Vec<Node>,
        input_count: usize,
        outputs: Vec<Wire>,
        function_set: FunctionSet,
        max_module_size: usize,
        levels_back: Option<usize>,
        library: ModuleLibrary,
    ) -> Self {
        let mut individual = Self {
            nodes,
            input_count,
            outputs,
            function_set,
            max_module_size,
            levels_back,
            library,
            genotype_size: 0,
            fitness: None,
            used_nodes: None,
        };
        individual.recompute_genotype_size();
        individual
    }

    /// Number of declared outputs.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// One past the largest valid source address: inputs plus nodes.
    #[must_use]
    pub fn address_limit(&self) -> usize {
        self.input_count + self.nodes.len()
    }

    /// Current genotype size: one function gene plus one gene per input over
    /// all nodes, plus one gene per output.
    #[must_use]
    pub fn genotype_size(&self) -> usize {
        self.genotype_size
    }

    /// Recompute the genotype size from scratch. Called at the end of every
    /// mutation pass.
    pub fn recompute_genotype_size(&mut self) {
        self.genotype_size =
            self.nodes.iter().map(Node::gene_count).sum::<usize>() + self.outputs.len();
    }

    /// Whether fitness has been assigned for this structural generation.
    #[must_use]
    pub fn has_fitness(&self) -> bool {
        self.fitness.is_some()
    }

    /// The assigned fitness.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotSet`] if fitness was never assigned.
    pub fn fitness(&self) -> EngineResult<u32> {
        self.fitness.ok_or(EngineError::NotSet("fitness"))
    }

    /// Assign fitness, exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadySet`] on a second assignment.
    pub fn set_fitness(&mut self, fitness: u32) -> EngineResult<()> {
        if self.fitness.is_some() {
            return Err(EngineError::AlreadySet("fitness"));
        }
        self.fitness = Some(fitness);
        Ok(())
    }

    /// Whether the used-nodes mask has been computed.
    #[must_use]
    pub fn has_used_nodes(&self) -> bool {
        self.used_nodes.is_some()
    }

    /// The memoized used-nodes mask.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotSet`] if the mask was never computed.
    pub fn used_nodes(&self) -> EngineResult<&[bool]> {
        self.used_nodes
            .as_deref()
            .ok_or(EngineError::NotSet("used_nodes"))
    }

    /// Memoize the used-nodes mask, exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadySet`] on a second assignment.
    pub fn set_used_nodes(&mut self, mask: Vec<bool>) -> EngineResult<()> {
        if self.used_nodes.is_some() {
            return Err(EngineError::AlreadySet("used_nodes"));
        }
        self.used_nodes = Some(mask);
        Ok(())
    }

    /// Drop the memoized mask. Every structural mutation calls this.
    pub fn invalidate_used_nodes(&mut self) {
        self.used_nodes = None;
    }

    /// Deep-copy this individual as an unscored offspring: same genotype and
    /// library, fitness and used-nodes mask cleared.
    #[must_use]
    pub fn offspring(&self) -> Self {
        let mut child = self.clone();
        child.fitness = None;
        child.used_nodes = None;
        child
    }

    /// Ids of modules referenced by at least one node.
    #[must_use]
    pub fn referenced_module_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .nodes
            .iter()
            .filter_map(|n| n.function.module_id())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Draw a source address for the input of a node at `position` (or for an
/// output gene, with `position` = node count).
///
/// With no levels-back window any strict predecessor or input is uniformly
/// eligible. With a window of `w`, the eligible set is all inputs plus the
/// nearest `min(w, position)` node addresses, closest first.
pub(crate) fn random_source<R: Rng>(
    rng: &mut R,
    input_count: usize,
    position: usize,
    levels_back: Option<usize>,
) -> usize {
    match levels_back {
        None => rng.gen_range(0..input_count + position),
        Some(window) => {
            let reach = window.min(position);
            let drawn = rng.gen_range(0..input_count + reach);
            if drawn < input_count {
                drawn
            } else {
                // distance back from the current position, closest first
                let distance = drawn - input_count;
                input_count + position - distance - 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sample(rng: &mut SmallRng) -> Individual {
        Individual::random(rng, 10, 4, 2, FunctionSet::Arithmetic, 4, None)
    }

    #[test]
    fn test_random_addresses_are_predecessors() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let individual = sample(&mut rng);
            for (position, node) in individual.nodes.iter().enumerate() {
                for wire in &node.inputs {
                    assert!(wire.source < individual.input_count + position);
                }
            }
            for wire in &individual.outputs {
                assert!(wire.source < individual.address_limit());
            }
        }
    }

    #[test]
    fn test_levels_back_window() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let individual =
                Individual::random(&mut rng, 20, 3, 1, FunctionSet::Arithmetic, 4, Some(2));
            for (position, node) in individual.nodes.iter().enumerate() {
                for wire in &node.inputs {
                    if wire.source >= individual.input_count {
                        let distance = individual.input_count + position - wire.source;
                        assert!(distance <= 2, "source outside window");
                    }
                }
            }
        }
    }

    #[test]
    fn test_genotype_size() {
        let mut rng = SmallRng::seed_from_u64(1);
        let individual = sample(&mut rng);
        // 10 primitive nodes of 3 genes each plus 2 output genes
        assert_eq!(individual.genotype_size(), 32);
    }

    #[test]
    fn test_fitness_write_once() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut individual = sample(&mut rng);
        assert!(!individual.has_fitness());
        individual.set_fitness(3).unwrap();
        assert_eq!(individual.fitness(), Ok(3));
        assert_eq!(
            individual.set_fitness(4),
            Err(EngineError::AlreadySet("fitness"))
        );
    }

    #[test]
    fn test_offspring_clears_scores() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut individual = sample(&mut rng);
        individual.set_fitness(5).unwrap();
        individual.set_used_nodes(vec![false; 10]).unwrap();
        let child = individual.offspring();
        assert!(!child.has_fitness());
        assert!(!child.has_used_nodes());
        assert_eq!(child.nodes, individual.nodes);
    }

    #[test]
    fn test_copy_has_no_aliasing() {
        let mut rng = SmallRng::seed_from_u64(4);
        let individual = sample(&mut rng);
        let mut copy = individual.offspring();
        copy.nodes[0].inputs[0].source += 1;
        copy.outputs[0].slot += 1;
        assert_ne!(copy.nodes[0], individual.nodes[0]);
        assert_ne!(copy.outputs[0], individual.outputs[0]);
    }
}
