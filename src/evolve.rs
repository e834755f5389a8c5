//! The (mu+lambda) evolutionary driver.
//!
//! One generation mutates lambda offspring from the mu parents, scores every
//! unscored individual in parallel, then selects the next mu survivors from
//! the pooled parents and offspring. A generation boundary is a full
//! synchronization point; the wall-clock budget is checked there and nothing
//! is cancelled mid-flight.

#![allow(clippy::print_stderr)]

use crate::dataset::Dataset;
use crate::error::{EngineError, EngineResult};
use crate::fitness::evaluate_population;
use crate::functions::FunctionSet;
use crate::graph::Individual;
use crate::mutate::{MutationConfig, mutate};
use crate::select::select;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for one evolutionary run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Nodes per freshly seeded individual.
    pub node_amount: usize,
    /// Declared outputs per individual.
    pub output_count: usize,
    /// Primitive function set.
    pub function_set: FunctionSet,
    /// Largest node range the compressor may extract.
    pub max_module_size: usize,
    /// Connectivity window; `None` is unrestricted.
    pub levels_back: Option<usize>,
    /// Generation limit for one run.
    pub generation_limit: usize,
    /// Parents retained per generation.
    pub mu: usize,
    /// Offspring produced per generation.
    pub lambda: usize,
    /// Mutation pipeline parameters.
    pub mutation: MutationConfig,
    /// Seed for the run's random source.
    pub seed: u64,
    /// Per-generation wall-clock budget in seconds; `None` is unbounded.
    pub generation_budget_secs: Option<u64>,
    /// Whether to print per-generation progress to stderr.
    pub verbose: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            node_amount: 1000,
            output_count: 1,
            function_set: FunctionSet::Extended,
            max_module_size: 5,
            levels_back: None,
            generation_limit: 8000,
            mu: 1,
            lambda: 4,
            mutation: MutationConfig::default(),
            seed: 42,
            generation_budget_secs: None,
            verbose: true,
        }
    }
}

/// Statistics of one finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Best fitness at each generation, in order.
    pub best_per_generation: Vec<u32>,
    /// Generations actually run.
    pub generations_run: usize,
    /// Best fitness at termination.
    pub best_fitness: u32,
    /// Whether a zero-fitness individual was found.
    pub solved: bool,
    /// Wall-clock seconds for the whole run.
    pub elapsed_seconds: f64,
}

/// The survivors and statistics of one run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The final mu individuals, best first.
    pub survivors: Vec<Individual>,
    /// Per-run statistics.
    pub stats: RunStats,
}

/// Run one complete evolutionary run against a dataset.
///
/// Seeds mu+lambda random individuals, then iterates until the generation
/// limit is reached or some individual classifies the whole dataset.
///
/// # Errors
///
/// Fails on an invalid configuration, on a structural-inconsistency error
/// from an operator, on a decode error, or when a generation exceeds the
/// wall-clock budget.
pub fn evolve(config: &EvolutionConfig, dataset: &Dataset) -> EngineResult<RunResult> {
    validate(config)?;
    let start = Instant::now();
    let input_count = dataset.feature_len();
    let mut rng = SmallRng::seed_from_u64(config.seed);

    let mut population: Vec<Individual> = (0..config.mu + config.lambda)
        .map(|_| {
            Individual::random(
                &mut rng,
                config.node_amount,
                input_count,
                config.output_count,
                config.function_set,
                config.max_module_size,
                config.levels_back,
            )
        })
        .collect();
    evaluate_population(&mut population, &[], dataset)?;
    let mut parents = select(population, Vec::new(), config.mu, &mut rng)?;

    let mut best_per_generation = Vec::new();
    let mut generation = 0;
    let mut best = best_fitness(&parents)?;

    while generation < config.generation_limit && best > 0 {
        generation += 1;
        let generation_start = Instant::now();

        // offspring mutation is sequential so a seed fixes the whole run
        let mut offspring = Vec::with_capacity(config.lambda);
        for _ in 0..config.lambda {
            // each offspring clones a uniformly drawn parent
            let mut child = parents[rng.gen_range(0..config.mu)].offspring();
            mutate(&mut child, &config.mutation, &mut rng)?;
            offspring.push(child);
        }

        evaluate_population(&mut offspring, &parents, dataset)?;
        if let Some(budget) = config.generation_budget_secs
            && generation_start.elapsed().as_secs() > budget
        {
            return Err(EngineError::GenerationTimeout {
                generation,
                budget_secs: budget,
            });
        }

        parents = select(parents, offspring, config.mu, &mut rng)?;
        best = best_fitness(&parents)?;
        best_per_generation.push(best);

        if config.verbose && (generation % 100 == 0 || best == 0) {
            eprintln!("generation {generation}: best fitness {best}");
        }
    }

    parents.sort_by_key(|individual| individual.fitness().unwrap_or(u32::MAX));
    Ok(RunResult {
        survivors: parents,
        stats: RunStats {
            best_per_generation,
            generations_run: generation,
            best_fitness: best,
            solved: best == 0,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        },
    })
}

/// Run repeated independent tries, collecting each run's survivors.
///
/// Try `i` runs with `seed + i` so tries stay reproducible yet distinct.
///
/// # Errors
///
/// Propagates the first failing run.
pub fn run_tries(
    config: &EvolutionConfig,
    dataset: &Dataset,
    tries: usize,
    mut on_finish: impl FnMut(usize, &RunResult),
) -> EngineResult<Vec<RunResult>> {
    let mut results = Vec::with_capacity(tries);
    for try_index in 0..tries {
        let mut try_config = *config;
        try_config.seed = config.seed.wrapping_add(u64::try_from(try_index).unwrap_or(u64::MAX));
        let result = evolve(&try_config, dataset)?;
        on_finish(try_index, &result);
        results.push(result);
    }
    Ok(results)
}

fn best_fitness(parents: &[Individual]) -> EngineResult<u32> {
    let mut best = u32::MAX;
    for parent in parents {
        best = best.min(parent.fitness()?);
    }
    Ok(best)
}

fn validate(config: &EvolutionConfig) -> EngineResult<()> {
    if config.mu == 0 || config.lambda == 0 {
        return Err(EngineError::Config("mu and lambda must be positive".into()));
    }
    if config.node_amount == 0 {
        return Err(EngineError::Config("node_amount must be positive".into()));
    }
    if config.output_count != 1 && config.output_count != 4 {
        return Err(EngineError::Config(
            "output_count must be 1 or 4 for the decode contract".into(),
        ));
    }
    if config.max_module_size < 2 {
        return Err(EngineError::Config(
            "max_module_size must be at least 2".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Sample;

    fn xor_like_dataset() -> Dataset {
        // separable by a 2-input boolean function of features 0 and 1
        let rows = [
            ([0, 0, 0, 0], 0),
            ([0, 1, 0, 1], 1),
            ([1, 0, 1, 0], 1),
            ([1, 1, 0, 0], 0),
            ([0, 0, 1, 1], 0),
            ([0, 1, 1, 0], 1),
            ([1, 0, 0, 1], 1),
            ([1, 1, 1, 1], 0),
        ];
        Dataset::new(
            rows.iter()
                .map(|(features, label)| Sample {
                    features: features.to_vec(),
                    label: *label,
                })
                .collect(),
        )
        .unwrap()
    }

    fn small_config(seed: u64) -> EvolutionConfig {
        EvolutionConfig {
            node_amount: 20,
            output_count: 1,
            function_set: FunctionSet::Boolean,
            max_module_size: 4,
            levels_back: None,
            generation_limit: 50,
            mu: 1,
            lambda: 4,
            mutation: MutationConfig::default(),
            seed,
            generation_budget_secs: None,
            verbose: false,
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dataset = xor_like_dataset();
        let mut config = small_config(1);
        config.mu = 0;
        assert!(matches!(
            evolve(&config, &dataset),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_survivor_count_and_scores() {
        let dataset = xor_like_dataset();
        let result = evolve(&small_config(5), &dataset).unwrap();
        assert_eq!(result.survivors.len(), 1);
        assert!(result.survivors[0].has_fitness());
        assert_eq!(
            result.stats.best_per_generation.len(),
            result.stats.generations_run
        );
    }

    #[test]
    fn test_config_is_plain_copyable() {
        let config = small_config(1);
        let copy = config;
        assert_eq!(copy.seed, config.seed);
        assert_eq!(copy.generation_limit, config.generation_limit);
    }

    #[test]
    fn test_multiple_parents_supported() {
        let dataset = xor_like_dataset();
        let mut config = small_config(11);
        config.mu = 2;
        config.lambda = 6;
        let result = evolve(&config, &dataset).unwrap();
        assert_eq!(result.survivors.len(), 2);
        assert!(result.survivors.iter().all(Individual::has_fitness));
        // survivors come back best first
        let first = result.survivors[0].fitness().unwrap();
        let second = result.survivors[1].fitness().unwrap();
        assert!(first <= second);
    }

    #[test]
    fn test_run_is_deterministic_for_a_seed() {
        let dataset = xor_like_dataset();
        let first = evolve(&small_config(9), &dataset).unwrap();
        let second = evolve(&small_config(9), &dataset).unwrap();
        assert_eq!(
            first.stats.best_per_generation,
            second.stats.best_per_generation
        );
    }
}
