//! (μ+λ) survivor selection.

use crate::error::{EngineError, EngineResult};
use crate::graph::Individual;
use rand::Rng;

/// Extract the `mu` best individuals from the pooled parents and offspring.
///
/// Repeatedly removes a best-fitness individual from the pool. Fitness ties
/// are broken uniformly at random, except that an offspring is always
/// preferred over an equally fit parent. `parents` and `offspring` are
/// consumed; the survivors come back in extraction order.
///
/// # Errors
///
/// Fails if the pool is smaller than `mu`, or if any pooled individual is
/// unscored.
pub fn select<R: Rng>(
    parents: Vec<Individual>,
    offspring: Vec<Individual>,
    mu: usize,
    rng: &mut R,
) -> EngineResult<Vec<Individual>> {
    let parent_count = parents.len();
    if parent_count + offspring.len() < mu {
        return Err(EngineError::SelectionOverdraw {
            requested: mu,
            available: parent_count + offspring.len(),
        });
    }

    let mut pool: Vec<(Individual, bool)> = parents
        .into_iter()
        .map(|p| (p, true))
        .chain(offspring.into_iter().map(|o| (o, false)))
        .collect();
    let mut survivors = Vec::with_capacity(mu);

    while survivors.len() < mu {
        let mut best_fitness = u32::MAX;
        let mut tied: Vec<usize> = Vec::new();
        for (index, (individual, _)) in pool.iter().enumerate() {
            let fitness = individual.fitness()?;
            if fitness < best_fitness {
                best_fitness = fitness;
                tied.clear();
                tied.push(index);
            } else if fitness == best_fitness {
                tied.push(index);
            }
        }

        // offspring beat equally fit parents
        let offspring_tied: Vec<usize> = tied
            .iter()
            .copied()
            .filter(|&index| !pool[index].1)
            .collect();
        let candidates = if offspring_tied.is_empty() {
            &tied
        } else {
            &offspring_tied
        };
        let chosen = candidates[rng.gen_range(0..candidates.len())];
        survivors.push(pool.swap_remove(chosen).0);
    }
    Ok(survivors)
}
