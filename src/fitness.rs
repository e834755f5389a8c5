//! Fitness evaluation: graph output decoding and population scoring.
//!
//! The decode contract compares exact sentinel values, so float equality is
//! intentional here.
#![allow(clippy::float_cmp)]

use crate::dataset::Dataset;
use crate::error::{EngineError, EngineResult};
use crate::eval::{ensure_used_nodes, evaluate};
use crate::graph::{Individual, Node};
use rayon::prelude::*;

/// Decode one output vector against a label.
///
/// Arity 1 rounds to the nearest integer and compares. Arity 4 reads the
/// components as a big-endian binary code for the classes 0 through 9; the
/// six unmapped codes count as incorrect for every label.
///
/// # Errors
///
/// Fails on an arity other than 1 or 4, or on an arity-4 component that is
/// not exactly 0 or 1.
pub fn decode_correct(output: &[f64], label: i32) -> EngineResult<bool> {
    match output.len() {
        1 => {
            #[allow(clippy::cast_possible_truncation)]
            let rounded = output[0].round() as i32;
            Ok(rounded == label)
        }
        4 => {
            for &component in output {
                if component != 0.0 && component != 1.0 {
                    return Err(EngineError::NonBinaryOutput(component));
                }
            }
            let code = output
                .iter()
                .fold(0i32, |acc, &bit| acc * 2 + i32::from(bit == 1.0));
            Ok(code <= 9 && code == label)
        }
        other => Err(EngineError::UnsupportedArity(other)),
    }
}

/// Count the dataset examples this individual misclassifies. Zero is a
/// perfect score.
///
/// # Errors
///
/// Propagates evaluation and decode errors.
pub fn fitness(individual: &mut Individual, dataset: &Dataset) -> EngineResult<u32> {
    let mut mistakes = 0u32;
    for sample in dataset.samples() {
        let input: Vec<f64> = sample.features.iter().copied().map(f64::from).collect();
        let output = evaluate(individual, &input)?;
        if !decode_correct(&output, sample.label)? {
            mistakes += 1;
        }
    }
    Ok(mistakes)
}

/// Check whether some parent's used subgraph matches the offspring's and, if
/// so, return that parent's fitness. Fitness is a pure function of the used
/// subgraph, so a match makes re-evaluation redundant.
///
/// # Errors
///
/// Propagates reachability errors.
pub fn inherited_fitness(
    offspring: &mut Individual,
    parents: &[Individual],
) -> EngineResult<Option<u32>> {
    ensure_used_nodes(offspring)?;
    for parent in parents {
        if parent.has_fitness()
            && parent.has_used_nodes()
            && same_used_subgraph(parent, offspring)?
        {
            return Ok(Some(parent.fitness()?));
        }
    }
    Ok(None)
}

/// Bitwise comparison of the used subgraphs: identical masks, identical
/// genes on every used node, identical output wiring and identical module
/// bodies behind every used module call.
fn same_used_subgraph(parent: &Individual, offspring: &Individual) -> EngineResult<bool> {
    let parent_mask = parent.used_nodes()?;
    let offspring_mask = offspring.used_nodes()?;
    if parent_mask != offspring_mask || parent.outputs != offspring.outputs {
        return Ok(false);
    }
    for (position, used) in offspring_mask.iter().enumerate() {
        if !used {
            continue;
        }
        let ours: &Node = &offspring.nodes[position];
        if ours != &parent.nodes[position] {
            return Ok(false);
        }
        if let Some(id) = ours.function.module_id()
            && parent.library.get(id)? != offspring.library.get(id)?
        {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Score every unscored individual, in parallel over the population.
///
/// Each individual first tries to inherit a parent's fitness via the used
/// subgraph comparison, then falls back to a full dataset pass. Scored
/// individuals are left untouched.
///
/// # Errors
///
/// Propagates the first evaluation error.
pub fn evaluate_population(
    population: &mut [Individual],
    parents: &[Individual],
    dataset: &Dataset,
) -> EngineResult<()> {
    population.par_iter_mut().try_for_each(|individual| {
        if individual.has_fitness() {
            return Ok(());
        }
        let score = match inherited_fitness(individual, parents)? {
            Some(score) => score,
            None => fitness(individual, dataset)?,
        };
        individual.set_fitness(score)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Sample;
    use crate::functions::FunctionSet;
    use crate::mutate::{MutationConfig, mutate};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_decode_arity_one_rounds() {
        assert_eq!(decode_correct(&[2.6], 3), Ok(true));
        assert_eq!(decode_correct(&[2.4], 3), Ok(false));
        assert_eq!(decode_correct(&[-0.3], 0), Ok(true));
    }

    #[test]
    fn test_decode_arity_four_bcd() {
        assert_eq!(decode_correct(&[0.0, 0.0, 0.0, 1.0], 1), Ok(true));
        assert_eq!(decode_correct(&[1.0, 0.0, 0.0, 1.0], 9), Ok(true));
        assert_eq!(decode_correct(&[0.0, 1.0, 1.0, 0.0], 6), Ok(true));
        assert_eq!(decode_correct(&[0.0, 0.0, 1.0, 0.0], 3), Ok(false));
    }

    #[test]
    fn test_decode_unmapped_patterns_always_incorrect() {
        for label in 0..10 {
            assert_eq!(decode_correct(&[1.0, 1.0, 0.0, 0.0], label), Ok(false));
            assert_eq!(decode_correct(&[1.0, 1.0, 1.0, 1.0], label), Ok(false));
        }
    }

    #[test]
    fn test_decode_rejects_non_binary() {
        assert_eq!(
            decode_correct(&[0.0, 0.5, 0.0, 1.0], 1),
            Err(EngineError::NonBinaryOutput(0.5))
        );
    }

    #[test]
    fn test_decode_rejects_unknown_arity() {
        assert_eq!(
            decode_correct(&[1.0, 2.0], 1),
            Err(EngineError::UnsupportedArity(2))
        );
    }

    #[test]
    fn test_unmutated_offspring_inherits_fitness() {
        let mut rng = SmallRng::seed_from_u64(71);
        let dataset = Dataset::new(vec![
            Sample {
                features: vec![1, 2],
                label: 3,
            },
            Sample {
                features: vec![0, 0],
                label: 0,
            },
        ])
        .unwrap();
        let mut parent = Individual::random(&mut rng, 10, 2, 1, FunctionSet::Arithmetic, 4, None);
        let score = fitness(&mut parent, &dataset).unwrap();
        parent.set_fitness(score).unwrap();

        let mut child = parent.offspring();
        let inherited = inherited_fitness(&mut child, std::slice::from_ref(&parent)).unwrap();
        assert_eq!(inherited, Some(score));
    }

    #[test]
    fn test_population_pass_scores_everyone() {
        let mut rng = SmallRng::seed_from_u64(72);
        let dataset = Dataset::new(vec![Sample {
            features: vec![1, 0, 2],
            label: 1,
        }])
        .unwrap();
        let config = MutationConfig::default();
        let parent = Individual::random(&mut rng, 12, 3, 1, FunctionSet::Arithmetic, 4, None);
        let mut population: Vec<Individual> = (0..4)
            .map(|_| {
                let mut child = parent.offspring();
                mutate(&mut child, &config, &mut rng).unwrap();
                child
            })
            .collect();
        evaluate_population(&mut population, &[], &dataset).unwrap();
        assert!(population.iter().all(Individual::has_fitness));
    }
}
