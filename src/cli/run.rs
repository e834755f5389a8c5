//! The `run` command: repeated evolutionary searches over one dataset.

// Progress accounting uses intentional usize-to-u64 casts
#![allow(clippy::cast_possible_truncation)]

use crate::cli::FunctionSetArg;
use clap::Args;
use ecgp::dataset::Dataset;
use ecgp::evolve::{EvolutionConfig, run_tries};
use ecgp::mutate::MutationConfig;
use ecgp::persist::{Snapshot, save_report, save_snapshot, snapshot_path};
use ecgp::stats::Summary;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Label-first CSV dataset file
    #[arg(required = true)]
    dataset: PathBuf,

    /// Directory for snapshots and the statistics report
    #[arg(short, long, default_value = "ecgp-out")]
    output_dir: PathBuf,

    /// Independent runs; try i uses seed + i
    #[arg(long, default_value = "10")]
    tries: usize,

    /// Base RNG seed
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Generation limit per run
    #[arg(short, long, default_value = "8000")]
    generations: usize,

    /// Nodes per freshly seeded individual
    #[arg(short, long, default_value = "1000")]
    nodes: usize,

    /// Declared outputs per individual (1 or 4)
    #[arg(long, default_value = "1")]
    outputs: usize,

    /// Primitive function set
    #[arg(short, long, default_value = "extended")]
    function_set: FunctionSetArg,

    /// Largest node range the compressor may extract
    #[arg(long, default_value = "5")]
    max_module_size: usize,

    /// Module library cap; omit for unbounded
    #[arg(long)]
    max_modules: Option<usize>,

    /// Levels-back connectivity window; omit for unrestricted
    #[arg(long)]
    levels_back: Option<usize>,

    /// Parents per generation
    #[arg(long, default_value = "1")]
    mu: usize,

    /// Offspring per generation
    #[arg(long, default_value = "4")]
    lambda: usize,

    /// Point mutations per pass as a fraction of the genotype size
    #[arg(long, default_value = "0.06")]
    mutation_rate: f64,

    /// Probability of a compression attempt per pass
    #[arg(long, default_value = "0.2")]
    compress: f64,

    /// Per-module probability of a local point mutation
    #[arg(long, default_value = "0.5")]
    module_point: f64,

    /// Per-module probability of adding an input
    #[arg(long, default_value = "0.05")]
    add_input: f64,

    /// Per-module probability of adding an output
    #[arg(long, default_value = "0.02")]
    add_output: f64,

    /// Per-generation wall-clock budget in seconds
    #[arg(long)]
    budget_secs: Option<u64>,

    /// Keep only the first N dataset rows
    #[arg(long)]
    limit: Option<usize>,

    /// Halve the image sides by averaging 2x2 blocks
    #[arg(long)]
    downsample: bool,

    /// Binarize features at this threshold
    #[arg(long)]
    binarize: Option<i32>,

    /// Suppress per-generation progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Execute the `run` command.
pub(crate) fn execute(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let mut dataset = Dataset::from_csv(&args.dataset)?;
    if let Some(limit) = args.limit {
        dataset.truncate(limit);
    }
    if args.downsample {
        dataset.downsample()?;
    }
    if let Some(threshold) = args.binarize {
        dataset.binarize(threshold);
    }
    println!(
        "dataset: {} rows, {} features",
        dataset.len(),
        dataset.feature_len()
    );

    let config = EvolutionConfig {
        node_amount: args.nodes,
        output_count: args.outputs,
        function_set: args.function_set.into(),
        max_module_size: args.max_module_size,
        levels_back: args.levels_back,
        generation_limit: args.generations,
        mu: args.mu,
        lambda: args.lambda,
        mutation: MutationConfig {
            mutation_rate: args.mutation_rate,
            p_compress: args.compress,
            p_module_point: args.module_point,
            p_add_input: args.add_input,
            p_add_output: args.add_output,
            max_modules: args.max_modules,
        },
        seed: args.seed,
        generation_budget_secs: args.budget_secs,
        verbose: !args.quiet,
    };

    fs::create_dir_all(&args.output_dir)?;
    let bar = ProgressBar::new(args.tries as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} tries {msg}",
    )?);

    let output_dir = args.output_dir.clone();
    let seed = args.seed;
    let results = run_tries(&config, &dataset, args.tries, |try_index, result| {
        let snapshot = Snapshot {
            survivors: result.survivors.clone(),
            seed: seed.wrapping_add(try_index as u64),
            stats: result.stats.clone(),
        };
        if let Err(e) = save_snapshot(&snapshot, &snapshot_path(&output_dir, try_index)) {
            eprintln!("Warning: failed to save snapshot for try {try_index}: {e}");
        }
        bar.set_message(format!("last best fitness {}", result.stats.best_fitness));
        bar.inc(1);
    })?;
    bar.finish();

    let final_fitness: Vec<u32> = results.iter().map(|r| r.stats.best_fitness).collect();
    let Some(summary) = Summary::of(&final_fitness) else {
        println!("no runs executed");
        return Ok(());
    };
    let report = summary.report();
    println!("{report}");
    save_report(&report, &args.output_dir, "statistics")?;

    let solved = results.iter().filter(|r| r.stats.solved).count();
    println!("{solved} of {} tries reached fitness 0", results.len());
    Ok(())
}
