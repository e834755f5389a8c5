//! The `inspect` command: print a saved run snapshot.

use clap::Args;
use ecgp::eval::compute_used_nodes;
use ecgp::persist::load_snapshot;
use std::error::Error;
use std::path::PathBuf;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub(crate) struct InspectArgs {
    /// Snapshot file written by the run command
    #[arg(required = true)]
    snapshot: PathBuf,

    /// Emit machine-readable JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Execute the `inspect` command.
pub(crate) fn execute(args: &InspectArgs) -> Result<(), Box<dyn Error>> {
    let snapshot = load_snapshot(&args.snapshot)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("seed: {}", snapshot.seed);
    println!(
        "generations run: {} (solved: {})",
        snapshot.stats.generations_run, snapshot.stats.solved
    );
    println!("elapsed: {:.1}s", snapshot.stats.elapsed_seconds);
    for (index, individual) in snapshot.survivors.iter().enumerate() {
        let used = compute_used_nodes(individual)
            .iter()
            .filter(|&&u| u)
            .count();
        let fitness = individual
            .fitness()
            .map_or_else(|_| "unset".to_string(), |f| f.to_string());
        println!(
            "survivor {index}: fitness {fitness}, {} nodes ({used} used), {} modules",
            individual.nodes.len(),
            individual.library.len()
        );
    }
    Ok(())
}
