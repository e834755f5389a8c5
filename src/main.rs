//! ECGP CLI - run evolutionary searches and inspect saved results.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// An embedded Cartesian Genetic Programming engine
#[derive(Parser, Debug)]
#[command(name = "ecgp")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run repeated evolutionary searches against a CSV dataset
    Run(cli::run::RunArgs),

    /// Print the contents of a saved run snapshot
    Inspect(cli::inspect::InspectArgs),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Run(run_args) => cli::run::execute(&run_args),
        Commands::Inspect(inspect_args) => cli::inspect::execute(&inspect_args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
