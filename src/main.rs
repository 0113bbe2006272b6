//! Klotski Solver
//!
//! Searches the classic 4x5 sliding-block puzzle generation by generation,
//! saving progress to a JSON history so later runs can pick up where the
//! last one stopped.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use klotski::grid::format_grid;
use klotski::persistence::{HistoryStore, JsonFileStore, DEFAULT_HISTORY_FILE};
use klotski::solver::{solution_path, GridGeneration};
use klotski::{load_or_solve, DEFAULT_TARGET_GENERATION};

/// Solves the Klotski sliding-block puzzle.
#[derive(Parser)]
#[command(name = "klotski")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// History file to resume from and save to.
    #[arg(long, default_value = DEFAULT_HISTORY_FILE)]
    store: PathBuf,

    /// Generation to search up to.
    #[arg(long, default_value_t = DEFAULT_TARGET_GENERATION)]
    generations: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Search (or resume searching) and save the history.
    Solve,
    /// Show how many grids each stored generation holds.
    Count,
    /// Print the stored path from the starting layout to the first solved grid.
    Path,
    /// Print every grid in one stored generation.
    Show {
        #[arg(long)]
        generation: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = JsonFileStore::new(&cli.store);

    match cli.command.unwrap_or(Command::Solve) {
        Command::Solve => run_solver(&store, cli.generations),
        Command::Count => run_count(&store),
        Command::Path => run_path(&store),
        Command::Show { generation } => run_show(&store, generation),
    }
}

/// Loads the stored history, reporting a missing or unreadable store.
fn load_stored(store: &JsonFileStore) -> Option<Vec<GridGeneration>> {
    match store.load() {
        Ok(Some(history)) => Some(history),
        Ok(None) => {
            eprintln!(
                "No history at {}. Run 'klotski solve' first.",
                store.path().display()
            );
            None
        }
        Err(e) => {
            error!(error = %e, "failed to load history");
            None
        }
    }
}

/// Solves or resumes, saves, and reports the outcome.
fn run_solver(store: &JsonFileStore, target_generation: usize) {
    let history = match load_or_solve(store, target_generation) {
        Ok(history) => history,
        Err(e) => {
            error!(error = %e, "search failed");
            return;
        }
    };

    let last = history.last().map_or(0, |last| last.generation);
    println!("Searched {} generations", last);
    println!("Wrote {}", store.path().display());

    match solution_path(&history) {
        Ok(Some(path)) => println!("Solved in {} moves", path.len() - 1),
        Ok(None) => println!("No solution within {} generations", last),
        Err(e) => error!(error = %e, "goal test failed"),
    }
}

/// Prints grid counts per stored generation.
fn run_count(store: &JsonFileStore) {
    let Some(history) = load_stored(store) else {
        return;
    };
    for generation in &history {
        println!(
            "generation {}: {} grids",
            generation.generation,
            generation.grids.len()
        );
    }
}

/// Prints the stored solution path, one board per move.
fn run_path(store: &JsonFileStore) {
    let Some(history) = load_stored(store) else {
        return;
    };
    match solution_path(&history) {
        Ok(Some(path)) => {
            for (moves, grid) in path.iter().enumerate() {
                println!("Move {}:", moves);
                println!("{}", format_grid(grid));
            }
        }
        Ok(None) => println!("No solved grid in the stored history"),
        Err(e) => error!(error = %e, "goal test failed"),
    }
}

/// Prints every grid of one stored generation.
fn run_show(store: &JsonFileStore, generation: usize) {
    let Some(history) = load_stored(store) else {
        return;
    };
    let Some(stored) = history.iter().find(|g| g.generation == generation) else {
        eprintln!("Generation {} is not stored", generation);
        return;
    };
    for (i, grid) in stored.grids.iter().enumerate() {
        println!("Grid {} ({}):", i + 1, grid.identifier());
        println!("{}", format_grid(grid));
    }
}
