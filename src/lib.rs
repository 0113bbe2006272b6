//! Klotski Solver Library
//!
//! Breadth-first search over the sliding-block puzzle on a 4x5 board, with
//! left-right mirror deduplication and a resumable generation history.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod persistence;
pub mod pieces;
pub mod solver;

use tracing::{info, warn};

use error::{SessionError, SolveError};
use grid::Grid;
use persistence::HistoryStore;
use solver::{GridGeneration, KnownStates};

/// Generation the host binary searches to by default.
pub const DEFAULT_TARGET_GENERATION: usize = 150;

/// Produces a history reaching `target_generation`, reusing whatever `store` holds.
///
/// - a stored history short of the target is resumed from its last
///   generation and the extended history is saved back
/// - a stored history at or past the target is returned untouched
/// - with nothing stored, a store that fails to load, or a stored history
///   the solver rejects, the search starts over from the classic layout and
///   the result replaces what was stored
pub fn load_or_solve(
    store: &dyn HistoryStore,
    target_generation: usize,
) -> Result<Vec<GridGeneration>, SessionError> {
    let stored = match store.load() {
        Ok(stored) => stored.filter(|history| !history.is_empty()),
        Err(e) => {
            warn!(error = %e, "failed to load stored history, solving from scratch");
            None
        }
    };

    let history = match stored {
        Some(history) => {
            let reached = history.last().map_or(0, |last| last.generation);
            if reached >= target_generation {
                info!(
                    reached,
                    target_generation, "stored history already reaches target"
                );
                return Ok(history);
            }
            info!(reached, target_generation, "resuming stored history");
            match solver::resume(history, target_generation) {
                Ok(history) => history,
                Err(e) => {
                    warn!(error = %e, "stored history is not resumable, solving from scratch");
                    solve_from_start(target_generation)?
                }
            }
        }
        None => solve_from_start(target_generation)?,
    };

    store.save(&history)?;
    Ok(history)
}

fn solve_from_start(target_generation: usize) -> Result<Vec<GridGeneration>, SolveError> {
    info!(target_generation, "solving from the starting layout");
    solver::solve(
        vec![Grid::starting()],
        target_generation,
        KnownStates::default(),
    )
}
