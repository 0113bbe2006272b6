//! Generational breadth-first solver.
//!
//! Each round expands every grid in the current frontier by one move and
//! keeps only candidates that are new up to left-right reflection:
//! - the candidate must not equal a known state or a known mirror state
//! - the candidate's own mirror must not equal either of those either
//!
//! Accepted candidates form the next frontier. The search halts at the
//! generation limit, when the frontier runs dry, or at the first frontier
//! that contains a solved grid.

use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::error::{BlockError, GoalError, SolveError};
use crate::grid::{Grid, GridKey};
use crate::pieces::Block;

/// One frontier snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridGeneration {
    pub generation: usize,
    pub grids: Vec<Grid>,
}

/// Every state visited so far, plus the mirror of every accepted state.
#[derive(Debug, Clone, Default)]
pub struct KnownStates {
    states: FxHashSet<GridKey>,
    mirrors: FxHashSet<GridKey>,
}

impl KnownStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Known sets for a stored history: every grid is known and the mirror
    /// of every grid is a known mirror.
    pub fn from_history(history: &[GridGeneration]) -> Result<Self, BlockError> {
        let mut known = Self::new();
        for grid in history.iter().flat_map(|generation| &generation.grids) {
            known.states.insert(grid.blocks().into());
            known.mirrors.insert(grid.mirrored_blocks()?.into_boxed_slice());
        }
        Ok(known)
    }

    /// Marks a state as visited without recording its mirror.
    pub fn insert_state(&mut self, blocks: &[Block]) -> bool {
        self.states.insert(blocks.into())
    }

    /// Records a mirror state.
    pub fn insert_mirror(&mut self, blocks: &[Block]) -> bool {
        self.mirrors.insert(blocks.into())
    }

    pub fn contains_state(&self, blocks: &[Block]) -> bool {
        self.states.contains(blocks)
    }

    pub fn contains_mirror(&self, blocks: &[Block]) -> bool {
        self.mirrors.contains(blocks)
    }

    /// True if `blocks` matches any known state or known mirror state.
    pub fn contains(&self, blocks: &[Block]) -> bool {
        self.contains_state(blocks) || self.contains_mirror(blocks)
    }

    /// Accepts `candidate` if neither it nor its mirror has been seen.
    ///
    /// On acceptance the candidate joins the known states and its mirror
    /// joins the known mirrors. Returns whether it was accepted.
    pub fn admit(&mut self, candidate: &Grid) -> Result<bool, BlockError> {
        if self.contains(candidate.blocks()) {
            return Ok(false);
        }

        let mirror = candidate.mirrored_blocks()?;
        if self.contains(&mirror) {
            return Ok(false);
        }

        self.states.insert(candidate.blocks().into());
        self.mirrors.insert(mirror.into_boxed_slice());
        Ok(true)
    }

    /// Number of known states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The current generation reached the requested limit.
    GenerationLimit,
    /// No new states were found.
    Exhausted,
    /// The current frontier contains a solved grid.
    Solved,
}

/// Outcome of a single solver round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advanced,
    Halted(HaltReason),
}

/// Search state carried from one generation to the next.
///
/// The frontier is always the last recorded generation.
pub struct Solver {
    history: Vec<GridGeneration>,
    generation: usize,
    known: KnownStates,
    started: Instant,
}

impl Solver {
    /// Starts a search from `starting_states`.
    ///
    /// The frontier keeps the generation its grids carry, so the starting
    /// layout is generation 0 and a frontier taken from the middle of a run
    /// keeps its place in the numbering.
    pub fn new(starting_states: Vec<Grid>, known: KnownStates) -> Self {
        let generation = starting_states.first().map_or(0, Grid::generation);
        let history = if starting_states.is_empty() {
            Vec::new()
        } else {
            vec![GridGeneration {
                generation,
                grids: starting_states,
            }]
        };

        Self {
            history,
            generation,
            known,
            started: Instant::now(),
        }
    }

    /// Continues a search from a stored history.
    ///
    /// The last generation becomes the frontier and every stored grid (and
    /// its mirror) is treated as already visited.
    pub fn resume(history: Vec<GridGeneration>) -> Result<Self, BlockError> {
        let known = KnownStates::from_history(&history)?;
        let generation = history.last().map_or(0, |last| last.generation);
        debug!(
            generation,
            known = known.len(),
            "resuming search from stored history"
        );

        Ok(Self {
            history,
            generation,
            known,
            started: Instant::now(),
        })
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn frontier(&self) -> &[Grid] {
        self.history
            .last()
            .map(|last| last.grids.as_slice())
            .unwrap_or(&[])
    }

    pub fn history(&self) -> &[GridGeneration] {
        &self.history
    }

    pub fn into_history(self) -> Vec<GridGeneration> {
        self.history
    }

    /// Returns why the search should stop before expanding the frontier, if it should.
    pub fn halt_reason(&self, generation_limit: usize) -> Result<Option<HaltReason>, GoalError> {
        if self.generation >= generation_limit {
            return Ok(Some(HaltReason::GenerationLimit));
        }

        let frontier = self.frontier();
        if frontier.is_empty() {
            return Ok(Some(HaltReason::Exhausted));
        }

        for grid in frontier {
            if grid.is_solved()? {
                return Ok(Some(HaltReason::Solved));
            }
        }

        Ok(None)
    }

    /// Expands the frontier by one generation, or reports why it cannot.
    pub fn step(&mut self, generation_limit: usize) -> Result<Step, SolveError> {
        if let Some(reason) = self.halt_reason(generation_limit)? {
            info!(generation = self.generation, ?reason, "search halted");
            return Ok(Step::Halted(reason));
        }

        let round_started = Instant::now();
        let frontier = match self.history.last() {
            Some(last) => &last.grids,
            None => return Ok(Step::Halted(HaltReason::Exhausted)),
        };

        // the frontier itself must never be re-admitted
        for grid in frontier {
            self.known.insert_state(grid.blocks());
        }

        let mut next_frontier = Vec::new();
        for grid in frontier {
            for candidate in grid.possible_next_grids() {
                if self.known.admit(&candidate)? {
                    next_frontier.push(candidate);
                }
            }
        }

        self.generation += 1;
        info!(
            generation = self.generation,
            grids = next_frontier.len(),
            known = self.known.len(),
            round_ms = round_started.elapsed().as_millis() as u64,
            total_ms = self.started.elapsed().as_millis() as u64,
            "expanded generation"
        );

        self.history.push(GridGeneration {
            generation: self.generation,
            grids: next_frontier,
        });

        Ok(Step::Advanced)
    }

    /// Steps until the search halts and returns the full history.
    pub fn run(mut self, generation_limit: usize) -> Result<Vec<GridGeneration>, SolveError> {
        while self.step(generation_limit)? == Step::Advanced {}
        Ok(self.into_history())
    }
}

/// Solves from `starting_states` up to `generation_limit`.
///
/// `known` seeds the visited sets; pass `KnownStates::default()` for a fresh
/// search. Returns every generation from the frontier's own onward.
pub fn solve(
    starting_states: Vec<Grid>,
    generation_limit: usize,
    known: KnownStates,
) -> Result<Vec<GridGeneration>, SolveError> {
    Solver::new(starting_states, known).run(generation_limit)
}

/// Continues a stored history up to `generation_limit`, returning the
/// extended history.
pub fn resume(
    history: Vec<GridGeneration>,
    generation_limit: usize,
) -> Result<Vec<GridGeneration>, SolveError> {
    Solver::resume(history)?.run(generation_limit)
}

/// Finds the first solved grid in `history` and returns every grid on the
/// path to it, oldest first.
///
/// Returns `None` when no grid is solved or an ancestor is missing from the
/// history.
pub fn solution_path(history: &[GridGeneration]) -> Result<Option<Vec<&Grid>>, GoalError> {
    let mut solved = None;
    'search: for generation in history {
        for grid in &generation.grids {
            if grid.is_solved()? {
                solved = Some(grid);
                break 'search;
            }
        }
    }
    let Some(solved) = solved else {
        return Ok(None);
    };

    let by_generation: FxHashMap<usize, &GridGeneration> = history
        .iter()
        .map(|generation| (generation.generation, generation))
        .collect();

    let Some(first_generation) = solved.generation().checked_sub(solved.history().len()) else {
        return Ok(None);
    };
    let mut path = Vec::with_capacity(solved.history().len() + 1);
    for (offset, identifier) in solved.history().iter().enumerate() {
        let ancestor = by_generation
            .get(&(first_generation + offset))
            .and_then(|generation| {
                generation
                    .grids
                    .iter()
                    .find(|grid| grid.identifier() == identifier)
            });
        match ancestor {
            Some(grid) => path.push(grid),
            None => return Ok(None),
        }
    }
    path.push(solved);

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::BlockType;

    fn lone_big(origin: (i32, i32)) -> Grid {
        Grid::new(vec![Block::new(BlockType::Big, origin)], Vec::new(), 0)
    }

    fn lopsided() -> Grid {
        Grid::new(
            vec![
                Block::new(BlockType::Big, (0, 0)),
                Block::new(BlockType::Small, (3, 4)),
            ],
            Vec::new(),
            0,
        )
    }

    #[test]
    fn test_admit_rejects_known_state() {
        let candidate = lopsided();
        let mut known = KnownStates::new();
        known.insert_state(candidate.blocks());
        assert_eq!(known.admit(&candidate), Ok(false));
    }

    #[test]
    fn test_admit_rejects_known_mirror_state() {
        let candidate = lopsided();
        let mut known = KnownStates::new();
        known.insert_mirror(candidate.blocks());
        assert_eq!(known.admit(&candidate), Ok(false));
    }

    #[test]
    fn test_admit_rejects_mirror_of_known_state() {
        let candidate = lopsided();
        let mirror = candidate.mirrored_blocks().unwrap();
        let mut known = KnownStates::new();
        known.insert_state(&mirror);
        assert!(!known.contains(candidate.blocks()));
        assert_eq!(known.admit(&candidate), Ok(false));
    }

    #[test]
    fn test_admit_rejects_mirror_of_known_mirror_state() {
        let candidate = lopsided();
        let mirror = candidate.mirrored_blocks().unwrap();
        let mut known = KnownStates::new();
        known.insert_mirror(&mirror);
        assert!(!known.contains(candidate.blocks()));
        assert_eq!(known.admit(&candidate), Ok(false));
    }

    #[test]
    fn test_admit_records_state_and_mirror() {
        let candidate = lopsided();
        let mirror = candidate.mirrored_blocks().unwrap();
        let mut known = KnownStates::new();
        assert!(known.is_empty());

        assert_eq!(known.admit(&candidate), Ok(true));
        assert!(!known.is_empty());
        assert_eq!(known.len(), 1);
        assert!(known.contains_state(candidate.blocks()));
        assert!(known.contains_mirror(&mirror));
        assert!(!known.contains_state(&mirror));
        assert_eq!(known.admit(&candidate), Ok(false), "second admission");
    }

    #[test]
    fn test_empty_frontier_returns_prior_history() {
        let history = solve(Vec::new(), 10, KnownStates::default()).unwrap();
        assert!(history.is_empty());

        let stored = vec![GridGeneration {
            generation: 3,
            grids: Vec::new(),
        }];
        assert_eq!(resume(stored.clone(), 10), Ok(stored));
    }

    #[test]
    fn test_generation_limit_zero_records_starting_frontier() {
        let history = solve(vec![Grid::starting()], 0, KnownStates::default()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].generation, 0);
        assert_eq!(history[0].grids, vec![Grid::starting()]);
    }

    #[test]
    fn test_classic_layout_first_generations() {
        let history = solve(vec![Grid::starting()], 2, KnownStates::default()).unwrap();
        let counts: Vec<usize> = history.iter().map(|g| g.grids.len()).collect();
        assert_eq!(counts, vec![1, 2, 6]);

        let generations: Vec<usize> = history.iter().map(|g| g.generation).collect();
        assert_eq!(generations, vec![0, 1, 2]);

        for grid in &history[2].grids {
            assert_eq!(grid.generation(), 2);
            assert_eq!(grid.history().len(), 2);
            assert_eq!(grid.history()[0], Grid::starting().identifier());
        }
    }

    #[test]
    fn test_stops_at_first_solved_generation() {
        let mut solver = Solver::new(vec![lone_big((1, 0))], KnownStates::default());
        assert_eq!(solver.step(100), Ok(Step::Advanced));
        assert_eq!(solver.step(100), Ok(Step::Advanced));
        assert_eq!(solver.step(100), Ok(Step::Advanced));
        assert_eq!(solver.step(100), Ok(Step::Halted(HaltReason::Solved)));
        assert_eq!(solver.generation(), 3);

        // (1, 2) leaves sixteen free cells, so only the exit itself counts
        let frontier: Vec<&Block> = solver.frontier().iter().map(|g| &g.blocks()[0]).collect();
        assert_eq!(
            frontier,
            vec![
                &Block::new(BlockType::Big, (1, 3)),
                &Block::new(BlockType::Big, (0, 2)),
            ]
        );
    }

    #[test]
    fn test_solution_path_follows_history() {
        let history = solve(vec![lone_big((1, 0))], 100, KnownStates::default()).unwrap();
        assert_eq!(history.len(), 4);

        let path = solution_path(&history).unwrap().expect("solved grid in history");
        let origins: Vec<(i32, i32)> = path.iter().map(|grid| grid.blocks()[0].origin).collect();
        assert_eq!(origins, vec![(1, 0), (1, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_mid_run_frontier_keeps_its_generation() {
        let first = solve(vec![lone_big((1, 0))], 1, KnownStates::default()).unwrap();
        let frontier = first[1].grids.clone();
        let known = KnownStates::from_history(&first[..1]).unwrap();

        let continued = solve(frontier, 100, known).unwrap();
        let generations: Vec<usize> = continued.iter().map(|g| g.generation).collect();
        assert_eq!(generations, vec![1, 2, 3]);
        for generation in &continued {
            for grid in &generation.grids {
                assert_eq!(
                    grid.generation(),
                    generation.generation,
                    "grid {} mislabelled",
                    grid.identifier()
                );
            }
        }

        let mut history = first[..1].to_vec();
        history.extend(continued);
        let path = solution_path(&history).unwrap().expect("solved grid in history");
        let origins: Vec<(i32, i32)> = path.iter().map(|grid| grid.blocks()[0].origin).collect();
        assert_eq!(origins, vec![(1, 0), (1, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_solution_path_without_solved_grid() {
        let history = solve(vec![Grid::starting()], 3, KnownStates::default()).unwrap();
        assert_eq!(solution_path(&history), Ok(None));
    }

    #[test]
    fn test_invalid_mirror_aborts_solve() {
        let broken = Grid::new(
            vec![
                Block::new(BlockType::Big, (0, 0)),
                Block::new(BlockType::Wide, (3, 4)),
            ],
            Vec::new(),
            0,
        );
        assert_eq!(
            solve(vec![broken], 5, KnownStates::default()),
            Err(SolveError::Mirror(BlockError::InvalidMirrorColumn {
                kind: BlockType::Wide,
                x: 3
            }))
        );
    }

    #[test]
    fn test_wrong_big_block_count_aborts_solve() {
        let no_big = Grid::new(vec![Block::new(BlockType::Small, (0, 0))], Vec::new(), 0);
        assert_eq!(
            solve(vec![no_big], 5, KnownStates::default()),
            Err(SolveError::Goal(GoalError::WrongBigBlockCount { count: 0 }))
        );
    }
}
