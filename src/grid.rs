//! Board configurations and one-step expansion.
//!
//! A `Grid` stores its blocks in canonical row-major origin order, so two
//! grids with the same occupancy have identical block sequences no matter how
//! they were built. Equality and hashing look at that sequence only; the
//! path-dependent fields (history, generation) are ignored.

use std::hash::{Hash, Hasher};

use crate::error::{BlockError, GoalError};
use crate::geometry::{
    coord_to_idx, in_bounds, row_major_key, CellSet, Coord, BOARD_CELLS, BOARD_HEIGHT,
    BOARD_WIDTH, EXIT_CELLS, EXIT_ORIGIN,
};
use crate::pieces::{Block, BlockType, STARTING_BLOCKS};

/// Canonical block sequence, used as the dedup key.
pub type GridKey = Box<[Block]>;

/// One full board configuration.
#[derive(Debug, Clone)]
pub struct Grid {
    blocks: Vec<Block>,
    free_cells: CellSet,
    movable_blocks: Vec<Block>,
    history: Vec<String>,
    generation: usize,
    identifier: String,
}

/// Sorts blocks into canonical row-major origin order.
pub fn canonicalize(blocks: &mut [Block]) {
    blocks.sort_by_key(|block| (row_major_key(block.origin), block.kind));
}

/// Describes the occupancy of every cell in row-major order.
///
/// Each occupied cell shows its block's symbol and each free cell shows `.`.
/// Distinct canonical block sequences always produce distinct strings.
pub fn encode_cells(blocks: &[Block]) -> String {
    let mut cells = ['.'; BOARD_CELLS];
    for block in blocks {
        for cell in block.occupied_cells() {
            if in_bounds(cell) {
                cells[coord_to_idx(cell)] = block.kind.symbol();
            }
        }
    }
    cells.iter().collect()
}

impl Grid {
    /// Builds a grid, canonicalizing the blocks and deriving free cells,
    /// movable blocks and the identifier.
    pub fn new(blocks: Vec<Block>, history: Vec<String>, generation: usize) -> Self {
        let identifier = {
            let mut sorted = blocks.clone();
            canonicalize(&mut sorted);
            encode_cells(&sorted)
        };
        Self::restore(blocks, history, generation, identifier)
    }

    /// Builds a grid keeping a previously assigned identifier.
    pub fn restore(
        mut blocks: Vec<Block>,
        history: Vec<String>,
        generation: usize,
        identifier: String,
    ) -> Self {
        canonicalize(&mut blocks);

        let occupied: CellSet = blocks.iter().flat_map(|block| block.occupied_cells()).collect();
        let free_cells = CellSet::FULL.difference(&occupied);

        let movable_blocks = blocks
            .iter()
            .copied()
            .filter(|block| {
                block
                    .surrounding_cells()
                    .into_iter()
                    .any(|cell| free_cells.contains(cell))
            })
            .collect();

        Self {
            blocks,
            free_cells,
            movable_blocks,
            history,
            generation,
            identifier,
        }
    }

    /// The classic starting layout at generation 0.
    pub fn starting() -> Self {
        Self::new(STARTING_BLOCKS.to_vec(), Vec::new(), 0)
    }

    /// Blocks in canonical order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn free_cells(&self) -> &CellSet {
        &self.free_cells
    }

    /// Blocks with at least one free neighbour cell.
    pub fn movable_blocks(&self) -> &[Block] {
        &self.movable_blocks
    }

    /// Identifiers of every ancestor, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Every cell covered by some block.
    pub fn occupied_cells(&self) -> CellSet {
        CellSet::FULL.difference(&self.free_cells)
    }

    /// The block covering `cell`, if any.
    pub fn block_at(&self, cell: Coord) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|block| block.occupied_cells().contains(&cell))
    }

    /// Every configuration one move away.
    pub fn possible_next_grids(&self) -> Vec<Grid> {
        self.movable_blocks
            .iter()
            .flat_map(|block| block.possible_next_grids(self))
            .collect()
    }

    fn big_block(&self) -> Result<&Block, GoalError> {
        let mut bigs = self
            .blocks
            .iter()
            .filter(|block| block.kind == BlockType::Big);
        match (bigs.next(), bigs.count()) {
            (Some(big), 0) => Ok(big),
            (first, rest) => Err(GoalError::WrongBigBlockCount {
                count: usize::from(first.is_some()) + rest,
            }),
        }
    }

    /// Goal test used by the solver.
    ///
    /// Solved when the big block sits over the exit, or when it is one row
    /// higher and the only free cells are the two exit-row cells below it.
    pub fn is_solved(&self) -> Result<bool, GoalError> {
        let big = self.big_block()?;
        let (exit_x, exit_y) = EXIT_ORIGIN;
        Ok(big.origin == EXIT_ORIGIN
            || (big.origin == (exit_x, exit_y - 1)
                && self.free_cells == EXIT_CELLS.into_iter().collect::<CellSet>()))
    }

    /// Strict goal test: the big block sits exactly over the exit.
    pub fn is_at_exit(&self) -> Result<bool, GoalError> {
        Ok(self.big_block()?.origin == EXIT_ORIGIN)
    }

    /// The blocks reflected across the vertical centre line, canonicalized.
    pub fn mirrored_blocks(&self) -> Result<Vec<Block>, BlockError> {
        let mut mirrored = self
            .blocks
            .iter()
            .map(Block::mirrored)
            .collect::<Result<Vec<_>, _>>()?;
        canonicalize(&mut mirrored);
        Ok(mirrored)
    }

    /// This grid reflected across the vertical centre line.
    ///
    /// History and generation carry over unchanged.
    pub fn mirror_grid(&self) -> Result<Grid, BlockError> {
        Ok(Grid::new(
            self.mirrored_blocks()?,
            self.history.clone(),
            self.generation,
        ))
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Eq for Grid {}

impl Hash for Grid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.blocks.hash(state);
    }
}

impl Block {
    /// One candidate grid per legal move of this block within `from`.
    pub fn possible_next_grids(&self, from: &Grid) -> Vec<Grid> {
        self.possible_directions(from.free_cells())
            .into_iter()
            .map(|direction| {
                let moved = self.moved(direction);
                let blocks = from
                    .blocks()
                    .iter()
                    .map(|block| if block == self { moved } else { *block })
                    .collect();
                let mut history = from.history().to_vec();
                history.push(from.identifier().to_string());
                Grid::new(blocks, history, from.generation() + 1)
            })
            .collect()
    }
}

/// Formats a grid as a framed board.
///
/// Walls are `#`, the exit gap below columns 1 and 2 is left open, and each
/// cell shows its block's symbol or `.` when free.
pub fn format_grid(grid: &Grid) -> String {
    let mut output = String::new();
    let wall_row: String = std::iter::repeat('#').take(BOARD_WIDTH as usize + 2).collect();

    output.push_str(&wall_row);
    output.push('\n');

    for y in 0..BOARD_HEIGHT {
        output.push('#');
        for x in 0..BOARD_WIDTH {
            let display_char = match grid.block_at((x, y)) {
                Some(block) => block.kind.symbol(),
                None => '.',
            };
            output.push(display_char);
        }
        output.push_str("#\n");
    }

    // exit gap
    output.push('#');
    for x in 0..BOARD_WIDTH {
        let under_exit = EXIT_CELLS.iter().any(|&(exit_x, _)| exit_x == x);
        output.push(if under_exit { ' ' } else { '#' });
    }
    output.push_str("#\n");

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(blocks: &[Block]) -> Grid {
        Grid::new(blocks.to_vec(), Vec::new(), 0)
    }

    fn big_one_row_above_exit(small_at: Coord) -> Grid {
        grid(&[
            Block::new(BlockType::Tall, (0, 0)),
            Block::new(BlockType::Tall, (0, 2)),
            Block::new(BlockType::Tall, (3, 0)),
            Block::new(BlockType::Tall, (3, 2)),
            Block::new(BlockType::Small, (3, 4)),
            Block::new(BlockType::Small, small_at),
            Block::new(BlockType::Wide, (1, 0)),
            Block::new(BlockType::Wide, (1, 1)),
            Block::new(BlockType::Big, (1, 2)),
        ])
    }

    #[test]
    fn test_starting_grid_derived_state() {
        let start = Grid::starting();
        let free: Vec<Coord> = start.free_cells().iter().collect();
        assert_eq!(free, vec![(1, 4), (2, 4)]);
        assert_eq!(
            start.movable_blocks(),
            &[
                Block::new(BlockType::Small, (1, 3)),
                Block::new(BlockType::Small, (2, 3)),
                Block::new(BlockType::Small, (0, 4)),
                Block::new(BlockType::Small, (3, 4)),
            ]
        );
        assert_eq!(start.identifier(), "TBBTTBBTTWWTTssTs..s");
        assert_eq!(start.generation(), 0);
        assert!(start.history().is_empty());
        assert_eq!(start.is_solved(), Ok(false));
    }

    #[test]
    fn test_free_and_occupied_cells_partition_board() {
        let start = Grid::starting();
        let occupied = start.occupied_cells();
        assert!(occupied.is_disjoint(start.free_cells()));
        assert_eq!(occupied.len() + start.free_cells().len(), BOARD_CELLS);
        assert_eq!(occupied.len(), 18);
    }

    #[test]
    fn test_construction_order_does_not_matter() {
        let mut reversed = STARTING_BLOCKS.to_vec();
        reversed.reverse();
        let from_reversed = Grid::new(reversed, vec!["elsewhere".to_string()], 7);
        assert_eq!(from_reversed, Grid::starting());
        assert_eq!(from_reversed.blocks(), Grid::starting().blocks());
        assert_eq!(from_reversed.identifier(), Grid::starting().identifier());
    }

    #[test]
    fn test_starting_grid_expansions() {
        let start = Grid::starting();
        let next = start.possible_next_grids();
        assert_eq!(next.len(), 4);
        for child in &next {
            assert_eq!(child.generation(), 1);
            assert_eq!(child.history(), &[start.identifier().to_string()]);
            assert_ne!(child, &start);
        }
    }

    #[test]
    fn test_immovable_block_has_no_next_grids() {
        let start = Grid::starting();
        let big = Block::new(BlockType::Big, (1, 0));
        assert!(big.possible_next_grids(&start).is_empty());
    }

    #[test]
    fn test_big_block_at_exit_is_solved() {
        let solved = grid(&[
            Block::new(BlockType::Tall, (0, 0)),
            Block::new(BlockType::Tall, (0, 2)),
            Block::new(BlockType::Small, (0, 4)),
            Block::new(BlockType::Tall, (3, 0)),
            Block::new(BlockType::Tall, (3, 2)),
            Block::new(BlockType::Small, (3, 4)),
            Block::new(BlockType::Wide, (1, 0)),
            Block::new(BlockType::Wide, (1, 1)),
            Block::new(BlockType::Big, (1, 3)),
        ]);
        assert_eq!(solved.is_solved(), Ok(true));
        assert_eq!(solved.is_at_exit(), Ok(true));
    }

    #[test]
    fn test_big_block_above_clear_exit_is_solved() {
        let clear = big_one_row_above_exit((0, 4));
        let free: Vec<Coord> = clear.free_cells().iter().collect();
        assert_eq!(free, vec![(1, 4), (2, 4)]);
        assert_eq!(clear.is_solved(), Ok(true));
        assert_eq!(clear.is_at_exit(), Ok(false));
    }

    #[test]
    fn test_big_block_above_blocked_exit_is_not_solved() {
        let blocked = big_one_row_above_exit((2, 4));
        let free: Vec<Coord> = blocked.free_cells().iter().collect();
        assert_eq!(free, vec![(0, 4), (1, 4)]);
        assert_eq!(blocked.is_solved(), Ok(false));
    }

    #[test]
    fn test_big_block_above_exit_with_extra_free_cells_is_not_solved() {
        let sparse = grid(&[Block::new(BlockType::Big, (1, 2))]);
        assert!(EXIT_CELLS.iter().all(|&cell| sparse.free_cells().contains(cell)));
        assert_eq!(sparse.free_cells().len(), 16);
        assert_eq!(sparse.is_solved(), Ok(false));

        let at_exit = grid(&[Block::new(BlockType::Big, EXIT_ORIGIN)]);
        assert_eq!(at_exit.is_solved(), Ok(true));
    }

    #[test]
    fn test_goal_test_requires_one_big_block() {
        let none = grid(&[Block::new(BlockType::Small, (0, 0))]);
        assert_eq!(
            none.is_solved(),
            Err(GoalError::WrongBigBlockCount { count: 0 })
        );

        let two = grid(&[
            Block::new(BlockType::Big, (0, 0)),
            Block::new(BlockType::Big, (2, 2)),
        ]);
        assert_eq!(
            two.is_solved(),
            Err(GoalError::WrongBigBlockCount { count: 2 })
        );
    }

    #[test]
    fn test_mirror_grid() {
        let start = Grid::starting();
        assert_eq!(start.mirror_grid(), Ok(start.clone()), "Start layout is symmetric");

        let lopsided = grid(&[
            Block::new(BlockType::Big, (0, 0)),
            Block::new(BlockType::Small, (3, 4)),
        ]);
        let mirrored = lopsided.mirror_grid().expect("legal grid mirrors");
        assert_eq!(
            mirrored.blocks(),
            &[
                Block::new(BlockType::Big, (2, 0)),
                Block::new(BlockType::Small, (0, 4)),
            ]
        );
        assert_eq!(mirrored.mirror_grid(), Ok(lopsided));
    }

    #[test]
    fn test_mirror_grid_fails_on_invalid_block() {
        let broken = grid(&[
            Block::new(BlockType::Big, (0, 0)),
            Block::new(BlockType::Wide, (3, 4)),
        ]);
        assert_eq!(
            broken.mirror_grid(),
            Err(BlockError::InvalidMirrorColumn {
                kind: BlockType::Wide,
                x: 3
            })
        );
    }

    #[test]
    fn test_equality_ignores_history_and_generation() {
        let a = Grid::new(STARTING_BLOCKS.to_vec(), Vec::new(), 0);
        let b = Grid::new(STARTING_BLOCKS.to_vec(), vec!["x".into(), "y".into()], 2);
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_block_at() {
        let start = Grid::starting();
        assert_eq!(
            start.block_at((2, 1)),
            Some(&Block::new(BlockType::Big, (1, 0)))
        );
        assert_eq!(start.block_at((1, 4)), None);
    }

    #[test]
    fn test_starting_grid_layout() {
        insta::assert_snapshot!(format_grid(&Grid::starting()), @r"
        ######
        #TBBT#
        #TBBT#
        #TWWT#
        #TssT#
        #s..s#
        ##  ##
        ");
    }
}
