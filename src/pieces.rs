//! Block definitions and per-shape movement rules.
//!
//! A block is a shape plus the origin of its top-left cell. Blocks are plain
//! `Copy` values; moving or mirroring one produces a new block.

use crate::error::{BlockError, DecodeError};
use crate::geometry::{mirror_column, step, CellSet, Coord, Direction};

/// The four block shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockType {
    /// 2x2, the piece that has to reach the exit.
    Big,
    /// 1x1.
    Small,
    /// One column wide, two rows high.
    Tall,
    /// Two columns wide, one row high.
    Wide,
}

impl BlockType {
    pub const fn width(self) -> i32 {
        match self {
            BlockType::Big | BlockType::Wide => 2,
            BlockType::Small | BlockType::Tall => 1,
        }
    }

    pub const fn height(self) -> i32 {
        match self {
            BlockType::Big | BlockType::Tall => 2,
            BlockType::Small | BlockType::Wide => 1,
        }
    }

    /// Persisted integer tag.
    pub const fn tag(self) -> u8 {
        match self {
            BlockType::Big => 0,
            BlockType::Small => 1,
            BlockType::Tall => 2,
            BlockType::Wide => 3,
        }
    }

    /// Single character used in identifiers and text rendering.
    pub const fn symbol(self) -> char {
        match self {
            BlockType::Big => 'B',
            BlockType::Small => 's',
            BlockType::Tall => 'T',
            BlockType::Wide => 'W',
        }
    }
}

impl TryFrom<u8> for BlockType {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(BlockType::Big),
            1 => Ok(BlockType::Small),
            2 => Ok(BlockType::Tall),
            3 => Ok(BlockType::Wide),
            _ => Err(DecodeError::InvalidBlockTypeTag { tag }),
        }
    }
}

/// A block placed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub kind: BlockType,
    /// Top-left occupied cell.
    pub origin: Coord,
}

impl Block {
    pub const fn new(kind: BlockType, origin: Coord) -> Self {
        Self { kind, origin }
    }

    /// Cells covered by this block, in row-major order.
    pub fn occupied_cells(&self) -> Vec<Coord> {
        let (x, y) = self.origin;
        let mut cells = Vec::with_capacity(4);
        for dy in 0..self.kind.height() {
            for dx in 0..self.kind.width() {
                cells.push((x + dx, y + dy));
            }
        }
        cells
    }

    /// Cells directly above the top edge.
    pub fn cells_above(&self) -> Vec<Coord> {
        let (x, y) = self.origin;
        (0..self.kind.width()).map(|dx| (x + dx, y - 1)).collect()
    }

    /// Cells directly below the bottom edge.
    pub fn cells_below(&self) -> Vec<Coord> {
        let (x, y) = self.origin;
        let below = y + self.kind.height();
        (0..self.kind.width()).map(|dx| (x + dx, below)).collect()
    }

    /// Cells directly left of the left edge.
    pub fn cells_left(&self) -> Vec<Coord> {
        let (x, y) = self.origin;
        (0..self.kind.height()).map(|dy| (x - 1, y + dy)).collect()
    }

    /// Cells directly right of the right edge.
    pub fn cells_right(&self) -> Vec<Coord> {
        let (x, y) = self.origin;
        let right = x + self.kind.width();
        (0..self.kind.height()).map(|dy| (right, y + dy)).collect()
    }

    /// Neighbour cells on the side facing `direction`.
    pub fn cells_toward(&self, direction: Direction) -> Vec<Coord> {
        match direction {
            Direction::Up => self.cells_above(),
            Direction::Down => self.cells_below(),
            Direction::Left => self.cells_left(),
            Direction::Right => self.cells_right(),
        }
    }

    /// Every cell whose vacancy could let this block move.
    pub fn surrounding_cells(&self) -> Vec<Coord> {
        Direction::ALL
            .iter()
            .flat_map(|&direction| self.cells_toward(direction))
            .collect()
    }

    /// Legal moves given the board's free cells, in `Direction::ALL` order.
    ///
    /// A two-cell side needs both neighbours free: the free cells found on
    /// that side must equal the full neighbour pair. A one-cell side only
    /// needs its single neighbour free.
    pub fn possible_directions(&self, free_cells: &CellSet) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&direction| {
                let side = self.cells_toward(direction);
                if side.len() == 1 {
                    return free_cells.contains(side[0]);
                }
                let free_side: Vec<Coord> = side
                    .iter()
                    .copied()
                    .filter(|&cell| free_cells.contains(cell))
                    .collect();
                free_side == side
            })
            .collect()
    }

    /// This block shifted one cell. The caller must have validated the move.
    pub const fn moved(&self, direction: Direction) -> Block {
        Block::new(self.kind, step(self.origin, direction))
    }

    /// This block reflected across the board's vertical centre line.
    pub fn mirrored(&self) -> Result<Block, BlockError> {
        let (x, y) = self.origin;
        let mirrored_x = mirror_column(x, self.kind.width()).ok_or(
            BlockError::InvalidMirrorColumn {
                kind: self.kind,
                x,
            },
        )?;
        Ok(Block::new(self.kind, (mirrored_x, y)))
    }
}

/// The classic starting layout.
///
/// ```text
/// T B B T
/// T B B T
/// T W W T
/// T s s T
/// s . . s
/// ```
pub const STARTING_BLOCKS: [Block; 10] = [
    Block::new(BlockType::Tall, (0, 0)),
    Block::new(BlockType::Big, (1, 0)),
    Block::new(BlockType::Tall, (3, 0)),
    Block::new(BlockType::Tall, (0, 2)),
    Block::new(BlockType::Wide, (1, 2)),
    Block::new(BlockType::Tall, (3, 2)),
    Block::new(BlockType::Small, (1, 3)),
    Block::new(BlockType::Small, (2, 3)),
    Block::new(BlockType::Small, (0, 4)),
    Block::new(BlockType::Small, (3, 4)),
];
