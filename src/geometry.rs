//! Board geometry: dimensions, cell indexing, directions and reflection.
//!
//! The board is 4 columns by 5 rows. `y` grows downward, so row 0 is the top
//! and the exit gap sits below row 4, under columns 1 and 2.

/// A board cell as `(x, y)`.
pub type Coord = (i32, i32);

/// Number of columns.
pub const BOARD_WIDTH: i32 = 4;

/// Number of rows.
pub const BOARD_HEIGHT: i32 = 5;

/// Total number of cells on the board.
pub const BOARD_CELLS: usize = (BOARD_WIDTH * BOARD_HEIGHT) as usize;

/// Origin the big block has when it sits directly over the exit gap.
pub const EXIT_ORIGIN: Coord = (1, 3);

/// The two bottom-row cells directly above the exit gap.
pub const EXIT_CELLS: [Coord; 2] = [(1, 4), (2, 4)];

/// A one-cell move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions, in the order moves are enumerated.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// The `(dx, dy)` offset of one step in this direction.
    pub const fn offset(self) -> Coord {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Shifts a cell one step. Performs no bounds checking.
#[inline(always)]
pub const fn step((x, y): Coord, direction: Direction) -> Coord {
    let (dx, dy) = direction.offset();
    (x + dx, y + dy)
}

/// Returns true if the cell lies on the board.
#[inline(always)]
pub const fn in_bounds((x, y): Coord) -> bool {
    x >= 0 && x < BOARD_WIDTH && y >= 0 && y < BOARD_HEIGHT
}

/// Converts a cell to its row-major index.
#[inline(always)]
pub const fn coord_to_idx((x, y): Coord) -> usize {
    (y * BOARD_WIDTH + x) as usize
}

/// Converts a row-major index back to a cell.
#[inline(always)]
pub const fn idx_to_coord(cell_index: usize) -> Coord {
    (
        (cell_index as i32) % BOARD_WIDTH,
        (cell_index as i32) / BOARD_WIDTH,
    )
}

/// Sort key placing cells in row-major order (top row first, then left to right).
#[inline(always)]
pub const fn row_major_key((x, y): Coord) -> (i32, i32) {
    (y, x)
}

/// All board cells in row-major order.
pub fn all_cells() -> impl Iterator<Item = Coord> {
    (0..BOARD_CELLS).map(idx_to_coord)
}

/// Reflects an origin column across the board's vertical centre line.
///
/// A piece `width` columns wide at column `x` lands at
/// `BOARD_WIDTH - width - x`. Returns `None` when `x` is not a column such a
/// piece can occupy.
pub const fn mirror_column(x: i32, width: i32) -> Option<i32> {
    let last = BOARD_WIDTH - width;
    if x < 0 || x > last {
        None
    } else {
        Some(last - x)
    }
}

/// A set of board cells stored as a bitmask.
///
/// Bit `i` is set if the cell with row-major index `i` is in the set. Cells
/// off the board are never members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellSet(u32);

impl CellSet {
    /// Bitmask with every board cell set.
    pub const FULL: CellSet = CellSet((1 << BOARD_CELLS) - 1);

    pub const fn empty() -> Self {
        CellSet(0)
    }

    /// Adds a cell. Off-board cells are ignored.
    #[inline]
    pub fn insert(&mut self, cell: Coord) {
        if in_bounds(cell) {
            self.0 |= 1 << coord_to_idx(cell);
        }
    }

    #[inline]
    pub const fn contains(&self, cell: Coord) -> bool {
        in_bounds(cell) && self.0 & (1 << coord_to_idx(cell)) != 0
    }

    /// Cells that are in `self` but not in `other`.
    #[inline]
    pub const fn difference(&self, other: &CellSet) -> CellSet {
        CellSet(self.0 & !other.0)
    }

    #[inline]
    pub const fn is_disjoint(&self, other: &CellSet) -> bool {
        self.0 & other.0 == 0
    }

    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the member cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..BOARD_CELLS)
            .filter(|&cell_index| self.0 & (1 << cell_index) != 0)
            .map(idx_to_coord)
    }
}

impl FromIterator<Coord> for CellSet {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        let mut set = CellSet::empty();
        for cell in iter {
            set.insert(cell);
        }
        set
    }
}
