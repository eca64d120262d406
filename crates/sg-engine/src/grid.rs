//! Grid geometry, void core mask, and cell storage

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// Supported grid geometries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSize {
    /// 7×7 with a 2×2 void core
    Base,
    /// 9×9 with a 3×3 void core (bonus mode)
    Bonus,
}

impl GridSize {
    /// Side length
    pub fn dim(self) -> usize {
        match self {
            Self::Base => 7,
            Self::Bonus => 9,
        }
    }

    /// Map a side length back to a supported geometry
    pub fn from_dim(dim: usize) -> Option<Self> {
        match dim {
            7 => Some(Self::Base),
            9 => Some(Self::Bonus),
            _ => None,
        }
    }

    /// Is this cell part of the void core?
    pub fn is_void(self, row: usize, col: usize) -> bool {
        let (lo, hi) = match self {
            Self::Base => (3, 4),
            Self::Bonus => (3, 5),
        };
        (lo..=hi).contains(&row) && (lo..=hi).contains(&col)
    }

    /// Number of cells that can hold a symbol
    pub fn active_cell_count(self) -> usize {
        match self {
            Self::Base => 45,
            Self::Bonus => 72,
        }
    }

    /// All non-void positions in row-major order
    pub fn active_positions(self) -> impl Iterator<Item = Position> {
        let dim = self.dim();
        (0..dim * dim)
            .map(move |i| Position::new(i / dim, i % dim))
            .filter(move |p| !self.is_void(p.row, p.col))
    }

    /// Perimeter length in cells
    pub fn perimeter(self) -> usize {
        self.dim() * 4 - 4
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::Base
    }
}

/// Grid coordinate, row 0 is the top row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Orthogonal neighbours inside a `dim`×`dim` grid
    pub fn neighbors(self, dim: usize) -> impl Iterator<Item = Position> {
        let Position { row, col } = self;
        [
            (row.checked_sub(1), Some(col)),
            (Some(row + 1), Some(col)),
            (Some(row), col.checked_sub(1)),
            (Some(row), Some(col + 1)),
        ]
        .into_iter()
        .filter_map(move |(r, c)| match (r, c) {
            (Some(r), Some(c)) if r < dim && c < dim => Some(Position::new(r, c)),
            _ => None,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Pending fill
    Empty,
    /// Permanently excluded (void core)
    Void,
    /// Occupied by a symbol
    Symbol(SymbolId),
}

impl Cell {
    pub fn symbol(self) -> Option<SymbolId> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    pub fn is_void(self) -> bool {
        self == Self::Void
    }
}

/// Square symbol grid with a fixed void core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: GridSize,
    /// Row-major cells
    cells: Vec<Cell>,
}

impl Grid {
    /// Empty grid with the void core applied
    pub fn new(size: GridSize) -> Self {
        let dim = size.dim();
        let cells = (0..dim * dim)
            .map(|i| {
                if size.is_void(i / dim, i % dim) {
                    Cell::Void
                } else {
                    Cell::Empty
                }
            })
            .collect();
        Self { size, cells }
    }

    /// Grid with every active cell filled by `fill`
    pub fn filled(size: GridSize, mut fill: impl FnMut(Position) -> SymbolId) -> Self {
        let mut grid = Self::new(size);
        for pos in size.active_positions() {
            grid.set(pos, fill(pos));
        }
        grid
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn dim(&self) -> usize {
        self.size.dim()
    }

    fn index(&self, pos: Position) -> Option<usize> {
        let dim = self.dim();
        (pos.row < dim && pos.col < dim).then_some(pos.row * dim + pos.col)
    }

    /// Cell at a position (`Void` when out of bounds)
    pub fn get(&self, pos: Position) -> Cell {
        self.index(pos).map(|i| self.cells[i]).unwrap_or(Cell::Void)
    }

    /// Symbol at a position
    pub fn symbol_at(&self, pos: Position) -> Option<SymbolId> {
        self.get(pos).symbol()
    }

    /// Place a symbol. Void and out-of-bounds cells are never written.
    pub fn set(&mut self, pos: Position, symbol: SymbolId) -> bool {
        match self.index(pos) {
            Some(i) if !self.cells[i].is_void() => {
                self.cells[i] = Cell::Symbol(symbol);
                true
            }
            _ => false,
        }
    }

    /// Empty an active cell
    pub fn clear(&mut self, pos: Position) {
        if let Some(i) = self.index(pos) {
            if !self.cells[i].is_void() {
                self.cells[i] = Cell::Empty;
            }
        }
    }

    pub fn is_void(&self, pos: Position) -> bool {
        self.size.is_void(pos.row, pos.col)
    }

    /// Non-void positions in row-major order
    pub fn active_positions(&self) -> impl Iterator<Item = Position> + use<> {
        self.size.active_positions()
    }

    /// Number of cells holding `symbol`
    pub fn count(&self, symbol: SymbolId) -> usize {
        self.cells
            .iter()
            .filter(|c| c.symbol() == Some(symbol))
            .count()
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.symbol().is_some()).count()
    }

    /// True when every active cell holds a symbol
    pub fn is_settled(&self) -> bool {
        !self.cells.iter().any(|c| c.is_empty())
    }

    /// Rows as slices, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.dim())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => '.',
                    Cell::Void => '#',
                    Cell::Symbol(s) => s.code(),
                })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
