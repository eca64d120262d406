//! Grid generation: weighted random grids and forced QA outcomes

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridSize, Position};
use crate::symbols::{SymbolId, SymbolTable};

/// Generate a grid: every active cell gets an independent weighted pick.
pub fn generate_grid<R: Rng + ?Sized>(size: GridSize, table: &SymbolTable, rng: &mut R) -> Grid {
    Grid::filled(size, |_| table.pick(rng))
}

/// Deterministic grid setups for debugging and QA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForcedOutcome {
    /// 12-cell S7 cluster in the top-left corner
    BigCluster,
    /// No connected region of 5+
    DeadSpin,
    /// Removing cluster A lets gravity assemble cluster B
    CascadeChain,
    /// Three scatters on the corners
    ScatterTrigger,
}

impl ForcedOutcome {
    pub const ALL: [ForcedOutcome; 4] = [
        ForcedOutcome::BigCluster,
        ForcedOutcome::DeadSpin,
        ForcedOutcome::CascadeChain,
        ForcedOutcome::ScatterTrigger,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::BigCluster => "BIG_CLUSTER",
            Self::DeadSpin => "DEAD_SPIN",
            Self::CascadeChain => "CASCADE_CHAIN",
            Self::ScatterTrigger => "SCATTER_TRIGGER",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::BigCluster => "Places 12 same symbols for a guaranteed tier-2 cluster",
            Self::DeadSpin => "Ensures no clusters of 5+ exist",
            Self::CascadeChain => "Arranges symbols so removing one cluster creates another",
            Self::ScatterTrigger => "Places 3 scatters on the grid",
        }
    }

    /// Rewrite `grid` in place. Void cells are never touched.
    pub fn apply(self, grid: &mut Grid) -> &mut Grid {
        match self {
            Self::BigCluster => setup_big_cluster(grid),
            Self::DeadSpin => setup_dead_spin(grid),
            Self::CascadeChain => setup_cascade_chain(grid),
            Self::ScatterTrigger => setup_scatter_trigger(grid),
        }
        grid
    }
}

impl fmt::Display for ForcedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ForcedOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Self::ALL
            .iter()
            .find(|o| o.key().eq_ignore_ascii_case(&normalized))
            .copied()
            .ok_or_else(|| format!("unknown forced outcome: {s}"))
    }
}

fn setup_big_cluster(grid: &mut Grid) {
    const TARGET: SymbolId = SymbolId::NeutronCrystal;
    const FENCE: [SymbolId; 2] = [SymbolId::VoidShard, SymbolId::NebulaCore];

    for row in 0..3 {
        for col in 0..4 {
            grid.set(Position::new(row, col), TARGET);
        }
    }

    // Fence the block so neighbouring WILDs or S7s cannot grow it past 12
    for col in 0..4 {
        grid.set(Position::new(3, col), FENCE[col % 2]);
    }
    for row in 0..3 {
        grid.set(Position::new(row, 4), FENCE[row % 2]);
    }
}

fn setup_dead_spin(grid: &mut Grid) {
    const CYCLE: [SymbolId; 4] = [
        SymbolId::VoidShard,
        SymbolId::NebulaCore,
        SymbolId::PlasmaOrb,
        SymbolId::StellarFragment,
    ];

    // Horizontal neighbours differ by 1, vertical by dim (odd) modulo 4
    let dim = grid.dim();
    for pos in grid.active_positions() {
        grid.set(pos, CYCLE[(pos.row * dim + pos.col) % CYCLE.len()]);
    }
}

fn setup_cascade_chain(grid: &mut Grid) {
    const A: SymbolId = SymbolId::StellarFragment;
    const B: SymbolId = SymbolId::NebulaCore;
    const FILLER: [SymbolId; 2] = [SymbolId::VoidShard, SymbolId::PlasmaOrb];

    for pos in grid.active_positions() {
        grid.set(pos, FILLER[(pos.row + pos.col) % 2]);
    }

    // (col, height above the bottom row)
    let bottom = grid.dim() - 1;
    let place = |grid: &mut Grid, cells: &[(usize, usize)], symbol: SymbolId| {
        for &(col, height) in cells {
            grid.set(Position::new(bottom - height, col), symbol);
        }
    };

    place(grid, &[(1, 0), (1, 1), (1, 2), (2, 0), (2, 1)], A);
    place(grid, &[(0, 0), (0, 1), (1, 3), (1, 4), (2, 2)], B);
}

fn setup_scatter_trigger(grid: &mut Grid) {
    let last = grid.dim() - 1;
    for pos in [
        Position::new(0, 0),
        Position::new(0, last),
        Position::new(last, 0),
    ] {
        grid.set(pos, SymbolId::Scatter);
    }
}
