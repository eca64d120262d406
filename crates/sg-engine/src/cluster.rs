//! Cluster detection: orthogonal flood fill with WILD substitution

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Grid, Position};
use crate::symbols::SymbolId;

/// Minimum connected region size that pays
pub const MIN_CLUSTER_SIZE: usize = 5;

/// A winning connected region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Seed symbol (always a paying symbol)
    pub symbol: SymbolId,
    /// Member cells in discovery order
    pub cells: Vec<Position>,
    /// At least one WILD was absorbed
    pub has_wild: bool,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }
}

/// Find every winning cluster on a grid.
///
/// Cells are scanned in row-major order. WILDs never seed a region, they
/// only join one; SCATTERs never join. Visited marking is shared across
/// regions, so clusters never overlap.
pub fn find_clusters(grid: &Grid) -> Vec<Cluster> {
    let dim = grid.dim();
    let mut visited = vec![false; dim * dim];
    let mut clusters = Vec::new();

    for start in grid.active_positions() {
        if visited[start.row * dim + start.col] {
            continue;
        }
        let seed = match grid.get(start) {
            Cell::Symbol(s) if s.is_paying() => s,
            _ => continue,
        };

        let mut cells = Vec::new();
        let mut has_wild = false;
        let mut stack = vec![start];

        while let Some(pos) = stack.pop() {
            let idx = pos.row * dim + pos.col;
            if visited[idx] || grid.is_void(pos) {
                continue;
            }
            let symbol = match grid.get(pos) {
                Cell::Symbol(s) if s == seed || s.is_wild() => s,
                _ => continue,
            };

            visited[idx] = true;
            cells.push(pos);
            has_wild |= symbol.is_wild();
            stack.extend(pos.neighbors(dim));
        }

        if cells.len() >= MIN_CLUSTER_SIZE {
            clusters.push(Cluster {
                symbol: seed,
                cells,
                has_wild,
            });
        }
    }

    clusters
}

/// Count SCATTERs on a grid
pub fn count_scatters(grid: &Grid) -> usize {
    grid.count(SymbolId::Scatter)
}
