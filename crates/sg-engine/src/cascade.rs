//! Cascade resolution: remove, settle, respawn, re-detect

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, find_clusters};
use crate::grid::{Grid, Position};
use crate::symbols::{SymbolId, SymbolTable};

/// Safety cap on cascade iterations per spin
pub const DEFAULT_MAX_CASCADES: usize = 50;

/// A symbol falling under gravity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleMove {
    pub from: Position,
    pub to: Position,
    pub symbol: SymbolId,
}

/// A freshly spawned symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedCell {
    pub position: Position,
    pub symbol: SymbolId,
}

/// One resolution iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// Clusters found on the grid entering this step
    pub clusters: Vec<Cluster>,
    /// Union of cluster cells, row-major
    pub removed: Vec<Position>,
    /// Gravity moves, column by column, bottom-up
    pub moves: Vec<SettleMove>,
    /// Refills, row-major
    pub spawned: Vec<SpawnedCell>,
    /// Grid after settle and refill
    pub grid_after: Grid,
}

impl CascadeStep {
    /// Largest cluster in this step
    pub fn largest_cluster(&self) -> usize {
        self.clusters.iter().map(Cluster::size).max().unwrap_or(0)
    }
}

/// Resolve every cascade starting from `grid`.
///
/// Returns an empty sequence when the grid has no winning cluster. Stops
/// after `max_steps` iterations even if clusters remain.
pub fn resolve_cascades<R: Rng + ?Sized>(
    grid: &Grid,
    table: &SymbolTable,
    max_steps: usize,
    rng: &mut R,
) -> Vec<CascadeStep> {
    let mut steps: Vec<CascadeStep> = Vec::new();
    let mut grid = grid.clone();

    while steps.len() < max_steps {
        let clusters = find_clusters(&grid);
        if clusters.is_empty() {
            return steps;
        }

        let removed: Vec<Position> = clusters
            .iter()
            .flat_map(|c| c.cells.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for &pos in &removed {
            grid.clear(pos);
        }

        let moves = settle(&mut grid);
        let spawned = refill(&mut grid, table, rng);

        log::trace!(
            "cascade {}: {} clusters, {} removed, {} moved",
            steps.len(),
            clusters.len(),
            removed.len(),
            moves.len()
        );

        steps.push(CascadeStep {
            clusters,
            removed,
            moves,
            spawned,
            grid_after: grid.clone(),
        });
    }

    if !find_clusters(&grid).is_empty() {
        log::warn!("cascade cap of {max_steps} reached with clusters remaining");
    }
    steps
}

/// Gravity-settle every column.
///
/// Each column is split into contiguous non-void runs; symbols compact
/// toward the bottom of their own run and never cross a void cell.
pub fn settle(grid: &mut Grid) -> Vec<SettleMove> {
    let dim = grid.dim();
    let mut moves = Vec::new();

    for col in 0..dim {
        let mut run: Vec<usize> = Vec::with_capacity(dim);
        for row in (0..dim).rev() {
            if grid.is_void(Position::new(row, col)) {
                settle_run(grid, col, &run, &mut moves);
                run.clear();
            } else {
                run.push(row);
            }
        }
        settle_run(grid, col, &run, &mut moves);
    }

    moves
}

/// `run` lists rows bottom-up
fn settle_run(grid: &mut Grid, col: usize, run: &[usize], moves: &mut Vec<SettleMove>) {
    let mut write = 0;
    for &row in run {
        let from = Position::new(row, col);
        let Some(symbol) = grid.symbol_at(from) else {
            continue;
        };
        let to = Position::new(run[write], col);
        if to != from {
            grid.set(to, symbol);
            grid.clear(from);
            moves.push(SettleMove { from, to, symbol });
        }
        write += 1;
    }
}

/// Fill every empty active cell with a weighted pick
pub fn refill<R: Rng + ?Sized>(grid: &mut Grid, table: &SymbolTable, rng: &mut R) -> Vec<SpawnedCell> {
    let mut spawned = Vec::new();
    for position in grid.active_positions() {
        if grid.get(position).is_empty() {
            let symbol = table.pick(rng);
            grid.set(position, symbol);
            spawned.push(SpawnedCell { position, symbol });
        }
    }
    spawned
}
