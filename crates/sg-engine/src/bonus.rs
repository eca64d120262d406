//! Event Horizon bonus mode
//!
//! Free spins on the 9×9 grid with:
//! - Total spin cap (initial award and retriggers included)
//! - Scatter retrigger adding a fixed number of spins
//! - Void Absorption turning a share of dead cells into WILDs

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cluster::count_scatters;
use crate::grid::{Grid, GridSize, Position};
use crate::symbols::SymbolId;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Bonus mode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    /// Spins awarded on entry
    pub initial_spins: u32,
    /// Cap on total spins per bonus round
    pub max_spins: u32,
    /// Base-game scatters that trigger the bonus
    pub trigger_scatters: usize,
    /// Bonus scatters needed to retrigger
    pub retrigger_scatters: usize,
    /// Spins added on retrigger
    pub retrigger_spins: u32,
    /// Per-cell WILD conversion probability
    pub absorption_rate: f64,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            initial_spins: 10,
            max_spins: 20,
            trigger_scatters: 3,
            retrigger_scatters: 2,
            retrigger_spins: 3,
            absorption_rate: 0.15,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Bonus mode runtime
#[derive(Debug, Clone, Default)]
pub struct BonusMode {
    config: BonusConfig,
    active: bool,
    spins_remaining: u32,
    spins_used: u32,
    total_win: f64,
}

impl BonusMode {
    pub fn new() -> Self {
        Self::with_config(BonusConfig::default())
    }

    pub fn with_config(config: BonusConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &BonusConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn spins_remaining(&self) -> u32 {
        self.spins_remaining
    }

    pub fn spins_used(&self) -> u32 {
        self.spins_used
    }

    /// Win accumulated this round
    pub fn total_win(&self) -> f64 {
        self.total_win
    }

    /// 9×9 while active
    pub fn grid_size(&self) -> GridSize {
        if self.active { GridSize::Bonus } else { GridSize::Base }
    }

    /// Enter bonus mode. The award is capped at `max_spins`.
    pub fn start(&mut self, initial_spins: u32) {
        self.active = true;
        self.spins_remaining = initial_spins.min(self.config.max_spins);
        self.spins_used = 0;
        self.total_win = 0.0;
        log::info!("bonus started with {} spins", self.spins_remaining);
    }

    /// Consume one spin. Returns false when none are left.
    pub fn use_spin(&mut self) -> bool {
        if !self.active || self.spins_remaining == 0 {
            return false;
        }
        self.spins_remaining -= 1;
        self.spins_used += 1;
        true
    }

    /// Add spins for enough scatters. Returns the spins actually added.
    pub fn check_retrigger(&mut self, grid: &Grid) -> u32 {
        if !self.active || count_scatters(grid) < self.config.retrigger_scatters {
            return 0;
        }
        let headroom = self.config.max_spins.saturating_sub(self.spins_used);
        let before = self.spins_remaining;
        self.spins_remaining = (before + self.config.retrigger_spins).min(headroom);
        let added = self.spins_remaining.saturating_sub(before);
        log::debug!("bonus retrigger: +{added} spins");
        added
    }

    /// Convert dead cells to WILD, skipping `exclude`, WILDs and SCATTERs
    pub fn apply_void_absorption<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        exclude: &HashSet<Position>,
        rng: &mut R,
    ) -> Vec<Position> {
        let rate = self.config.absorption_rate.clamp(0.0, 1.0);
        let mut converted = Vec::new();

        for pos in grid.active_positions() {
            if exclude.contains(&pos) {
                continue;
            }
            match grid.symbol_at(pos) {
                Some(s) if s.is_wild() || s.is_scatter() => continue,
                None => continue,
                Some(_) => {}
            }
            if rng.random_bool(rate) {
                grid.set(pos, SymbolId::Wild);
                converted.push(pos);
            }
        }
        converted
    }

    pub fn add_win(&mut self, amount: f64) {
        self.total_win += amount;
    }

    /// Leave bonus mode. Returns the round's total win.
    pub fn end(&mut self) -> f64 {
        let total = self.total_win;
        log::info!("bonus ended after {} spins, total win {total:.2}", self.spins_used);
        self.active = false;
        self.total_win = 0.0;
        self.spins_remaining = 0;
        self.spins_used = 0;
        total
    }

    pub fn is_complete(&self) -> bool {
        self.spins_remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ForcedOutcome;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grid_with_scatters(count: usize) -> Grid {
        let mut grid = Grid::new(GridSize::Bonus);
        ForcedOutcome::DeadSpin.apply(&mut grid);
        for col in 0..count {
            grid.set(Position::new(0, col), SymbolId::Scatter);
        }
        grid
    }

    #[test]
    fn test_start_caps_initial() {
        let mut bonus = BonusMode::new();
        bonus.start(50);
        assert_eq!(bonus.spins_remaining(), 20);
        assert_eq!(bonus.grid_size(), GridSize::Bonus);
    }

    #[test]
    fn test_use_spin_until_empty() {
        let mut bonus = BonusMode::new();
        assert!(!bonus.use_spin());
        bonus.start(2);
        assert!(bonus.use_spin());
        assert!(bonus.use_spin());
        assert!(!bonus.use_spin());
        assert!(bonus.is_complete());
        assert_eq!(bonus.spins_used(), 2);
    }

    #[test]
    fn test_retrigger_adds_three() {
        let mut bonus = BonusMode::new();
        bonus.start(10);
        bonus.use_spin();
        assert_eq!(bonus.check_retrigger(&grid_with_scatters(1)), 0);
        assert_eq!(bonus.check_retrigger(&grid_with_scatters(2)), 3);
        assert_eq!(bonus.spins_remaining(), 12);
    }

    #[test]
    fn test_retrigger_respects_cap() {
        let mut bonus = BonusMode::new();
        bonus.start(10);
        for _ in 0..2 {
            bonus.use_spin();
        }
        // used 2, remaining 8; cap leaves room for 18
        assert_eq!(bonus.check_retrigger(&grid_with_scatters(3)), 3);
        assert_eq!(bonus.check_retrigger(&grid_with_scatters(3)), 3);
        assert_eq!(bonus.check_retrigger(&grid_with_scatters(3)), 3);
        assert_eq!(bonus.check_retrigger(&grid_with_scatters(3)), 1);
        assert_eq!(bonus.check_retrigger(&grid_with_scatters(3)), 0);
        assert_eq!(bonus.spins_used() + bonus.spins_remaining(), 20);
    }

    #[test]
    fn test_void_absorption_rules() {
        let mut bonus = BonusMode::with_config(BonusConfig {
            absorption_rate: 1.0,
            ..Default::default()
        });
        bonus.start(10);

        let mut grid = grid_with_scatters(2);
        let exclude: HashSet<Position> = [Position::new(8, 8)].into_iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let converted = bonus.apply_void_absorption(&mut grid, &exclude, &mut rng);

        assert_eq!(converted.len(), 72 - 2 - 1);
        assert_eq!(grid.count(SymbolId::Scatter), 2);
        assert_ne!(grid.symbol_at(Position::new(8, 8)), Some(SymbolId::Wild));
        assert!(converted.iter().all(|p| !grid.is_void(*p)));
    }

    #[test]
    fn test_void_absorption_rate_zero() {
        let bonus = BonusMode::with_config(BonusConfig {
            absorption_rate: 0.0,
            ..Default::default()
        });
        let mut grid = grid_with_scatters(0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(bonus
            .apply_void_absorption(&mut grid, &HashSet::new(), &mut rng)
            .is_empty());
    }

    #[test]
    fn test_end_returns_total() {
        let mut bonus = BonusMode::new();
        bonus.start(10);
        bonus.add_win(12.5);
        bonus.add_win(7.5);
        assert_relative_eq!(bonus.end(), 20.0);
        assert!(!bonus.is_active());
        assert_eq!(bonus.grid_size(), GridSize::Base);
        assert_relative_eq!(bonus.total_win(), 0.0);
    }
}
