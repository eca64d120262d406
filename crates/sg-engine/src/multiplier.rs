//! Multiplier bubbles orbiting the grid perimeter
//!
//! Bubbles spawn from a gravitational surge (cluster of 12+) or the 25%
//! meter threshold. A bubble sitting on a removed cluster cell is consumed
//! and multiplies that cascade step's win; several bubbles multiply
//! together. Base-game bubbles expire after a few spins, bonus bubbles
//! persist.

use std::collections::HashSet;
use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{GridSize, Position};

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Bubble tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    /// Possible bubble values, picked uniformly
    pub values: Vec<u32>,
    /// Spins a base-game bubble survives
    pub base_lifespan: u32,
    /// Orbit advance per frame (radians)
    pub orbit_step: f64,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            values: vec![2, 3, 5, 10],
            base_lifespan: 5,
            orbit_step: 0.005,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUBBLE
// ═══════════════════════════════════════════════════════════════════════════════

/// A multiplier bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub id: u64,
    pub value: u32,
    /// Remaining spins, `None` when the bubble never expires
    pub lifespan: Option<u32>,
    /// Orbit angle in radians
    pub orbit_angle: f64,
    pub position: Position,
    /// False once consumed by an activation
    pub active: bool,
}

/// Rendering view of an active bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleSnapshot {
    pub id: u64,
    pub value: u32,
    pub row: usize,
    pub col: usize,
}

impl From<&Bubble> for BubbleSnapshot {
    fn from(b: &Bubble) -> Self {
        Self {
            id: b.id,
            value: b.value,
            row: b.position.row,
            col: b.position.col,
        }
    }
}

/// Result of an activation check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    /// Consumed bubbles
    pub bubbles: Vec<BubbleSnapshot>,
    /// Product of consumed values, 1 when none matched
    pub total_multiplier: u32,
}

impl Activation {
    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }
}

/// Map an orbit angle to a perimeter cell, clockwise from the top-left.
///
/// Top edge left to right, right edge top to bottom, bottom edge right to
/// left, left edge bottom to top.
pub fn perimeter_position(size: GridSize, angle: f64) -> Position {
    let n = size.dim();
    let perimeter = size.perimeter();
    let frac = angle.rem_euclid(TAU) / TAU;
    let idx = ((frac * perimeter as f64).floor() as usize) % perimeter;

    if idx < n {
        Position::new(0, idx)
    } else if idx < 2 * n - 1 {
        Position::new(idx - n + 1, n - 1)
    } else if idx < 3 * n - 2 {
        Position::new(n - 1, n - 1 - (idx - (2 * n - 1)))
    } else {
        Position::new(n - 1 - (idx - (3 * n - 2)), 0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYSTEM
// ═══════════════════════════════════════════════════════════════════════════════

/// Owns every live bubble
#[derive(Debug, Clone)]
pub struct MultiplierSystem {
    config: BubbleConfig,
    bubbles: Vec<Bubble>,
    next_id: u64,
    in_bonus: bool,
}

impl MultiplierSystem {
    pub fn new() -> Self {
        Self::with_config(BubbleConfig::default())
    }

    pub fn with_config(config: BubbleConfig) -> Self {
        Self {
            config,
            bubbles: Vec::new(),
            next_id: 0,
            in_bonus: false,
        }
    }

    pub fn config(&self) -> &BubbleConfig {
        &self.config
    }

    pub fn is_bonus(&self) -> bool {
        self.in_bonus
    }

    /// Every tracked bubble, consumed ones included until the next spin
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Spawn a bubble with a random value at a random orbit angle
    pub fn spawn_bubble<R: Rng + ?Sized>(&mut self, size: GridSize, rng: &mut R) -> BubbleSnapshot {
        let value = if self.config.values.is_empty() {
            2
        } else {
            self.config.values[rng.random_range(0..self.config.values.len())]
        };
        let orbit_angle = rng.random_range(0.0..TAU);
        self.insert(value, orbit_angle, size)
    }

    /// Spawn a bubble at a fixed value and angle
    pub fn insert(&mut self, value: u32, orbit_angle: f64, size: GridSize) -> BubbleSnapshot {
        let bubble = Bubble {
            id: self.next_id,
            value,
            lifespan: (!self.in_bonus).then_some(self.config.base_lifespan),
            orbit_angle,
            position: perimeter_position(size, orbit_angle),
            active: true,
        };
        self.next_id += 1;
        log::debug!("bubble {} spawned: x{} at {}", bubble.id, value, bubble.position);

        let snapshot = BubbleSnapshot::from(&bubble);
        self.bubbles.push(bubble);
        snapshot
    }

    /// Advance every active bubble along the perimeter
    pub fn update_orbits(&mut self, delta_angle: f64, size: GridSize) {
        for bubble in self.bubbles.iter_mut().filter(|b| b.active) {
            bubble.orbit_angle += delta_angle;
            bubble.position = perimeter_position(size, bubble.orbit_angle);
        }
    }

    /// Re-map every bubble onto a different grid size
    pub fn relocate(&mut self, size: GridSize) {
        self.update_orbits(0.0, size);
    }

    /// Consume active bubbles overlapping `cells` and multiply their values
    pub fn check_activation(&mut self, cells: &[Position]) -> Activation {
        let cells: HashSet<Position> = cells.iter().copied().collect();
        let mut consumed = Vec::new();
        let mut total_multiplier = 1u32;

        for bubble in self
            .bubbles
            .iter_mut()
            .filter(|b| b.active && cells.contains(&b.position))
        {
            bubble.active = false;
            total_multiplier = total_multiplier.saturating_mul(bubble.value);
            consumed.push(BubbleSnapshot::from(&*bubble));
        }

        if !consumed.is_empty() {
            log::debug!("{} bubbles activated, x{}", consumed.len(), total_multiplier);
        }
        Activation {
            bubbles: consumed,
            total_multiplier,
        }
    }

    /// Per-spin sweep: drop consumed bubbles, age the rest
    pub fn on_spin(&mut self) {
        self.bubbles.retain_mut(|b| {
            if !b.active {
                return false;
            }
            match b.lifespan.as_mut() {
                Some(left) => {
                    *left = left.saturating_sub(1);
                    *left > 0
                }
                None => true,
            }
        });
    }

    /// Double every active bubble (75% threshold)
    pub fn double_all(&mut self) -> usize {
        let mut doubled = 0;
        for bubble in self.bubbles.iter_mut().filter(|b| b.active) {
            bubble.value = bubble.value.saturating_mul(2);
            doubled += 1;
        }
        doubled
    }

    /// Bonus mode: bubbles stop expiring
    pub fn enter_bonus(&mut self) {
        self.in_bonus = true;
        for bubble in &mut self.bubbles {
            bubble.lifespan = None;
        }
    }

    pub fn exit_bonus(&mut self) {
        self.in_bonus = false;
    }

    pub fn clear(&mut self) {
        self.bubbles.clear();
    }

    pub fn active_bubbles(&self) -> Vec<BubbleSnapshot> {
        self.bubbles
            .iter()
            .filter(|b| b.active)
            .map(BubbleSnapshot::from)
            .collect()
    }
}

impl Default for MultiplierSystem {
    fn default() -> Self {
        Self::new()
    }
}
