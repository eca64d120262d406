//! Spin outcome

use serde::{Deserialize, Serialize};

use crate::cascade::CascadeStep;
use crate::events::SpinEvent;
use crate::generator::ForcedOutcome;
use crate::grid::{Grid, GridSize, Position};
use crate::multiplier::Activation;
use crate::paytable::WinSummary;
use crate::state::Transition;

/// Complete result of one spin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Session-wide spin counter
    pub spin_index: u64,
    /// Bet amount
    pub bet: f64,
    /// Free spin inside bonus mode
    pub in_bonus: bool,
    /// Bonus spin number (1-based) when `in_bonus`
    pub bonus_spin: Option<u32>,
    /// Forced setup applied, if any
    pub forced: Option<ForcedOutcome>,
    pub grid_size: GridSize,
    /// Grid as landed, after forcing and void absorption
    pub initial_grid: Grid,
    /// Cells turned WILD by void absorption
    pub absorbed: Vec<Position>,
    pub scatter_count: usize,
    /// Spins added by a bonus retrigger
    pub retrigger_spins: u32,
    pub cascades: Vec<CascadeStep>,
    /// Per-step wins with bubble multipliers applied
    pub wins: WinSummary,
    /// Bubble activation per cascade step
    pub activations: Vec<Activation>,
    /// Meter value after the spin
    pub meter_value: f64,
    /// This spin entered Event Horizon
    pub event_horizon: bool,
    /// Bonus total, when this spin ended bonus mode
    pub bonus_total: Option<f64>,
    /// Bonus still running after this spin
    pub bonus_active_after: bool,
    /// Timestamped presentation events
    pub events: Vec<SpinEvent>,
}

impl SpinOutcome {
    pub fn total_win(&self) -> f64 {
        self.wins.total_win
    }

    pub fn is_win(&self) -> bool {
        self.wins.is_win()
    }

    pub fn win_ratio(&self) -> f64 {
        self.wins.win_ratio(self.bet)
    }

    pub fn cascade_count(&self) -> usize {
        self.cascades.len()
    }

    /// Grid after the last cascade
    pub fn final_grid(&self) -> &Grid {
        self.cascades
            .last()
            .map_or(&self.initial_grid, |step| &step.grid_after)
    }

    /// State machine calls that follow `start_spin` for this outcome
    pub fn transitions(&self) -> Vec<Transition> {
        let mut script = vec![Transition::SpinComplete];
        for _ in &self.cascades {
            script.push(Transition::StartCascade);
            script.push(Transition::CascadeComplete);
        }
        script.push(Transition::ShowWin);
        if self.event_horizon {
            script.push(Transition::StartEventHorizon);
            script.push(Transition::EnterBonus);
        } else {
            script.push(Transition::ReturnToIdle {
                in_bonus: self.bonus_active_after,
            });
        }
        script
    }

    /// Duration of the presentation timeline
    pub fn duration_ms(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.timestamp_ms)
    }
}
