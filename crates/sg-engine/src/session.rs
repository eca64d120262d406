//! Game session: owns every subsystem and resolves spins
//!
//! One spin runs start to finish synchronously: generate, absorb, check
//! scatters, cascade, pay, charge the meter, settle bonus bookkeeping and
//! record the presentation timeline. The state machine is left in
//! SPINNING; drivers replay [`SpinOutcome::transitions`] (or call
//! [`GameSession::play_through`]) while they present the result.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::bonus::BonusMode;
use crate::cascade::resolve_cascades;
use crate::cluster::{count_scatters, find_clusters};
use crate::config::GameConfig;
use crate::error::ConfigResult;
use crate::events::{BubbleCause, SpinEventKind, build_timeline};
use crate::generator::{ForcedOutcome, generate_grid};
use crate::grid::GridSize;
use crate::meter::{SingularityMeter, THRESHOLDS};
use crate::multiplier::MultiplierSystem;
use crate::paytable::PayTable;
use crate::spin::SpinOutcome;
use crate::state::GameStateMachine;
use crate::timing::{TimestampGenerator, TimingProfile};

/// Cluster size that spawns a bubble on its own
pub const SURGE_CLUSTER_SIZE: usize = 12;

// ═══════════════════════════════════════════════════════════════════════════════
// BONUS BUY
// ═══════════════════════════════════════════════════════════════════════════════

/// Purchasable meter boosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BonusBuyTier {
    /// Meter to 50%
    Anomaly,
    /// Meter to 75%
    Collapse,
    /// Meter to 100%, straight into Event Horizon
    Singularity,
}

impl BonusBuyTier {
    pub const ALL: [BonusBuyTier; 3] = [Self::Anomaly, Self::Collapse, Self::Singularity];

    /// Price in bets
    pub fn cost_multiplier(&self) -> f64 {
        match self {
            Self::Anomaly => 50.0,
            Self::Collapse => 100.0,
            Self::Singularity => 200.0,
        }
    }

    pub fn meter_target(&self) -> f64 {
        match self {
            Self::Anomaly => 50.0,
            Self::Collapse => 75.0,
            Self::Singularity => 100.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Anomaly => "ANOMALY",
            Self::Collapse => "COLLAPSE",
            Self::Singularity => "SINGULARITY",
        }
    }
}

impl fmt::Display for BonusBuyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BonusBuyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown bonus buy tier: {s}"))
    }
}

/// Receipt for a bonus buy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusBuy {
    pub tier: BonusBuyTier,
    pub cost: f64,
    /// Thresholds crossed by the meter jump
    pub crossed: Vec<f64>,
    /// Event Horizon started
    pub triggered_bonus: bool,
    /// Threshold effects in order
    pub effects: Vec<SpinEventKind>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub base_spins: u64,
    pub bonus_spins: u64,
    /// Base-game bets plus bonus buy costs
    pub total_bet: f64,
    pub total_win: f64,
    pub bonus_win: f64,
    pub wins: u64,
    pub losses: u64,
    pub bonus_triggers: u64,
    pub bonus_buys: u64,
    pub retriggers: u64,
    pub cascade_steps: u64,
    pub max_cascade_depth: usize,
    pub bubbles_spawned: u64,
    pub bubbles_activated: u64,
    /// Crossings per threshold (25/50/75/100)
    pub thresholds_crossed: [u64; 4],
    pub max_win_ratio: f64,
}

impl SessionStats {
    /// Calculate RTP (percent)
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate (percent)
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Base spins per bonus trigger
    pub fn bonus_frequency(&self) -> Option<f64> {
        (self.bonus_triggers > 0).then(|| self.base_spins as f64 / self.bonus_triggers as f64)
    }

    /// Fold another session's stats into this one
    pub fn merge(&mut self, other: &SessionStats) {
        self.total_spins += other.total_spins;
        self.base_spins += other.base_spins;
        self.bonus_spins += other.bonus_spins;
        self.total_bet += other.total_bet;
        self.total_win += other.total_win;
        self.bonus_win += other.bonus_win;
        self.wins += other.wins;
        self.losses += other.losses;
        self.bonus_triggers += other.bonus_triggers;
        self.bonus_buys += other.bonus_buys;
        self.retriggers += other.retriggers;
        self.cascade_steps += other.cascade_steps;
        self.max_cascade_depth = self.max_cascade_depth.max(other.max_cascade_depth);
        self.bubbles_spawned += other.bubbles_spawned;
        self.bubbles_activated += other.bubbles_activated;
        for (mine, theirs) in self.thresholds_crossed.iter_mut().zip(other.thresholds_crossed) {
            *mine += theirs;
        }
        self.max_win_ratio = self.max_win_ratio.max(other.max_win_ratio);
    }

    fn record(&mut self, outcome: &SpinOutcome) {
        self.total_spins += 1;
        if outcome.in_bonus {
            self.bonus_spins += 1;
            self.bonus_win += outcome.total_win();
        } else {
            self.base_spins += 1;
            self.total_bet += outcome.bet;
        }
        self.total_win += outcome.total_win();
        if outcome.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        if outcome.event_horizon {
            self.bonus_triggers += 1;
        }
        if outcome.retrigger_spins > 0 {
            self.retriggers += 1;
        }
        self.cascade_steps += outcome.cascade_count() as u64;
        self.max_cascade_depth = self.max_cascade_depth.max(outcome.cascade_count());
        self.bubbles_activated += outcome
            .activations
            .iter()
            .map(|a| a.bubbles.len() as u64)
            .sum::<u64>();
        self.max_win_ratio = self.max_win_ratio.max(outcome.win_ratio());
    }

    fn record_effects(&mut self, effects: &[SpinEventKind]) {
        for effect in effects {
            match effect {
                SpinEventKind::BubbleSpawned { .. } => self.bubbles_spawned += 1,
                SpinEventKind::ThresholdCrossed { threshold, .. } => {
                    if let Some(i) = THRESHOLDS.iter().position(|t| t == threshold) {
                        self.thresholds_crossed[i] += 1;
                    }
                }
                _ => {}
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION
// ═══════════════════════════════════════════════════════════════════════════════

/// A player session
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    rng: ChaCha8Rng,
    paytable: PayTable,
    meter: SingularityMeter,
    bubbles: MultiplierSystem,
    bonus: BonusMode,
    state: GameStateMachine,
    bet_index: usize,
    spin_index: u64,
    stats: SessionStats,
}

impl GameSession {
    /// Session seeded from the OS
    pub fn new(config: GameConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(config, ChaCha8Rng::from_os_rng()))
    }

    /// Reproducible session
    pub fn with_seed(config: GameConfig, seed: u64) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(config, ChaCha8Rng::seed_from_u64(seed)))
    }

    fn build(config: GameConfig, rng: ChaCha8Rng) -> Self {
        Self {
            paytable: PayTable::new(config.symbols.clone()),
            meter: SingularityMeter::with_config(config.meter.clone()),
            bubbles: MultiplierSystem::with_config(config.bubbles.clone()),
            bonus: BonusMode::with_config(config.bonus.clone()),
            state: GameStateMachine::new(),
            bet_index: config.bets.default_index,
            spin_index: 0,
            stats: SessionStats::default(),
            rng,
            config,
        }
    }

    /// Reseed the RNG
    pub fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn set_timing(&mut self, profile: TimingProfile) {
        self.config.timing = profile;
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    pub fn meter(&self) -> &SingularityMeter {
        &self.meter
    }

    /// Listener registration goes through here
    pub fn meter_mut(&mut self) -> &mut SingularityMeter {
        &mut self.meter
    }

    pub fn bubbles(&self) -> &MultiplierSystem {
        &self.bubbles
    }

    pub fn bonus(&self) -> &BonusMode {
        &self.bonus
    }

    pub fn state(&self) -> &GameStateMachine {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameStateMachine {
        &mut self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    /// Grid geometry for the next spin
    pub fn grid_size(&self) -> GridSize {
        self.bonus.grid_size()
    }

    pub fn bet_index(&self) -> usize {
        self.bet_index
    }

    pub fn bet(&self) -> f64 {
        self.config.bets.get(self.bet_index).unwrap_or(0.0)
    }

    /// Select a bet level. Out-of-range indices are rejected.
    pub fn set_bet_index(&mut self, index: usize) -> bool {
        if index >= self.config.bets.len() {
            return false;
        }
        self.bet_index = index;
        true
    }

    /// Move every bubble `frames` orbit steps along the perimeter
    pub fn advance_orbits(&mut self, frames: u32) {
        let delta = self.config.bubbles.orbit_step * f64::from(frames);
        self.bubbles.update_orbits(delta, self.bonus.grid_size());
    }

    pub fn spin(&mut self) -> Option<SpinOutcome> {
        self.run_spin(None)
    }

    pub fn spin_forced(&mut self, outcome: ForcedOutcome) -> Option<SpinOutcome> {
        self.run_spin(Some(outcome))
    }

    /// Replay every transition of `outcome`. Returns false if one was rejected.
    pub fn play_through(&mut self, outcome: &SpinOutcome) -> bool {
        outcome
            .transitions()
            .into_iter()
            .all(|t| t.apply(&mut self.state))
    }

    /// Spin and immediately settle the state machine
    pub fn spin_settled(&mut self, forced: Option<ForcedOutcome>) -> Option<SpinOutcome> {
        let outcome = self.run_spin(forced)?;
        self.play_through(&outcome);
        Some(outcome)
    }

    fn run_spin(&mut self, forced: Option<ForcedOutcome>) -> Option<SpinOutcome> {
        // A bonus with nothing left to play falls back to the base game
        if self.bonus.is_active() && self.bonus.is_complete() && self.state.current().can_spin() {
            let total = self.end_bonus();
            log::warn!("closed exhausted bonus (total {total:.2})");
            self.state.reset();
        }
        let in_bonus = self.bonus.is_active();
        if !self.state.start_spin() {
            return None;
        }

        // 1. Bookkeeping
        let bonus_spin = if in_bonus && self.bonus.use_spin() {
            Some(self.bonus.spins_used())
        } else {
            None
        };
        self.bubbles.on_spin();

        let spin_index = self.spin_index;
        self.spin_index += 1;
        let bet = self.bet();
        let size = self.bonus.grid_size();
        let mut kinds = vec![SpinEventKind::SpinStart {
            spin_index,
            bet,
            in_bonus,
        }];

        // 2. Grid
        let mut grid = generate_grid(size, self.paytable.symbols(), &mut self.rng);
        if let Some(forced) = forced {
            forced.apply(&mut grid);
        }

        // 3. Void absorption on dead bonus grids
        let absorbed = if in_bonus && find_clusters(&grid).is_empty() {
            self.bonus
                .apply_void_absorption(&mut grid, &HashSet::new(), &mut self.rng)
        } else {
            Vec::new()
        };

        // 4. Scatters
        let scatter_count = count_scatters(&grid);
        kinds.push(SpinEventKind::GridLanded {
            size,
            scatters: scatter_count,
        });
        if !absorbed.is_empty() {
            kinds.push(SpinEventKind::VoidAbsorption {
                cells: absorbed.clone(),
            });
        }

        let mut event_horizon = false;
        let mut retrigger_spins = 0;
        if in_bonus {
            retrigger_spins = self.bonus.check_retrigger(&grid);
            if retrigger_spins > 0 {
                kinds.push(SpinEventKind::Retrigger {
                    added: retrigger_spins,
                    remaining: self.bonus.spins_remaining(),
                });
            }
        } else if scatter_count >= self.config.bonus.trigger_scatters {
            event_horizon = true;
        }

        // 5. Cascades, pays, bubble activation
        let cascades = resolve_cascades(
            &grid,
            self.paytable.symbols(),
            self.config.cascade.max_steps,
            &mut self.rng,
        );

        let mut wins = self.paytable.calculate_total_win(&cascades, bet);
        let mut activations = Vec::with_capacity(cascades.len());
        for (step, (cascade, win)) in cascades.iter().zip(wins.steps.iter_mut()).enumerate() {
            for cw in &win.cluster_wins {
                kinds.push(SpinEventKind::ClusterWin {
                    step,
                    symbol: cw.symbol,
                    size: cw.size,
                    win: cw.win,
                });
            }

            let activation = self.bubbles.check_activation(&cascade.removed);
            if !activation.is_empty() {
                win.apply_bubbles(activation.total_multiplier);
                kinds.push(SpinEventKind::BubbleActivated {
                    step,
                    bubbles: activation.bubbles.clone(),
                    multiplier: activation.total_multiplier,
                });
            }
            kinds.push(SpinEventKind::CascadeStep {
                step,
                removed: cascade.removed.clone(),
                spawned: cascade.spawned.clone(),
            });

            activations.push(activation);
        }
        wins.recompute_total();

        // 6. Meter charge and threshold effects
        let mut effects = Vec::new();
        for cluster in cascades.iter().flat_map(|c| c.clusters.iter()) {
            let charge = self.meter.charge_from_cluster(cluster.size());
            if charge.charged > 0.0 {
                effects.push(SpinEventKind::MeterCharged {
                    amount: charge.charged,
                    value: self.meter.value(),
                });
            }
            for threshold in charge.crossed {
                event_horizon |=
                    self.apply_threshold(threshold, in_bonus, size, BubbleCause::Threshold, &mut effects);
            }
            if cluster.size() >= SURGE_CLUSTER_SIZE {
                let bubble = self.bubbles.spawn_bubble(size, &mut self.rng);
                effects.push(SpinEventKind::BubbleSpawned {
                    bubble,
                    cause: BubbleCause::GravitationalSurge,
                });
            }
        }

        // 7. Decay on a dead spin
        if cascades.is_empty() {
            self.meter.decay();
        }
        self.stats.record_effects(&effects);
        kinds.append(&mut effects);

        kinds.push(SpinEventKind::WinPresent {
            total_win: wins.total_win,
            win_ratio: wins.win_ratio(bet),
        });

        // 8. Bonus bookkeeping
        let mut bonus_total = None;
        if in_bonus {
            self.bonus.add_win(wins.total_win);
            if self.bonus.is_complete() {
                let total = self.end_bonus();
                kinds.push(SpinEventKind::BonusEnd { total_win: total });
                bonus_total = Some(total);
            }
        }

        // 9. Event Horizon
        let event_horizon = event_horizon && !in_bonus;
        if event_horizon {
            let spins = self.enter_event_horizon();
            kinds.push(SpinEventKind::EventHorizon { spins });
        }

        kinds.push(SpinEventKind::SpinEnd {
            total_win: wins.total_win,
        });

        // 10. Timeline and stats
        let mut timing = TimestampGenerator::new(self.config.timing_config());
        let events = build_timeline(kinds, bet, &mut timing);

        let outcome = SpinOutcome {
            spin_index,
            bet,
            in_bonus,
            bonus_spin,
            forced,
            grid_size: size,
            initial_grid: grid,
            absorbed,
            scatter_count,
            retrigger_spins,
            cascades,
            wins,
            activations,
            meter_value: self.meter.value(),
            event_horizon,
            bonus_total,
            bonus_active_after: self.bonus.is_active(),
            events,
        };
        self.stats.record(&outcome);

        log::debug!(
            "spin {}: {} cascades, win {:.2}, meter {:.0}{}",
            outcome.spin_index,
            outcome.cascade_count(),
            outcome.total_win(),
            outcome.meter_value,
            if event_horizon { ", EVENT HORIZON" } else { "" }
        );
        Some(outcome)
    }

    /// Apply one threshold effect. Returns true when Event Horizon is due.
    fn apply_threshold(
        &mut self,
        threshold: f64,
        in_bonus: bool,
        size: GridSize,
        cause: BubbleCause,
        effects: &mut Vec<SpinEventKind>,
    ) -> bool {
        effects.push(SpinEventKind::ThresholdCrossed {
            threshold,
            value: self.meter.value(),
        });

        if threshold >= THRESHOLDS[3] {
            !in_bonus
        } else if threshold >= THRESHOLDS[2] {
            let count = self.bubbles.double_all();
            effects.push(SpinEventKind::BubblesDoubled { count });
            false
        } else if threshold >= THRESHOLDS[1] {
            false
        } else {
            let bubble = self.bubbles.spawn_bubble(size, &mut self.rng);
            effects.push(SpinEventKind::BubbleSpawned { bubble, cause });
            false
        }
    }

    /// Start bonus mode. Returns the spins awarded.
    fn enter_event_horizon(&mut self) -> u32 {
        self.bonus.start(self.config.bonus.initial_spins);
        self.bubbles.enter_bonus();
        self.bubbles.relocate(GridSize::Bonus);
        self.meter.reset();
        log::info!("EVENT HORIZON: {} free spins", self.bonus.spins_remaining());
        self.bonus.spins_remaining()
    }

    /// Leave bonus mode. Returns the bonus total.
    ///
    /// The meter restarts empty so the base game can charge toward the
    /// next Event Horizon.
    fn end_bonus(&mut self) -> f64 {
        let total = self.bonus.end();
        self.bubbles.exit_bonus();
        self.bubbles.relocate(GridSize::Base);
        self.meter.reset();
        total
    }

    /// Move the state machine into bonus and start bonus mode
    fn trigger_event_horizon(&mut self) -> bool {
        if self.bonus.is_active() || !self.state.start_event_horizon() {
            return false;
        }
        self.enter_event_horizon();
        self.stats.bonus_triggers += 1;
        self.state.enter_bonus()
    }

    /// Debug: set the meter and apply threshold effects.
    ///
    /// Only allowed between spins. Returns the thresholds crossed.
    pub fn set_meter(&mut self, value: f64) -> Option<Vec<f64>> {
        if !self.state.is_idle() && !self.state.is_bonus() {
            return None;
        }
        let (crossed, _, _) = self.jump_meter(value);
        Some(crossed)
    }

    fn jump_meter(&mut self, value: f64) -> (Vec<f64>, bool, Vec<SpinEventKind>) {
        let in_bonus = self.bonus.is_active();
        let size = self.bonus.grid_size();
        let crossed = self.meter.set(value);

        let mut effects = Vec::new();
        let mut horizon = false;
        for &threshold in &crossed {
            horizon |= self.apply_threshold(threshold, in_bonus, size, BubbleCause::Manual, &mut effects);
        }
        self.stats.record_effects(&effects);

        let triggered = horizon && self.trigger_event_horizon();
        if triggered {
            effects.push(SpinEventKind::EventHorizon {
                spins: self.bonus.spins_remaining(),
            });
        }
        (crossed, triggered, effects)
    }

    /// Debug: enter Event Horizon immediately from the base game
    pub fn force_event_horizon(&mut self) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        self.trigger_event_horizon()
    }

    /// Buy a meter boost. Only allowed in the idle base game.
    ///
    /// The meter never moves down: a tier below the current value only
    /// charges the cost.
    pub fn buy_bonus(&mut self, tier: BonusBuyTier) -> Option<BonusBuy> {
        if !self.state.is_idle() || self.bonus.is_active() {
            return None;
        }
        let cost = self.bet() * tier.cost_multiplier();
        self.stats.total_bet += cost;
        self.stats.bonus_buys += 1;

        let target = tier.meter_target().max(self.meter.value());
        let (crossed, triggered_bonus, effects) = self.jump_meter(target);
        log::info!("bonus buy {tier} for {cost:.2}, crossed {crossed:?}");

        Some(BonusBuy {
            tier,
            cost,
            crossed,
            triggered_bonus,
            effects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameState;
    use approx::assert_relative_eq;

    fn session(seed: u64) -> GameSession {
        GameSession::with_seed(GameConfig::default(), seed).unwrap()
    }

    #[test]
    fn test_second_spin_rejected_until_settled() {
        let mut s = session(1);
        let outcome = s.spin().unwrap();
        assert!(s.spin().is_none());
        assert!(s.play_through(&outcome));
        assert!(s.spin().is_some());
    }

    #[test]
    fn test_dead_spin_decays_meter() {
        let mut s = session(2);
        s.set_meter(30.0).unwrap();
        let outcome = s.spin_settled(Some(ForcedOutcome::DeadSpin)).unwrap();
        assert!(outcome.cascades.is_empty());
        assert!(!outcome.is_win());
        assert_relative_eq!(s.meter().value(), 25.0);
        assert_eq!(s.state().current(), GameState::Idle);
    }

    #[test]
    fn test_same_seed_same_outcomes() {
        let mut a = session(99);
        let mut b = session(99);
        for _ in 0..20 {
            let x = a.spin_settled(None).unwrap();
            let y = b.spin_settled(None).unwrap();
            assert_eq!(x.initial_grid, y.initial_grid);
            assert_eq!(x.total_win(), y.total_win());
        }
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_bet_ladder() {
        let mut s = session(3);
        assert_relative_eq!(s.bet(), 1.0);
        assert!(s.set_bet_index(8));
        assert_relative_eq!(s.bet(), 100.0);
        assert!(!s.set_bet_index(9));
        assert_eq!(s.bet_index(), 8);
    }

    #[test]
    fn test_bonus_buy_tiers() {
        let mut s = session(4);
        let buy = s.buy_bonus(BonusBuyTier::Anomaly).unwrap();
        assert_relative_eq!(buy.cost, 50.0);
        assert_eq!(buy.crossed, vec![25.0, 50.0]);
        assert!(!buy.triggered_bonus);
        assert_eq!(s.bubbles().active_bubbles().len(), 1);
        assert!(buy.effects.iter().any(|e| matches!(
            e,
            SpinEventKind::BubbleSpawned {
                cause: BubbleCause::Manual,
                ..
            }
        )));

        let buy = s.buy_bonus(BonusBuyTier::Singularity).unwrap();
        assert_eq!(buy.crossed, vec![75.0, 100.0]);
        assert!(buy.triggered_bonus);
        assert!(s.bonus().is_active());
        assert_eq!(s.state().current(), GameState::BonusActive);
        assert_relative_eq!(s.meter().value(), 0.0);
        assert_relative_eq!(s.stats().total_bet, 250.0);

        // Not allowed during bonus
        assert!(s.buy_bonus(BonusBuyTier::Anomaly).is_none());
    }

    #[test]
    fn test_collapse_doubles_bubbles() {
        let mut s = session(5);
        s.set_meter(30.0).unwrap();
        let before: Vec<u32> = s.bubbles().active_bubbles().iter().map(|b| b.value).collect();
        assert_eq!(before.len(), 1);

        let buy = s.buy_bonus(BonusBuyTier::Collapse).unwrap();
        assert_eq!(buy.crossed, vec![50.0, 75.0]);
        let after: Vec<u32> = s.bubbles().active_bubbles().iter().map(|b| b.value).collect();
        assert_eq!(after, vec![before[0] * 2]);
    }

    #[test]
    fn test_advance_orbits_moves_bubbles() {
        let mut s = session(8);
        s.buy_bonus(BonusBuyTier::Anomaly).unwrap();
        let before = s.bubbles().bubbles()[0].clone();

        s.advance_orbits(300);
        let after = &s.bubbles().bubbles()[0];
        assert_relative_eq!(after.orbit_angle, before.orbit_angle + 1.5, epsilon = 1e-9);
        assert_ne!(after.position, before.position);
    }

    #[test]
    fn test_stats_merge() {
        let mut a = session(6);
        let mut b = session(7);
        for _ in 0..10 {
            a.spin_settled(None);
            b.spin_settled(None);
        }
        let mut merged = a.stats().clone();
        merged.merge(b.stats());
        assert_eq!(merged.total_spins, 20);
        assert_relative_eq!(merged.total_win, a.stats().total_win + b.stats().total_win);
        assert_eq!(merged.wins + merged.losses, 20);

        a.reset_stats();
        assert_eq!(a.stats().total_spins, 0);
        assert_relative_eq!(a.stats().rtp(), 0.0);
    }

    #[test]
    fn test_buy_tier_parse() {
        assert_eq!("collapse".parse(), Ok(BonusBuyTier::Collapse));
        assert!("MEGA".parse::<BonusBuyTier>().is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GameConfig::default();
        config.bets.levels.clear();
        assert!(GameSession::with_seed(config, 0).is_err());
    }
}
