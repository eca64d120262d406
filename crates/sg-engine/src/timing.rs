//! Timing profiles for the spin presentation timeline

use serde::{Deserialize, Serialize};

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Studio mode (short, evenly spaced events for audio and QA review)
    Studio,
    /// Scaled from another profile
    Custom,
}

impl std::str::FromStr for TimingProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "turbo" => Ok(Self::Turbo),
            "studio" => Ok(Self::Studio),
            other => Err(format!("unknown timing profile: {other}")),
        }
    }
}

/// Animation durations driving timestamps (ms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Symbols scatter outward at spin start
    pub spin_scatter_ms: f64,

    /// Symbols snap back into the new grid
    pub snap_back_ms: f64,

    /// Winning cluster glow
    pub win_glow_ms: f64,

    /// Winning symbols absorbed into the core
    pub win_absorb_ms: f64,

    /// Survivors drift down
    pub cascade_drift_ms: f64,

    /// New symbols spawn in
    pub cascade_spawn_ms: f64,

    /// Void absorption sweep in bonus mode
    pub void_absorption_ms: f64,

    /// Meter fill and threshold flash
    pub meter_charge_ms: f64,

    /// Bubble spawn or double pulse
    pub bubble_ms: f64,

    /// Final win presentation
    pub win_present_ms: f64,

    /// Event Horizon cinematic (charge, crack, collapse, silence, rebirth)
    pub event_horizon_ms: f64,

    /// Minimum time between events
    pub min_event_interval_ms: f64,
}

impl TimingConfig {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            spin_scatter_ms: 300.0,
            snap_back_ms: 400.0,
            win_glow_ms: 300.0,
            win_absorb_ms: 500.0,
            cascade_drift_ms: 500.0,
            cascade_spawn_ms: 300.0,
            void_absorption_ms: 600.0,
            meter_charge_ms: 250.0,
            bubble_ms: 300.0,
            win_present_ms: 2500.0,
            event_horizon_ms: 5000.0,
            min_event_interval_ms: 0.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            ..Self::normal().scaled(0.5)
        }
    }

    /// Studio mode
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            spin_scatter_ms: 150.0,
            snap_back_ms: 200.0,
            win_glow_ms: 150.0,
            win_absorb_ms: 250.0,
            cascade_drift_ms: 250.0,
            cascade_spawn_ms: 150.0,
            void_absorption_ms: 300.0,
            meter_charge_ms: 100.0,
            bubble_ms: 100.0,
            win_present_ms: 500.0,
            event_horizon_ms: 1000.0,
            min_event_interval_ms: 50.0,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal | TimingProfile::Custom => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            spin_scatter_ms: self.spin_scatter_ms * factor,
            snap_back_ms: self.snap_back_ms * factor,
            win_glow_ms: self.win_glow_ms * factor,
            win_absorb_ms: self.win_absorb_ms * factor,
            cascade_drift_ms: self.cascade_drift_ms * factor,
            cascade_spawn_ms: self.cascade_spawn_ms * factor,
            void_absorption_ms: self.void_absorption_ms * factor,
            meter_charge_ms: self.meter_charge_ms * factor,
            bubble_ms: self.bubble_ms * factor,
            win_present_ms: self.win_present_ms * factor,
            event_horizon_ms: self.event_horizon_ms * factor,
            min_event_interval_ms: self.min_event_interval_ms * factor,
        }
    }

    /// Whole spin animation
    pub fn spin_duration(&self) -> f64 {
        self.spin_scatter_ms + self.snap_back_ms
    }

    /// Glow plus absorb for one winning step
    pub fn win_duration(&self) -> f64 {
        self.win_glow_ms + self.win_absorb_ms
    }

    /// Drift plus spawn for one cascade step
    pub fn cascade_duration(&self) -> f64 {
        self.cascade_drift_ms + self.cascade_spawn_ms
    }

    /// Win presentation scaled by win size
    pub fn win_present_duration(&self, win_ratio: f64) -> f64 {
        let tier_multiplier = match win_ratio {
            r if r >= 100.0 => 3.0,
            r if r >= 50.0 => 2.5,
            r if r >= 25.0 => 2.0,
            r if r >= 15.0 => 1.5,
            r if r > 0.0 => 1.0,
            _ => 0.0,
        };
        self.win_present_ms * tier_multiplier
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

/// Timestamp generator for sequential events
#[derive(Debug, Clone)]
pub struct TimestampGenerator {
    current_ms: f64,
    config: TimingConfig,
}

impl TimestampGenerator {
    pub fn new(config: TimingConfig) -> Self {
        Self {
            current_ms: 0.0,
            config,
        }
    }

    pub fn reset(&mut self) {
        self.current_ms = 0.0;
    }

    pub fn current(&self) -> f64 {
        self.current_ms
    }

    /// Advance by duration and return new timestamp
    pub fn advance(&mut self, duration_ms: f64) -> f64 {
        self.current_ms += duration_ms.max(self.config.min_event_interval_ms);
        self.current_ms
    }

    /// Grid landed after the spin animation
    pub fn grid_landed(&mut self) -> f64 {
        self.advance(self.config.spin_duration())
    }

    pub fn void_absorption(&mut self) -> f64 {
        self.advance(self.config.void_absorption_ms)
    }

    /// Cluster glow and absorb
    pub fn cluster_win(&mut self) -> f64 {
        self.advance(self.config.win_duration())
    }

    /// Drift and spawn
    pub fn cascade_step(&mut self) -> f64 {
        self.advance(self.config.cascade_duration())
    }

    pub fn meter_charge(&mut self) -> f64 {
        self.advance(self.config.meter_charge_ms)
    }

    pub fn bubble(&mut self) -> f64 {
        self.advance(self.config.bubble_ms)
    }

    pub fn win_present(&mut self, win_ratio: f64) -> f64 {
        self.advance(self.config.win_present_duration(win_ratio))
    }

    pub fn event_horizon(&mut self) -> f64 {
        self.advance(self.config.event_horizon_ms)
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }
}
