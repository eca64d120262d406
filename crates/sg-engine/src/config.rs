//! Game configuration
//!
//! Every section has sensible defaults matching the shipped game, so a
//! config file only needs the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bonus::BonusConfig;
use crate::cascade::DEFAULT_MAX_CASCADES;
use crate::error::{ConfigError, ConfigResult};
use crate::meter::MeterConfig;
use crate::multiplier::BubbleConfig;
use crate::symbols::SymbolTable;
use crate::timing::{TimingConfig, TimingProfile};

// ═══════════════════════════════════════════════════════════════════════════════
// SECTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Cascade resolution limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Fail-safe cap on steps per spin
    pub max_steps: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_CASCADES,
        }
    }
}

/// Selectable bet amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetLadder {
    pub levels: Vec<f64>,
    pub default_index: usize,
}

impl Default for BetLadder {
    fn default() -> Self {
        Self {
            levels: vec![0.20, 0.50, 1.00, 2.00, 5.00, 10.00, 25.00, 50.00, 100.00],
            default_index: 2,
        }
    }
}

impl BetLadder {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.levels.get(index).copied()
    }

    pub fn default_bet(&self) -> f64 {
        self.get(self.default_index).unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GAME CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Symbol weights and pay vectors
    pub symbols: SymbolTable,
    pub cascade: CascadeConfig,
    pub meter: MeterConfig,
    pub bubbles: BubbleConfig,
    pub bonus: BonusConfig,
    pub bets: BetLadder,
    /// Presentation timing profile
    pub timing: TimingProfile,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            symbols: SymbolTable::standard(),
            cascade: CascadeConfig::default(),
            meter: MeterConfig::default(),
            bubbles: BubbleConfig::default(),
            bonus: BonusConfig::default(),
            bets: BetLadder::default(),
            timing: TimingProfile::Normal,
        }
    }
}

impl GameConfig {
    /// Turbo presentation, otherwise standard
    pub fn turbo() -> Self {
        Self {
            timing: TimingProfile::Turbo,
            ..Default::default()
        }
    }

    /// Short, evenly spaced timeline for audio and QA review
    pub fn studio() -> Self {
        Self {
            timing: TimingProfile::Studio,
            ..Default::default()
        }
    }

    pub fn timing_config(&self) -> TimingConfig {
        TimingConfig::from_profile(self.timing)
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let config = match ext.as_str() {
            "json" => Self::from_json(&text)?,
            "yaml" | "yml" => Self::from_yaml(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        log::info!("loaded game config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.symbols.symbols.is_empty() || self.symbols.total_weight() == 0 {
            return invalid("symbol table must have a positive total weight");
        }
        if !self.symbols.symbols.iter().any(|s| s.id.is_paying() && s.weight > 0) {
            return invalid("symbol table needs at least one paying symbol");
        }
        if self.cascade.max_steps == 0 {
            return invalid("cascade.max_steps must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.bonus.absorption_rate) {
            return invalid("bonus.absorption_rate must be within [0, 1]");
        }
        if self.bonus.max_spins == 0 {
            return invalid("bonus.max_spins must be at least 1");
        }
        if self.bonus.initial_spins == 0 {
            return invalid("bonus.initial_spins must be at least 1");
        }
        if self.bubbles.values.is_empty() {
            return invalid("bubbles.values must not be empty");
        }
        if self.bets.is_empty() {
            return invalid("bets.levels must not be empty");
        }
        if self.bets.default_index >= self.bets.len() {
            return Err(ConfigError::Validation(format!(
                "bets.default_index {} out of range (0..{})",
                self.bets.default_index,
                self.bets.len()
            )));
        }
        if self.bets.levels.iter().any(|&b| b <= 0.0 || !b.is_finite()) {
            return invalid("bet levels must be positive");
        }
        if self.meter.decay_amount < 0.0 || self.meter.charge_rates.iter().any(|&c| c < 0.0) {
            return invalid("meter rates must not be negative");
        }
        Ok(())
    }
}
