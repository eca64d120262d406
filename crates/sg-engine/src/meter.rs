//! Singularity Meter: tension gauge charged by clusters
//!
//! The meter holds a value in `[0, 100]`. Winning clusters charge it by
//! size bracket, non-winning spins decay it, and crossing one of the four
//! thresholds (25/50/75/100) notifies registered listeners.

use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::observer::{ListenerId, ListenerRegistry};
use crate::paytable::PayTier;

/// Threshold values, ascending
pub const THRESHOLDS: [f64; 4] = [25.0, 50.0, 75.0, 100.0];

/// Upper bound of the meter
pub const METER_MAX: f64 = 100.0;

/// Threshold callback: `(threshold, meter_value)`
pub type ThresholdListener = dyn FnMut(f64, f64) + Send;

/// Meter tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Charge per pay tier (5-7, 8-11, 12-15, 16+)
    pub charge_rates: [f64; 4],
    /// Amount removed by a non-winning spin
    pub decay_amount: f64,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            charge_rates: [5.0, 10.0, 20.0, 35.0],
            decay_amount: 5.0,
        }
    }
}

/// Result of a single charge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeResult {
    /// Amount requested by the cluster size (before clamping)
    pub charged: f64,
    /// Thresholds newly crossed, ascending
    pub crossed: Vec<f64>,
}

/// The Singularity Meter
pub struct SingularityMeter {
    config: MeterConfig,
    value: f64,
    /// Number of thresholds counted as crossed
    marker: usize,
    listeners: ListenerRegistry<ThresholdListener>,
}

impl SingularityMeter {
    pub fn new() -> Self {
        Self::with_config(MeterConfig::default())
    }

    pub fn with_config(config: MeterConfig) -> Self {
        Self {
            config,
            value: 0.0,
            marker: 0,
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Current value in `[0, 100]`
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value as a fraction in `[0, 1]`
    pub fn percent(&self) -> f64 {
        self.value / METER_MAX
    }

    /// Bucket 0-4: one step per threshold reached
    pub fn level(&self) -> u8 {
        THRESHOLDS.iter().filter(|&&t| self.value >= t).count() as u8
    }

    /// Charge for a cluster size (0 below the minimum cluster size)
    pub fn charge_for_size(&self, size: usize) -> f64 {
        PayTier::from_cluster_size(size).map_or(0.0, |tier| self.config.charge_rates[tier.index()])
    }

    /// Register a threshold listener
    pub fn on_threshold(&mut self, listener: impl FnMut(f64, f64) + Send + 'static) -> ListenerId {
        self.listeners.register(Box::new(listener))
    }

    pub fn remove_threshold_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }

    /// Charge from one cluster size
    pub fn charge_from_cluster(&mut self, size: usize) -> ChargeResult {
        let charged = self.charge_for_size(size);
        if charged <= 0.0 {
            return ChargeResult::default();
        }
        let crossed = self.move_to(self.value + charged);
        ChargeResult { charged, crossed }
    }

    /// Charge from every cluster in order
    pub fn charge_from_clusters(&mut self, clusters: &[Cluster]) -> Vec<ChargeResult> {
        clusters
            .iter()
            .map(|c| self.charge_from_cluster(c.size()))
            .collect()
    }

    /// Decay after a non-winning spin. Returns the amount removed.
    ///
    /// The crossed marker is re-derived from the new value without firing,
    /// so a later rise across the same threshold fires again.
    pub fn decay(&mut self) -> f64 {
        let old = self.value;
        self.value = (self.value - self.config.decay_amount).clamp(0.0, METER_MAX);
        self.marker = thresholds_below(self.value);
        old - self.value
    }

    /// Set the value directly (debug, bonus buy). Returns crossed thresholds.
    pub fn set(&mut self, value: f64) -> Vec<f64> {
        let value = value.clamp(0.0, METER_MAX);
        if value < self.value {
            self.value = value;
            self.marker = thresholds_below(value);
            return Vec::new();
        }
        self.move_to(value)
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
        self.marker = 0;
    }

    /// Raise the value and fire every threshold passed since the marker
    fn move_to(&mut self, target: f64) -> Vec<f64> {
        let new = target.clamp(0.0, METER_MAX);
        if new <= self.value {
            return Vec::new();
        }
        self.value = new;

        let reached = THRESHOLDS.iter().filter(|&&t| new >= t).count();
        if reached <= self.marker {
            return Vec::new();
        }

        let crossed: Vec<f64> = THRESHOLDS[self.marker..reached].to_vec();
        self.marker = reached;

        for &threshold in &crossed {
            log::debug!("meter crossed {threshold} at {new}");
            for listener in self.listeners.iter_mut() {
                listener(threshold, new);
            }
        }
        crossed
    }
}

/// Thresholds strictly below `value`
fn thresholds_below(value: f64) -> usize {
    THRESHOLDS.iter().filter(|&&t| t < value).count()
}

impl Default for SingularityMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SingularityMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingularityMeter")
            .field("value", &self.value)
            .field("marker", &self.marker)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording_meter() -> (SingularityMeter, Arc<Mutex<Vec<(f64, f64)>>>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut meter = SingularityMeter::new();
        let sink = Arc::clone(&fired);
        meter.on_threshold(move |t, v| sink.lock().push((t, v)));
        (meter, fired)
    }

    #[test]
    fn test_charge_rates() {
        let meter = SingularityMeter::new();
        assert_relative_eq!(meter.charge_for_size(4), 0.0);
        assert_relative_eq!(meter.charge_for_size(5), 5.0);
        assert_relative_eq!(meter.charge_for_size(8), 10.0);
        assert_relative_eq!(meter.charge_for_size(12), 20.0);
        assert_relative_eq!(meter.charge_for_size(16), 35.0);
    }

    #[test]
    fn test_crossing_25_fires_once() {
        let (mut meter, fired) = recording_meter();
        meter.set(20.0);
        assert!(fired.lock().is_empty());

        let result = meter.charge_from_cluster(8);
        assert_relative_eq!(meter.value(), 30.0);
        assert_eq!(result.crossed, vec![25.0]);
        assert_eq!(*fired.lock(), vec![(25.0, 30.0)]);

        meter.charge_from_cluster(5);
        assert_eq!(fired.lock().len(), 1);
    }

    #[test]
    fn test_zero_charge_fires_nothing() {
        let (mut meter, fired) = recording_meter();
        meter.set(24.0);
        let result = meter.charge_from_cluster(3);
        assert_relative_eq!(result.charged, 0.0);
        assert!(result.crossed.is_empty());
        assert!(fired.lock().is_empty());
    }

    #[test]
    fn test_decay_rearms_threshold() {
        let (mut meter, fired) = recording_meter();
        meter.set(30.0);
        assert_eq!(fired.lock().len(), 1);

        assert_relative_eq!(meter.decay(), 5.0);
        assert_relative_eq!(meter.value(), 25.0);

        // 25 -> 26 re-crosses the 25 threshold
        meter.set(26.0);
        assert_eq!(*fired.lock(), vec![(25.0, 30.0), (25.0, 26.0)]);
    }

    #[test]
    fn test_big_jump_fires_ascending() {
        let (mut meter, fired) = recording_meter();
        let crossed = meter.set(100.0);
        assert_eq!(crossed, vec![25.0, 50.0, 75.0, 100.0]);
        let order: Vec<f64> = fired.lock().iter().map(|(t, _)| *t).collect();
        assert_eq!(order, vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!(meter.level(), 4);
    }

    #[test]
    fn test_clamp_and_floor() {
        let mut meter = SingularityMeter::new();
        meter.set(95.0);
        meter.charge_from_cluster(20);
        assert_relative_eq!(meter.value(), 100.0);
        assert_relative_eq!(meter.percent(), 1.0);

        meter.set(3.0);
        assert_relative_eq!(meter.decay(), 3.0);
        assert_relative_eq!(meter.value(), 0.0);
        assert_relative_eq!(meter.decay(), 0.0);
    }

    #[test]
    fn test_levels() {
        let mut meter = SingularityMeter::new();
        for (value, level) in [(0.0, 0), (24.9, 0), (25.0, 1), (50.0, 2), (74.0, 2), (75.0, 3), (100.0, 4)] {
            meter.reset();
            meter.set(value);
            assert_eq!(meter.level(), level, "value {value}");
        }
    }

    #[test]
    fn test_remove_listener() {
        let (mut meter, fired) = recording_meter();
        let extra = Arc::new(Mutex::new(0u32));
        let sink = Arc::clone(&extra);
        let id = meter.on_threshold(move |_, _| *sink.lock() += 1);
        assert!(meter.remove_threshold_listener(id));
        meter.set(60.0);
        assert_eq!(fired.lock().len(), 2);
        assert_eq!(*extra.lock(), 0);
    }

    #[test]
    fn test_reset_rearms_all() {
        let (mut meter, fired) = recording_meter();
        meter.set(80.0);
        meter.reset();
        meter.set(55.0);
        assert_eq!(fired.lock().len(), 5);
    }
}
