//! Spin presentation events
//!
//! A spin records an ordered list of [`SpinEventKind`]s while it resolves;
//! [`build_timeline`] then stamps them with times from a
//! [`TimestampGenerator`] so renderers and audio can schedule playback.

use serde::{Deserialize, Serialize};

use crate::cascade::SpawnedCell;
use crate::grid::{GridSize, Position};
use crate::multiplier::BubbleSnapshot;
use crate::symbols::SymbolId;
use crate::timing::TimestampGenerator;

/// Why a bubble appeared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleCause {
    /// Meter crossed 25%
    Threshold,
    /// Cluster of 12 or more
    GravitationalSurge,
    /// Bonus buy or debug request
    Manual,
}

/// Presentation event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpinEventKind {
    SpinStart {
        spin_index: u64,
        bet: f64,
        in_bonus: bool,
    },
    GridLanded {
        size: GridSize,
        scatters: usize,
    },
    VoidAbsorption {
        cells: Vec<Position>,
    },
    ClusterWin {
        step: usize,
        symbol: SymbolId,
        size: usize,
        win: f64,
    },
    BubbleActivated {
        step: usize,
        bubbles: Vec<BubbleSnapshot>,
        multiplier: u32,
    },
    CascadeStep {
        step: usize,
        removed: Vec<Position>,
        spawned: Vec<SpawnedCell>,
    },
    MeterCharged {
        amount: f64,
        value: f64,
    },
    ThresholdCrossed {
        threshold: f64,
        value: f64,
    },
    BubbleSpawned {
        bubble: BubbleSnapshot,
        cause: BubbleCause,
    },
    BubblesDoubled {
        count: usize,
    },
    Retrigger {
        added: u32,
        remaining: u32,
    },
    WinPresent {
        total_win: f64,
        win_ratio: f64,
    },
    EventHorizon {
        spins: u32,
    },
    BonusEnd {
        total_win: f64,
    },
    SpinEnd {
        total_win: f64,
    },
}

impl SpinEventKind {
    /// Event name for logs and audio mapping
    pub fn name(&self) -> &'static str {
        match self {
            Self::SpinStart { .. } => "SPIN_START",
            Self::GridLanded { .. } => "GRID_LANDED",
            Self::VoidAbsorption { .. } => "VOID_ABSORPTION",
            Self::ClusterWin { .. } => "CLUSTER_WIN",
            Self::BubbleActivated { .. } => "BUBBLE_ACTIVATED",
            Self::CascadeStep { .. } => "CASCADE_STEP",
            Self::MeterCharged { .. } => "METER_CHARGED",
            Self::ThresholdCrossed { .. } => "THRESHOLD_CROSSED",
            Self::BubbleSpawned { .. } => "BUBBLE_SPAWNED",
            Self::BubblesDoubled { .. } => "BUBBLES_DOUBLED",
            Self::Retrigger { .. } => "RETRIGGER",
            Self::WinPresent { .. } => "WIN_PRESENT",
            Self::EventHorizon { .. } => "EVENT_HORIZON",
            Self::BonusEnd { .. } => "BONUS_END",
            Self::SpinEnd { .. } => "SPIN_END",
        }
    }
}

/// A timestamped event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinEvent {
    /// Milliseconds since spin start
    pub timestamp_ms: f64,
    #[serde(flatten)]
    pub kind: SpinEventKind,
}

impl SpinEvent {
    pub fn new(kind: SpinEventKind, timestamp_ms: f64) -> Self {
        Self { timestamp_ms, kind }
    }
}

/// Stamp recorded events in order.
///
/// Cluster wins of one step glow together: only the first advances time.
/// Bubble activations and threshold flashes share the timestamp of the
/// event they belong to.
pub fn build_timeline(
    kinds: Vec<SpinEventKind>,
    bet: f64,
    timing: &mut TimestampGenerator,
) -> Vec<SpinEvent> {
    let mut events = Vec::with_capacity(kinds.len());
    let mut glowing_step: Option<usize> = None;

    for kind in kinds {
        let timestamp = match &kind {
            SpinEventKind::SpinStart { .. } => timing.current(),
            SpinEventKind::GridLanded { .. } => timing.grid_landed(),
            SpinEventKind::VoidAbsorption { .. } => timing.void_absorption(),
            SpinEventKind::ClusterWin { step, .. } => {
                if glowing_step == Some(*step) {
                    timing.current()
                } else {
                    glowing_step = Some(*step);
                    timing.cluster_win()
                }
            }
            SpinEventKind::BubbleActivated { .. } | SpinEventKind::ThresholdCrossed { .. } => {
                timing.current()
            }
            SpinEventKind::CascadeStep { .. } => timing.cascade_step(),
            SpinEventKind::MeterCharged { .. } => timing.meter_charge(),
            SpinEventKind::BubbleSpawned { .. } | SpinEventKind::BubblesDoubled { .. } => {
                timing.bubble()
            }
            SpinEventKind::WinPresent { total_win, .. } => {
                let ratio = if bet > 0.0 { total_win / bet } else { 0.0 };
                timing.win_present(ratio)
            }
            SpinEventKind::EventHorizon { .. } => timing.event_horizon(),
            SpinEventKind::Retrigger { .. }
            | SpinEventKind::BonusEnd { .. }
            | SpinEventKind::SpinEnd { .. } => timing.advance(0.0),
        };
        events.push(SpinEvent::new(kind, timestamp));
    }

    // Stable: equal timestamps keep recording order
    events.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingConfig;

    fn cluster_win(step: usize) -> SpinEventKind {
        SpinEventKind::ClusterWin {
            step,
            symbol: SymbolId::PlasmaOrb,
            size: 5,
            win: 0.8,
        }
    }

    #[test]
    fn test_timeline_is_monotonic() {
        let kinds = vec![
            SpinEventKind::SpinStart {
                spin_index: 0,
                bet: 1.0,
                in_bonus: false,
            },
            SpinEventKind::GridLanded {
                size: GridSize::Base,
                scatters: 0,
            },
            cluster_win(0),
            cluster_win(0),
            SpinEventKind::CascadeStep {
                step: 0,
                removed: vec![],
                spawned: vec![],
            },
            cluster_win(1),
            SpinEventKind::MeterCharged {
                amount: 5.0,
                value: 5.0,
            },
            SpinEventKind::WinPresent {
                total_win: 1.6,
                win_ratio: 1.6,
            },
            SpinEventKind::SpinEnd { total_win: 1.6 },
        ];
        let mut timing = TimestampGenerator::new(TimingConfig::normal());
        let events = build_timeline(kinds, 1.0, &mut timing);

        assert_eq!(events.len(), 9);
        assert!(events.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
        assert_eq!(events[0].kind.name(), "SPIN_START");
        assert_eq!(events[8].kind.name(), "SPIN_END");
        // Two wins of the same step share a timestamp
        assert_eq!(events[2].timestamp_ms, events[3].timestamp_ms);
        assert!(events[5].timestamp_ms > events[4].timestamp_ms);
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = SpinEvent::new(SpinEventKind::BubblesDoubled { count: 2 }, 120.0);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "bubbles_doubled");
        assert_eq!(json["count"], 2);
        assert_eq!(json["timestamp_ms"], 120.0);
    }
}
