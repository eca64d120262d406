//! End-to-end spin flow tests
//!
//! Tests cover:
//! - Forced outcomes through a full session spin
//! - Meter charging and threshold listeners
//! - State machine guards while a spin is in flight
//! - Event Horizon entry, bonus play and exit
//! - Bonus configuration edge cases
//! - Presentation timeline ordering

use std::sync::Arc;

use parking_lot::Mutex;
use sg_engine::{
    BonusConfig, ForcedOutcome, GameConfig, GameSession, GameState, GridSize, Position,
    SpinEventKind, SymbolId, pay_tier,
};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn session(seed: u64) -> GameSession {
    GameSession::with_seed(GameConfig::default(), seed).unwrap()
}

fn session_with(config: GameConfig, seed: u64) -> GameSession {
    GameSession::with_seed(config, seed).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════════
// BASE GAME
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_big_cluster_pays_tier_two_and_charges_meter() {
    for seed in 0..10 {
        let mut s = session(seed);
        let outcome = s.spin_forced(ForcedOutcome::BigCluster).unwrap();

        let first = &outcome.cascades[0];
        let neutron = first
            .clusters
            .iter()
            .find(|c| c.symbol == SymbolId::NeutronCrystal)
            .expect("forced cluster is found on the first step");
        assert_eq!(neutron.size(), 12);
        assert_eq!(pay_tier(neutron.size()), 2);
        assert!(neutron.cells.contains(&Position::new(0, 0)));

        let first_win = &outcome.wins.steps[0].cluster_wins[0];
        assert_eq!(first_win.symbol, SymbolId::NeutronCrystal);
        assert_eq!(first_win.multiplier, 25.0);

        // The first cluster scanned is the forced one: +20
        let first_charge = outcome.events.iter().find_map(|e| match e.kind {
            SpinEventKind::MeterCharged { amount, .. } => Some(amount),
            _ => None,
        });
        assert_eq!(first_charge, Some(20.0));

        // A cluster of 12 is a gravitational surge
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e.kind, SpinEventKind::BubbleSpawned { .. })));

        assert!(s.play_through(&outcome));
    }
}

#[test]
fn test_dead_spin_resolves_nothing() {
    let mut s = session(11);
    let outcome = s.spin_forced(ForcedOutcome::DeadSpin).unwrap();
    assert!(outcome.cascades.is_empty());
    assert_eq!(outcome.total_win(), 0.0);
    assert_eq!(outcome.scatter_count, 0);
    assert_eq!(outcome.final_grid(), &outcome.initial_grid);
    assert!(s.play_through(&outcome));
    assert_eq!(s.state().current(), GameState::Idle);
}

#[test]
fn test_cascade_chain_yields_two_steps() {
    let mut s = session(12);
    let outcome = s.spin_forced(ForcedOutcome::CascadeChain).unwrap();
    assert!(outcome.cascade_count() >= 2);
    assert_eq!(outcome.cascades[0].clusters[0].symbol, SymbolId::StellarFragment);
    assert!(outcome.cascades[1]
        .clusters
        .iter()
        .any(|c| c.symbol == SymbolId::NebulaCore));
    assert!(outcome.total_win() > 0.0);
}

#[test]
fn test_state_guards_during_spin() {
    let mut s = session(13);
    assert!(!s.state_mut().cascade_complete());
    assert_eq!(s.state().current(), GameState::Idle);

    let outcome = s.spin().unwrap();
    assert_eq!(s.state().current(), GameState::Spinning);
    assert!(!s.state_mut().start_spin());
    assert!(s.spin().is_none());
    assert!(s.buy_bonus(sg_engine::BonusBuyTier::Anomaly).is_none());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    s.state_mut().on_change(move |new, _| sink.lock().push(new));
    assert!(s.play_through(&outcome));

    let seen = seen.lock();
    assert_eq!(seen.first(), Some(&GameState::Resolving));
    assert!(seen.contains(&GameState::WinDisplay));
    let cascading = seen.iter().filter(|s| **s == GameState::Cascading).count();
    assert_eq!(cascading, outcome.cascade_count());
}

#[test]
fn test_meter_listener_sees_session_charges() {
    let mut s = session(14);
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    s.meter_mut().on_threshold(move |t, _| sink.lock().push(t));

    s.set_meter(20.0).unwrap();
    let outcome = s.spin_forced(ForcedOutcome::BigCluster).unwrap();
    s.play_through(&outcome);

    // 20 + 20 crosses 25 on the first charge
    let fired = fired.lock();
    assert_eq!(fired.first(), Some(&25.0));
    assert!(fired.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_cascade_conservation_over_many_spins() {
    let mut s = session(15);
    for _ in 0..200 {
        let outcome = s.spin_settled(None).unwrap();
        let active = outcome.grid_size.active_cell_count();
        for step in &outcome.cascades {
            assert_eq!(step.spawned.len(), step.removed.len());
            assert_eq!(step.grid_after.occupied_count(), active);
            assert!(step.clusters.iter().all(|c| c.size() >= 5));
            for cluster in &step.clusters {
                assert!(cluster.cells.iter().all(|p| !outcome.grid_size.is_void(p.row, p.col)));
            }
        }
        assert!(outcome.cascade_count() <= 50);
    }
    assert_eq!(s.stats().total_spins, 200);
}

// ═══════════════════════════════════════════════════════════════════════════════
// BONUS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_scatter_trigger_enters_event_horizon() {
    let mut s = session(16);
    s.set_meter(40.0).unwrap();
    let outcome = s.spin_forced(ForcedOutcome::ScatterTrigger).unwrap();
    assert!(outcome.scatter_count >= 3);
    assert!(outcome.event_horizon);
    assert!(outcome.bonus_active_after);
    assert_eq!(s.meter().value(), 0.0);
    assert!(outcome
        .events
        .iter()
        .any(|e| matches!(e.kind, SpinEventKind::EventHorizon { spins: 10 })));

    assert!(s.play_through(&outcome));
    assert_eq!(s.state().current(), GameState::BonusActive);
    assert_eq!(s.grid_size(), GridSize::Bonus);
    assert_eq!(s.bonus().spins_remaining(), 10);
}

#[test]
fn test_bonus_round_plays_out() {
    let mut s = session(17);
    assert!(s.force_event_horizon());
    assert!(!s.force_event_horizon());
    assert!(s.bubbles().is_bonus());

    let mut bonus_spins = 0;
    let mut accumulated = 0.0;
    let mut bonus_total = None;
    while s.bonus().is_active() {
        let outcome = s.spin_settled(None).unwrap();
        assert!(outcome.in_bonus);
        assert_eq!(outcome.grid_size, GridSize::Bonus);
        assert!(!outcome.event_horizon);
        assert_eq!(outcome.bonus_spin, Some(bonus_spins + 1));
        for pos in &outcome.absorbed {
            assert_eq!(outcome.initial_grid.symbol_at(*pos), Some(SymbolId::Wild));
        }
        bonus_spins += 1;
        accumulated += outcome.total_win();
        bonus_total = outcome.bonus_total;
        assert!(bonus_spins <= 20);
    }

    assert!(bonus_spins >= 10);
    let total = bonus_total.expect("last bonus spin reports the total");
    assert!((total - accumulated).abs() < 1e-9);
    assert_eq!(s.state().current(), GameState::Idle);
    assert_eq!(s.grid_size(), GridSize::Base);
    assert_eq!(s.meter().value(), 0.0);
    assert!(!s.bubbles().is_bonus());
    assert_eq!(s.stats().bonus_spins, u64::from(bonus_spins));
}

#[test]
fn test_void_absorption_on_dead_bonus_grid() {
    let config = GameConfig {
        bonus: BonusConfig {
            absorption_rate: 1.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut s = session_with(config, 18);
    s.force_event_horizon();

    let outcome = s.spin_forced(ForcedOutcome::DeadSpin).unwrap();
    // Every active cell turns WILD, and WILDs alone never seed a cluster
    assert_eq!(outcome.absorbed.len(), 72);
    assert!(outcome.cascades.is_empty());
    assert!(outcome
        .events
        .iter()
        .any(|e| matches!(e.kind, SpinEventKind::VoidAbsorption { .. })));
}

#[test]
fn test_empty_bonus_award_is_rejected() {
    let config = GameConfig {
        bonus: BonusConfig {
            initial_spins: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(GameSession::with_seed(config, 21).is_err());
}

#[test]
fn test_single_spin_bonus_returns_to_base() {
    let config = GameConfig {
        bonus: BonusConfig {
            initial_spins: 1,
            max_spins: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut s = session_with(config, 22);
    let trigger = s.spin_settled(Some(ForcedOutcome::ScatterTrigger)).unwrap();
    assert!(trigger.event_horizon);
    assert_eq!(s.state().current(), GameState::BonusActive);

    // Scatters again: the retrigger has no headroom under max_spins
    let last = s.spin_settled(Some(ForcedOutcome::ScatterTrigger)).unwrap();
    assert!(last.in_bonus);
    assert_eq!(last.retrigger_spins, 0);
    assert!(last.bonus_total.is_some());
    assert!(!last.bonus_active_after);
    assert_eq!(s.state().current(), GameState::Idle);

    let next = s.spin_settled(None).unwrap();
    assert!(!next.in_bonus);
    assert_eq!(next.grid_size, GridSize::Base);
}

#[test]
fn test_meter_cleared_when_bonus_ends() {
    let mut s = session(23);
    s.force_event_horizon();

    // A full meter inside the bonus does not start another Event Horizon
    let crossed = s.set_meter(100.0).unwrap();
    assert_eq!(crossed, vec![25.0, 50.0, 75.0, 100.0]);
    assert!(s.bonus().is_active());
    assert_eq!(s.meter().value(), 100.0);

    while s.bonus().is_active() {
        s.spin_settled(Some(ForcedOutcome::DeadSpin)).unwrap();
    }
    assert_eq!(s.state().current(), GameState::Idle);
    assert_eq!(s.meter().value(), 0.0);

    // The 100% threshold is armed again in the base game
    assert_eq!(s.set_meter(100.0).unwrap(), vec![25.0, 50.0, 75.0, 100.0]);
    assert_eq!(s.state().current(), GameState::BonusActive);
}

#[test]
fn test_bonus_retrigger_is_capped() {
    let mut s = session(19);
    s.force_event_horizon();
    let mut total_awarded = s.bonus().spins_remaining();
    while s.bonus().is_active() {
        let outcome = s.spin_forced(ForcedOutcome::ScatterTrigger).unwrap();
        total_awarded += outcome.retrigger_spins;
        s.play_through(&outcome);
    }
    assert_eq!(total_awarded, 20);
    assert!(s.stats().retriggers > 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TIMELINE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_timeline_brackets_spin() {
    let mut s = session(20);
    for _ in 0..30 {
        let outcome = s.spin_settled(None).unwrap();
        let events = &outcome.events;
        assert_eq!(events.first().map(|e| e.kind.name()), Some("SPIN_START"));
        assert_eq!(events.last().map(|e| e.kind.name()), Some("SPIN_END"));
        assert!(events.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));

        let cascade_events = events
            .iter()
            .filter(|e| matches!(e.kind, SpinEventKind::CascadeStep { .. }))
            .count();
        assert_eq!(cascade_events, outcome.cascade_count());
    }
}
