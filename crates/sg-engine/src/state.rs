//! Game state machine
//!
//! Base: IDLE → SPINNING → RESOLVING ⇄ CASCADING → WIN_DISPLAY → IDLE
//! Bonus: … → EVENT_HORIZON → BONUS_ACTIVE (loops SPINNING … WIN_DISPLAY)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::observer::{ListenerId, ListenerRegistry};

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    #[default]
    Idle,
    Spinning,
    Resolving,
    Cascading,
    WinDisplay,
    EventHorizon,
    BonusActive,
}

impl GameState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Spinning => "SPINNING",
            Self::Resolving => "RESOLVING",
            Self::Cascading => "CASCADING",
            Self::WinDisplay => "WIN_DISPLAY",
            Self::EventHorizon => "EVENT_HORIZON",
            Self::BonusActive => "BONUS_ACTIVE",
        }
    }

    /// States that accept a new spin
    pub fn can_spin(&self) -> bool {
        matches!(self, Self::Idle | Self::BonusActive)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A state machine call, used to replay a spin's transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    SpinComplete,
    StartCascade,
    CascadeComplete,
    ShowWin,
    StartEventHorizon,
    EnterBonus,
    ReturnToIdle { in_bonus: bool },
}

impl Transition {
    /// Apply to a state machine. Returns false when rejected.
    pub fn apply(self, machine: &mut GameStateMachine) -> bool {
        match self {
            Self::SpinComplete => machine.spin_complete(),
            Self::StartCascade => machine.start_cascade(),
            Self::CascadeComplete => machine.cascade_complete(),
            Self::ShowWin => machine.show_win(),
            Self::StartEventHorizon => machine.start_event_horizon(),
            Self::EnterBonus => machine.enter_bonus(),
            Self::ReturnToIdle { in_bonus } => machine.return_to_idle(in_bonus),
        }
    }
}

/// Transition callback: `(new, old)`
pub type StateListener = dyn FnMut(GameState, GameState) + Send;

/// Guarded state machine. Illegal calls return false and leave the state
/// untouched.
#[derive(Debug, Default)]
pub struct GameStateMachine {
    state: GameState,
    listeners: ListenerRegistry<StateListener>,
}

impl GameStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> GameState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == GameState::Idle
    }

    pub fn is_bonus(&self) -> bool {
        self.state == GameState::BonusActive
    }

    pub fn on_change(&mut self, listener: impl FnMut(GameState, GameState) + Send + 'static) -> ListenerId {
        self.listeners.register(Box::new(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }

    fn guarded(&mut self, allowed: bool, next: GameState, action: &str) -> bool {
        if !allowed {
            log::trace!("rejected {action} in {}", self.state);
            return false;
        }
        let old = self.state;
        self.state = next;
        log::debug!("state {old} -> {next}");
        for listener in self.listeners.iter_mut() {
            listener(next, old);
        }
        true
    }

    pub fn start_spin(&mut self) -> bool {
        let allowed = self.state.can_spin();
        self.guarded(allowed, GameState::Spinning, "start_spin")
    }

    pub fn spin_complete(&mut self) -> bool {
        let allowed = self.state == GameState::Spinning;
        self.guarded(allowed, GameState::Resolving, "spin_complete")
    }

    pub fn start_cascade(&mut self) -> bool {
        let allowed = self.state == GameState::Resolving;
        self.guarded(allowed, GameState::Cascading, "start_cascade")
    }

    pub fn cascade_complete(&mut self) -> bool {
        let allowed = self.state == GameState::Cascading;
        self.guarded(allowed, GameState::Resolving, "cascade_complete")
    }

    pub fn show_win(&mut self) -> bool {
        let allowed = self.state == GameState::Resolving;
        self.guarded(allowed, GameState::WinDisplay, "show_win")
    }

    pub fn start_event_horizon(&mut self) -> bool {
        let allowed = self.state != GameState::EventHorizon;
        self.guarded(allowed, GameState::EventHorizon, "start_event_horizon")
    }

    pub fn enter_bonus(&mut self) -> bool {
        let allowed = self.state == GameState::EventHorizon;
        self.guarded(allowed, GameState::BonusActive, "enter_bonus")
    }

    pub fn return_to_idle(&mut self, in_bonus: bool) -> bool {
        let allowed = self.state == GameState::WinDisplay;
        let next = if in_bonus { GameState::BonusActive } else { GameState::Idle };
        self.guarded(allowed, next, "return_to_idle")
    }

    /// Unconditionally return to IDLE (session reset)
    pub fn reset(&mut self) {
        if self.state != GameState::Idle {
            self.guarded(true, GameState::Idle, "reset");
        }
    }
}
