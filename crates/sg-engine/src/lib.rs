//! # sg-engine - Singularity cluster-pays game core
//!
//! Deterministic game logic for a cascading cluster-pays slot played on a
//! square grid with a void core. Rendering, audio and UI live elsewhere and
//! consume the spin outcomes and timelines produced here.
//!
//! ## Features
//!
//! - **Cluster Pays**: orthogonal flood fill with WILD substitution, 5+ to pay
//! - **Cascades**: remove, settle per void-split column run, respawn, repeat
//! - **Singularity Meter**: charge by cluster size, threshold effects at 25/50/75/100
//! - **Multiplier Bubbles**: orbit the perimeter, multiply the cascade step they land on
//! - **Event Horizon**: 9×9 free spins with void absorption and retriggers
//! - **Timeline**: timestamped presentation events per spin
//!
//! ## Architecture
//!
//! ```text
//! GameSession
//!     │
//!     ├── GameConfig (symbols, cascade cap, meter, bubbles, bonus, bets, timing)
//!     ├── PayTable ── SymbolTable
//!     ├── SingularityMeter ── ListenerRegistry
//!     ├── MultiplierSystem
//!     ├── BonusMode
//!     └── GameStateMachine ── ListenerRegistry
//!           │
//!           v
//!     generate_grid → find_clusters → resolve_cascades
//!           │
//!           v
//!     SpinOutcome → Vec<SpinEvent> → AnimationSequencer
//! ```

pub mod bonus;
pub mod cascade;
pub mod cluster;
pub mod config;
pub mod error;
pub mod events;
pub mod generator;
pub mod grid;
pub mod meter;
pub mod multiplier;
pub mod observer;
pub mod paytable;
pub mod sequencer;
pub mod session;
pub mod spin;
pub mod state;
pub mod symbols;
pub mod timing;

pub use bonus::*;
pub use cascade::*;
pub use cluster::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use generator::*;
pub use grid::*;
pub use meter::*;
pub use multiplier::*;
pub use observer::*;
pub use paytable::*;
pub use sequencer::*;
pub use session::*;
pub use spin::*;
pub use state::*;
pub use symbols::*;
pub use timing::*;
