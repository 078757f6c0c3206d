//! # lofi-slot: Spin Resolution Engine for Lofi Slot
//!
//! A three-reel, three-row slot mini-game: the player wagers credits, the
//! reels roll on timers and settle one after another, and up to three
//! straight paylines are evaluated against the reels captured at spin start.
//!
//! ## Features
//!
//! - **Fresh reels per spin**: every reel is a shuffled permutation of a 12 symbol alphabet
//! - **Timed lifecycle**: per-reel ticks, staggered settles, a grace delay, then resolution
//! - **Extra lines**: center line only, or top, center and bottom at three times the cost
//! - **Stage events**: `SpinStart`, `ReelStop`, `WinPresent`, ... for audio and UI layers
//! - **Timing profiles**: Normal and Turbo, plus scaled custom timing
//!
//! ## Architecture
//!
//! ```text
//! SlotMachine
//!     │
//!     ├── Wallet (credits, bet, line mode)
//!     ├── ReelGenerator → Arc<ReelSet>
//!     ├── SpinMachine ── Scheduler<SpinTimer> (virtual clock)
//!     └── PayTable
//!           │
//!           v
//!     SpinSnapshot → EvaluationResult → GameState + Vec<StageEvent>
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod paytable;
pub mod scheduler;
pub mod spin;
pub mod symbols;
pub mod timing;
pub mod wallet;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use paytable::*;
pub use scheduler::*;
pub use spin::*;
pub use symbols::*;
pub use timing::*;
pub use wallet::*;

pub use lofi_stage;
