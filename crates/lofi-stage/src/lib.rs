//! # lofi-stage: Lofi Slot Stage System
//!
//! Defines the canonical phases a spin passes through. The engine never
//! talks to renderers or audio players directly; it publishes STAGES and
//! lets whoever is listening react to them.
//!
//! ## Philosophy
//!
//! Every spin walks the same path:
//! - Spin starts → Reels stop one by one → Wins evaluated → Spin ends
//!
//! A spin-start sound cue listens for [`Stage::SpinStart`], a win cue for
//! [`Stage::WinPresent`].

pub mod event;
pub mod stage;
pub mod trace;

pub use event::*;
pub use stage::*;
pub use trace::*;
