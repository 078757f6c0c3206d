//! Timing profiles for the spin lifecycle

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::symbols::REEL_COUNT;

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Reference gameplay timing
    #[default]
    Normal,
    /// Fast mode, same shape at roughly half the duration
    Turbo,
    /// Hand-tuned or scaled values
    Custom,
}

/// Spin timing in milliseconds, measured from spin start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Interval between rolling position draws, per reel
    pub tick_interval_ms: u64,

    /// Settle deadline of each reel
    pub reel_stop_ms: [u64; REEL_COUNT],

    /// Delay between the last reel settling and resolution
    pub resolve_grace_ms: u64,
}

impl TimingConfig {
    /// Reference gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            tick_interval_ms: 70,
            reel_stop_ms: [900, 1250, 1600],
            resolve_grace_ms: 80,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            tick_interval_ms: 40,
            reel_stop_ms: [450, 625, 800],
            resolve_grace_ms: 40,
        }
    }

    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster). Durations never drop below 1ms.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| ((ms as f64 * factor).round() as u64).max(1);
        Self {
            profile: TimingProfile::Custom,
            tick_interval_ms: scale(self.tick_interval_ms),
            reel_stop_ms: self.reel_stop_ms.map(scale),
            resolve_grace_ms: scale(self.resolve_grace_ms),
        }
    }

    /// Time from spin start until the spin resolves
    pub fn total_spin_duration(&self) -> u64 {
        self.reel_stop_ms[REEL_COUNT - 1] + self.resolve_grace_ms
    }

    /// Reels must settle strictly in order 0, 1, 2
    pub fn validate(&self) -> SlotResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(SlotError::Config("tick_interval_ms must be > 0".into()));
        }
        if self.reel_stop_ms[0] == 0 {
            return Err(SlotError::Config("reel_stop_ms[0] must be > 0".into()));
        }
        if self.reel_stop_ms.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SlotError::Config(format!(
                "reel_stop_ms must be strictly increasing, got {:?}",
                self.reel_stop_ms
            )));
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}
