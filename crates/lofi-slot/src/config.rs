//! Slot machine configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::paytable::PayTable;
use crate::timing::TimingConfig;
use crate::wallet::{LineMode, MAX_BET, STARTING_CREDITS};

/// Everything tunable about a session. Defaults reproduce the reference game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Credits after start and after every reset
    pub starting_credits: u64,

    /// Upper bound for the per-line bet
    pub max_bet: u64,

    pub paytable: PayTable,

    pub timing: TimingConfig,

    /// Fixed RNG seed (None = OS entropy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SlotConfig {
    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load<P: AsRef<Path>>(path: P) -> SlotResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let config: SlotConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| SlotError::Config(format!("{}: {e}", path.display())))?,
            Some("yaml" | "yml") => serde_yml::from_str(&content)
                .map_err(|e| SlotError::Config(format!("{}: {e}", path.display())))?,
            other => {
                return Err(SlotError::Config(format!(
                    "unsupported config format {:?} for {}",
                    other.unwrap_or(""),
                    path.display()
                )));
            }
        };

        config.validate()?;
        log::info!("loaded slot config from {}", path.display());
        Ok(config)
    }

    /// Save as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SlotResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SlotError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn validate(&self) -> SlotResult<()> {
        if self.max_bet == 0 {
            return Err(SlotError::Config("max_bet must be >= 1".into()));
        }
        if self.paytable.pair_multiplier == 0 || self.paytable.triple_multiplier == 0 {
            return Err(SlotError::Config("paytable multipliers must be >= 1".into()));
        }
        // A max bet on every line, each paying the top multiplier, must fit in a u64
        let top_multiplier = self
            .paytable
            .pair_multiplier
            .max(self.paytable.triple_multiplier);
        if self
            .max_bet
            .checked_mul(LineMode::Extra.line_count())
            .and_then(|stake| stake.checked_mul(top_multiplier))
            .is_none()
        {
            return Err(SlotError::Config(format!(
                "max_bet {} x {} lines x {} overflows",
                self.max_bet,
                LineMode::Extra.line_count(),
                top_multiplier
            )));
        }
        self.timing.validate()
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            starting_credits: STARTING_CREDITS,
            max_bet: MAX_BET,
            paytable: PayTable::standard(),
            timing: TimingConfig::normal(),
            seed: None,
        }
    }
}
