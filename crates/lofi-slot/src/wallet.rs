//! Credit & bet bookkeeping
//!
//! The wallet owns credits, bet size and payline mode. Every operation that
//! changes credits or line count re-clamps the bet in the same call, so no
//! caller ever observes a bet the current credits cannot cover.

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};

/// Upper bound for the per-line bet
pub const MAX_BET: u64 = 10;

/// Credits a fresh game starts with
pub const STARTING_CREDITS: u64 = 100;

/// Payline mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMode {
    /// Center line only
    #[default]
    Single,
    /// Top, center and bottom lines
    Extra,
}

impl LineMode {
    pub fn from_extra_lines(extra_lines: bool) -> Self {
        if extra_lines { Self::Extra } else { Self::Single }
    }

    pub fn is_extra(self) -> bool {
        self == Self::Extra
    }

    /// Number of active paylines
    pub fn line_count(self) -> u64 {
        match self {
            Self::Single => 1,
            Self::Extra => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    credits: u64,
    bet: u64,
    line_mode: LineMode,
    max_bet: u64,
}

impl Wallet {
    /// Fresh wallet with bet 1 and the center line only
    pub fn new(credits: u64, max_bet: u64) -> Self {
        let mut wallet = Self {
            credits,
            bet: 1,
            line_mode: LineMode::Single,
            max_bet: max_bet.max(1),
        };
        wallet.clamp_bet();
        wallet
    }

    pub fn credits(&self) -> u64 {
        self.credits
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    pub fn line_mode(&self) -> LineMode {
        self.line_mode
    }

    pub fn extra_lines(&self) -> bool {
        self.line_mode.is_extra()
    }

    pub fn max_bet_limit(&self) -> u64 {
        self.max_bet
    }

    /// bet × active lines
    pub fn spin_cost(&self) -> u64 {
        self.bet.saturating_mul(self.line_mode.line_count())
    }

    /// Largest bet the current credits cover, limited by `MAX_BET`. May be 0.
    pub fn bet_cap(&self) -> u64 {
        self.max_bet
            .min(self.credits / self.line_mode.line_count())
    }

    /// `bet_cap()` floored at 1, the range ceiling used for clamping and display
    pub fn effective_cap(&self) -> u64 {
        self.bet_cap().max(1)
    }

    pub fn can_afford_spin(&self) -> bool {
        self.credits >= self.spin_cost()
    }

    /// Set the bet, clamped into `1..=effective_cap()`. Returns the applied bet.
    pub fn set_bet(&mut self, bet: u64) -> u64 {
        self.bet = bet.clamp(1, self.effective_cap());
        debug_assert!(self.validate_bet(self.bet).is_ok());
        self.bet
    }

    pub fn increase_bet(&mut self) -> u64 {
        self.set_bet(self.bet.saturating_add(1))
    }

    pub fn decrease_bet(&mut self) -> u64 {
        self.set_bet(self.bet.saturating_sub(1))
    }

    /// Bet as high as credits and `MAX_BET` allow
    pub fn max_bet(&mut self) -> u64 {
        self.set_bet(self.effective_cap())
    }

    pub fn reset_bet(&mut self) -> u64 {
        self.set_bet(1)
    }

    /// Switch payline mode and re-clamp the bet against the new cap
    pub fn set_extra_lines(&mut self, extra_lines: bool) {
        self.line_mode = LineMode::from_extra_lines(extra_lines);
        self.clamp_bet();
    }

    /// Deduct `amount` if affordable. Nothing changes on failure.
    pub fn charge(&mut self, amount: u64) -> SlotResult<()> {
        if self.credits < amount {
            return Err(SlotError::InsufficientCredits {
                needed: amount,
                available: self.credits,
            });
        }
        self.credits -= amount;
        self.clamp_bet();
        Ok(())
    }

    /// Add a payout
    pub fn credit(&mut self, amount: u64) {
        self.credits = self.credits.saturating_add(amount);
        self.clamp_bet();
    }

    /// Check a bet against the current range without applying it
    pub fn validate_bet(&self, bet: u64) -> SlotResult<()> {
        if (1..=self.effective_cap()).contains(&bet) {
            Ok(())
        } else {
            Err(SlotError::InvalidBet(bet))
        }
    }

    fn clamp_bet(&mut self) {
        self.bet = self.bet.clamp(1, self.effective_cap());
        debug_assert!(self.validate_bet(self.bet).is_ok());
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new(STARTING_CREDITS, MAX_BET)
    }
}
