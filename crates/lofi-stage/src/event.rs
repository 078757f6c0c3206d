//! StageEvent: A stage occurrence with metadata
//!
//! Wraps a Stage with timing, payload, and source information.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Tag carried by events a host command caused directly (spin, reset, ...),
/// as opposed to ones fired by spin timers
pub const USER_INITIATED_TAG: &str = "user_initiated";

/// A stage event with full metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The canonical stage
    pub stage: Stage,

    /// Milliseconds since the owning spin started (0 outside a spin)
    pub timestamp_ms: u64,

    /// Additional payload data
    #[serde(default)]
    pub payload: StagePayload,

    /// Custom tags for filtering/routing
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StageEvent {
    pub fn new(stage: Stage, timestamp_ms: u64) -> Self {
        Self {
            stage,
            timestamp_ms,
            payload: StagePayload::default(),
            tags: Vec::new(),
        }
    }

    pub fn with_payload(stage: Stage, timestamp_ms: u64, payload: StagePayload) -> Self {
        Self {
            stage,
            timestamp_ms,
            payload,
            tags: Vec::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}

/// One winning payline as reported to listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLine {
    /// Payline name ("top", "mid", "bot")
    pub line: String,
    /// Winning symbol id
    pub symbol_id: u32,
    /// Winning symbol glyph
    pub symbol: String,
    /// Number of matching symbols (2 or 3)
    pub match_count: u8,
    /// Award for this line
    pub win_amount: u64,
}

/// Additional payload data for a stage event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagePayload {
    // ═══ WIN DATA ═══
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_amount: Option<u64>,

    /// Bet per line for the spin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_amount: Option<u64>,

    /// Total cost of the spin (bet × active lines)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_cost: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub win_lines: Vec<WinLine>,

    // ═══ GAME STATE ═══
    /// Credits after the stage was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_id: Option<u64>,

    /// Status message published alongside the stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StagePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with win data
    pub fn with_win(win_amount: u64, bet_amount: u64) -> Self {
        Self {
            win_amount: Some(win_amount),
            bet_amount: Some(bet_amount),
            ..Default::default()
        }
    }

    /// Builder: set spin id
    pub fn spin_id(mut self, spin_id: u64) -> Self {
        self.spin_id = Some(spin_id);
        self
    }

    /// Builder: set balance
    pub fn balance(mut self, credits: u64) -> Self {
        self.balance = Some(credits);
        self
    }

    /// Builder: set spin cost
    pub fn spin_cost(mut self, cost: u64) -> Self {
        self.spin_cost = Some(cost);
        self
    }

    /// Builder: set bet
    pub fn bet_amount(mut self, bet: u64) -> Self {
        self.bet_amount = Some(bet);
        self
    }

    /// Builder: set winning lines
    pub fn win_lines(mut self, lines: Vec<WinLine>) -> Self {
        self.win_lines = lines;
        self
    }

    /// Builder: set status message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Win-to-spin-cost ratio if both amounts are present
    pub fn win_ratio(&self) -> Option<f64> {
        match (self.win_amount, self.spin_cost) {
            (Some(win), Some(cost)) if cost > 0 => Some(win as f64 / cost as f64),
            _ => None,
        }
    }
}
