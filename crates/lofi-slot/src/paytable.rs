//! Paylines, line evaluation and payouts

use serde::{Deserialize, Serialize};

use lofi_stage::WinLine;

use crate::spin::SpinSnapshot;
use crate::symbols::{REEL_COUNT, Symbol};
use crate::wallet::LineMode;

/// A straight payline across all three reels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payline {
    Top,
    Mid,
    Bot,
}

impl Payline {
    /// Evaluation order with extra lines enabled
    pub const ALL: [Payline; 3] = [Payline::Top, Payline::Mid, Payline::Bot];

    /// Lines active in a given mode
    pub fn active(mode: LineMode) -> &'static [Payline] {
        match mode {
            LineMode::Single => &[Payline::Mid],
            LineMode::Extra => &Self::ALL,
        }
    }

    /// Row offset from the reel position
    pub fn row_offset(self) -> i64 {
        match self {
            Payline::Top => -1,
            Payline::Mid => 0,
            Payline::Bot => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Payline::Top => "top",
            Payline::Mid => "mid",
            Payline::Bot => "bot",
        }
    }

    /// Player-facing label
    pub fn label(self) -> &'static str {
        match self {
            Payline::Top => "Top",
            Payline::Mid => "Center",
            Payline::Bot => "Bottom",
        }
    }
}

/// Outcome of matching one line's three symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch {
    pub symbol: Symbol,
    pub match_count: u8,
}

/// Three of a kind, otherwise the first equal pair in order
/// (0,1), (1,2), (0,2), otherwise nothing
pub fn match_line(symbols: [Symbol; REEL_COUNT]) -> Option<LineMatch> {
    let [s0, s1, s2] = symbols;
    let (symbol, match_count) = if s0 == s1 && s1 == s2 {
        (s0, 3)
    } else if s0 == s1 {
        (s0, 2)
    } else if s1 == s2 {
        (s1, 2)
    } else if s0 == s2 {
        (s0, 2)
    } else {
        return None;
    };
    Some(LineMatch {
        symbol,
        match_count,
    })
}

/// A winning payline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Win {
    pub line: Payline,
    pub symbol: Symbol,
    pub match_count: u8,
    pub payout: u64,
}

impl Win {
    /// Stage payload form
    pub fn to_win_line(&self) -> WinLine {
        WinLine {
            line: self.line.name().to_string(),
            symbol_id: self.symbol.id(),
            symbol: self.symbol.glyph().to_string(),
            match_count: self.match_count,
            win_amount: self.payout,
        }
    }
}

/// All wins of one spin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub wins: Vec<Win>,
    pub total_win: u64,
}

impl EvaluationResult {
    pub fn is_win(&self) -> bool {
        !self.wins.is_empty()
    }
}

/// The two fixed multipliers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayTable {
    /// Two of a kind pays bet × this
    pub pair_multiplier: u64,
    /// Three of a kind pays bet × this
    pub triple_multiplier: u64,
}

impl PayTable {
    pub fn standard() -> Self {
        Self {
            pair_multiplier: 2,
            triple_multiplier: 5,
        }
    }

    /// Award for one line
    pub fn payout(&self, bet: u64, match_count: u8) -> u64 {
        match match_count {
            3 => bet.saturating_mul(self.triple_multiplier),
            2 => bet.saturating_mul(self.pair_multiplier),
            _ => 0,
        }
    }

    /// Evaluate every line that was active when the spin started.
    /// Lines are independent; the total is summed once at the end.
    pub fn evaluate(&self, snapshot: &SpinSnapshot) -> EvaluationResult {
        let wins: Vec<Win> = Payline::active(snapshot.line_mode)
            .iter()
            .filter_map(|&line| {
                let found = match_line(snapshot.line_symbols(line))?;
                Some(Win {
                    line,
                    symbol: found.symbol,
                    match_count: found.match_count,
                    payout: self.payout(snapshot.bet, found.match_count),
                })
            })
            .collect();

        let total_win = wins.iter().map(|w| w.payout).sum();
        EvaluationResult { wins, total_win }
    }
}

impl Default for PayTable {
    fn default() -> Self {
        Self::standard()
    }
}
