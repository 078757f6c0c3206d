//! Stage: The enum defining every canonical spin phase
//!
//! A Stage is NOT an animation and NOT a timer callback.
//! A Stage is the SEMANTIC MEANING of a moment in the spin flow.

use serde::{Deserialize, Serialize};

/// Why a spin request was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Credits do not cover the spin cost
    InsufficientCredits,
}

/// Canonical spin stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    // ═══════════════════════════════════════════════════════════════════════
    // SPIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Spin accepted, cost deducted, reels start rolling
    SpinStart,

    /// Reel is rolling (emitted once per reel at spin start)
    ReelSpinning {
        /// Which reel (0-indexed)
        reel_index: u8,
    },

    /// Reel has settled on its final position
    ReelStop {
        /// Which reel stopped (0-indexed)
        reel_index: u8,
        /// Visible symbol ids on this reel (top, mid, bottom)
        #[serde(default)]
        symbols: Vec<u32>,
    },

    /// All reels settled, paylines being evaluated
    EvaluateWins,

    /// Spin complete, machine idle again
    SpinEnd,

    /// Spin request refused before anything moved
    SpinRejected {
        reason: RejectReason,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // WIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Spin resolved with at least one winning line
    WinPresent {
        /// Total credited amount
        win_amount: u64,
        /// Number of winning lines
        line_count: u8,
    },

    /// Individual winning payline
    WinLineShow {
        /// Payline name ("top", "mid", "bot")
        line: String,
        /// Award for this line
        line_amount: u64,
    },

    /// Spin resolved without a win
    NoWin,

    // ═══════════════════════════════════════════════════════════════════════
    // SESSION
    // ═══════════════════════════════════════════════════════════════════════
    /// Game forced back to its default idle state
    GameReset,
}

impl Stage {
    /// Stable snake_case name, matches the serde tag
    pub fn type_name(&self) -> &'static str {
        match self {
            Stage::SpinStart => "spin_start",
            Stage::ReelSpinning { .. } => "reel_spinning",
            Stage::ReelStop { .. } => "reel_stop",
            Stage::EvaluateWins => "evaluate_wins",
            Stage::SpinEnd => "spin_end",
            Stage::SpinRejected { .. } => "spin_rejected",
            Stage::WinPresent { .. } => "win_present",
            Stage::WinLineShow { .. } => "win_line_show",
            Stage::NoWin => "no_win",
            Stage::GameReset => "game_reset",
        }
    }

    /// Reel index carried by the stage, if any
    pub fn reel_index(&self) -> Option<u8> {
        match self {
            Stage::ReelSpinning { reel_index } | Stage::ReelStop { reel_index, .. } => {
                Some(*reel_index)
            }
            _ => None,
        }
    }

    /// Does this stage belong to a spin's timeline?
    pub fn is_spin_lifecycle(&self) -> bool {
        !matches!(self, Stage::SpinRejected { .. } | Stage::GameReset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_matches_serde_tag() {
        let stage = Stage::ReelStop {
            reel_index: 2,
            symbols: vec![1, 2, 3],
        };
        let json = serde_json::to_value(&stage).unwrap();
        assert_eq!(json["type"], stage.type_name());

        let json = serde_json::to_value(Stage::EvaluateWins).unwrap();
        assert_eq!(json["type"], "evaluate_wins");
    }

    #[test]
    fn test_reel_index() {
        assert_eq!(Stage::ReelSpinning { reel_index: 1 }.reel_index(), Some(1));
        assert_eq!(Stage::SpinStart.reel_index(), None);
    }

    #[test]
    fn test_lifecycle_classification() {
        assert!(Stage::SpinStart.is_spin_lifecycle());
        assert!(!Stage::GameReset.is_spin_lifecycle());
        assert!(
            !Stage::SpinRejected {
                reason: RejectReason::InsufficientCredits
            }
            .is_spin_lifecycle()
        );
    }
}
