//! StageTrace: The complete sequence of stage events for one spin
//!
//! A trace captures the full timeline of a game round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::StageEvent;
use crate::stage::Stage;

/// Number of reels every trace is expected to stop
pub const TRACE_REEL_COUNT: usize = 3;

/// A complete trace of stage events for one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Spin this trace belongs to
    #[serde(default)]
    pub spin_id: Option<u64>,

    /// All events in the order they were published
    pub events: Vec<StageEvent>,

    /// When recording started
    pub recorded_at: DateTime<Utc>,

    /// Custom metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl StageTrace {
    /// Create a new empty trace
    pub fn new(spin_id: Option<u64>) -> Self {
        Self {
            spin_id,
            events: Vec::new(),
            recorded_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Span between first and last event in milliseconds
    pub fn duration_ms(&self) -> u64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp_ms.saturating_sub(first.timestamp_ms),
            _ => 0,
        }
    }

    /// Get events by stage type name
    pub fn events_by_type(&self, type_name: &str) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.stage.type_name() == type_name)
            .collect()
    }

    /// Check if trace contains a specific stage type
    pub fn has_stage(&self, type_name: &str) -> bool {
        self.events.iter().any(|e| e.stage.type_name() == type_name)
    }

    fn position_of(&self, type_name: &str) -> Option<usize> {
        self.events
            .iter()
            .position(|e| e.stage.type_name() == type_name)
    }

    /// Get all reel stop events
    pub fn reel_stops(&self) -> Vec<&StageEvent> {
        self.events_by_type("reel_stop")
    }

    /// Reel indices in the order they stopped
    pub fn stop_order(&self) -> Vec<u8> {
        self.reel_stops()
            .iter()
            .filter_map(|e| e.stage.reel_index())
            .collect()
    }

    /// Total credited amount (0 for a losing spin)
    pub fn total_win(&self) -> u64 {
        self.events
            .iter()
            .rev()
            .find_map(|e| match &e.stage {
                Stage::WinPresent { win_amount, .. } => Some(*win_amount),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Validate trace has the required stages in the required order
    pub fn validate(&self) -> TraceValidation {
        let stop_order = self.stop_order();
        let last_stop = self
            .events
            .iter()
            .rposition(|e| matches!(e.stage, Stage::ReelStop { .. }));
        let evaluate = self.position_of("evaluate_wins");

        TraceValidation {
            has_spin_start: self.position_of("spin_start") == Some(0),
            has_spin_end: self
                .events
                .last()
                .is_some_and(|e| e.stage == Stage::SpinEnd),
            reel_stop_count: stop_order.len() as u8,
            reels_in_order: stop_order
                .iter()
                .copied()
                .eq(0..TRACE_REEL_COUNT as u8),
            evaluate_after_stops: matches!((last_stop, evaluate), (Some(s), Some(e)) if s < e),
            has_result: self.has_stage("win_present") || self.has_stage("no_win"),
        }
    }
}

/// Validation result for a trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceValidation {
    pub has_spin_start: bool,
    pub has_spin_end: bool,
    pub reel_stop_count: u8,
    pub reels_in_order: bool,
    pub evaluate_after_stops: bool,
    pub has_result: bool,
}

impl TraceValidation {
    pub fn is_valid(&self) -> bool {
        self.has_spin_start
            && self.has_spin_end
            && self.reels_in_order
            && self.evaluate_after_stops
            && self.has_result
    }

    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();

        if !self.has_spin_start {
            warnings.push("Missing SPIN_START event");
        }
        if !self.has_spin_end {
            warnings.push("Missing SPIN_END event");
        }
        if !self.reels_in_order {
            warnings.push("Reels did not stop in order 0, 1, 2");
        }
        if !self.evaluate_after_stops {
            warnings.push("EVALUATE_WINS not after the last REEL_STOP");
        }
        if !self.has_result {
            warnings.push("Missing WIN_PRESENT / NO_WIN result");
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_basic_trace() -> StageTrace {
        let mut trace = StageTrace::new(Some(1));

        trace.push(StageEvent::new(Stage::SpinStart, 0));
        for (i, ms) in [900, 1250, 1600].into_iter().enumerate() {
            trace.push(StageEvent::new(
                Stage::ReelStop {
                    reel_index: i as u8,
                    symbols: vec![1, 2, 3],
                },
                ms,
            ));
        }
        trace.push(StageEvent::new(Stage::EvaluateWins, 1680));
        trace.push(StageEvent::new(
            Stage::WinPresent {
                win_amount: 7,
                line_count: 2,
            },
            1680,
        ));
        trace.push(StageEvent::new(Stage::SpinEnd, 1680));

        trace
    }

    #[test]
    fn test_trace_duration() {
        let trace = create_basic_trace();
        assert_eq!(trace.duration_ms(), 1680);
        assert_eq!(StageTrace::new(None).duration_ms(), 0);
    }

    #[test]
    fn test_trace_total_win() {
        let trace = create_basic_trace();
        assert_eq!(trace.total_win(), 7);
    }

    #[test]
    fn test_trace_validation() {
        let trace = create_basic_trace();
        let validation = trace.validate();

        assert!(validation.is_valid(), "{:?}", validation.warnings());
        assert_eq!(validation.reel_stop_count, 3);
        assert_eq!(trace.stop_order(), vec![0, 1, 2]);
    }

    #[test]
    fn test_out_of_order_trace_is_invalid() {
        let mut trace = StageTrace::new(None);
        trace.push(StageEvent::new(Stage::SpinStart, 0));
        trace.push(StageEvent::new(Stage::EvaluateWins, 10));
        for i in [1u8, 0, 2] {
            trace.push(StageEvent::new(
                Stage::ReelStop {
                    reel_index: i,
                    symbols: Vec::new(),
                },
                20,
            ));
        }
        trace.push(StageEvent::new(Stage::NoWin, 30));
        trace.push(StageEvent::new(Stage::SpinEnd, 30));

        let validation = trace.validate();
        assert!(!validation.is_valid());
        assert!(!validation.reels_in_order);
        assert!(!validation.evaluate_after_stops);
        assert_eq!(validation.warnings().len(), 2);
    }
}
