//! Cooperative timer scheduler
//!
//! Virtual-clock scheduling for the spin lifecycle. The host advances time;
//! due timers are handed out one at a time in (deadline, insertion) order so
//! every callback runs to completion before the next one starts. Nothing here
//! sleeps or spawns.

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle for cancelling a scheduled timer
pub type TimerId = u64;

/// One-shot or repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Once,
    Interval { period_ms: u64 },
}

/// Timer scheduled for future execution
#[derive(Debug, Clone)]
struct PendingTimer<T> {
    id: TimerId,
    /// Tie-breaker for equal deadlines
    seq: u64,
    /// Absolute virtual time at which to fire
    deadline_ms: u64,
    kind: TimerKind,
    payload: T,
}

impl<T> PendingTimer<T> {
    #[inline]
    fn order_key(&self) -> (u64, u64) {
        (self.deadline_ms, self.seq)
    }
}

/// A timer that came due
#[derive(Debug, Clone, PartialEq)]
pub struct FiredTimer<T> {
    pub id: TimerId,
    /// Virtual time the timer fired at
    pub at_ms: u64,
    pub payload: T,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEDULER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: TimerId,
    next_seq: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|t| t.deadline_ms).min()
    }

    /// Fire once, `delay_ms` from now
    pub fn schedule_once(&mut self, delay_ms: u64, payload: T) -> TimerId {
        self.push(delay_ms, TimerKind::Once, payload)
    }

    /// Fire every `period_ms` (at least 1), first time one period from now
    pub fn schedule_interval(&mut self, period_ms: u64, payload: T) -> TimerId {
        let period_ms = period_ms.max(1);
        self.push(period_ms, TimerKind::Interval { period_ms }, payload)
    }

    fn push(&mut self, delay_ms: u64, kind: TimerKind, payload: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.take_seq();
        self.pending.push(PendingTimer {
            id,
            seq,
            deadline_ms: self.now_ms.saturating_add(delay_ms),
            kind,
            payload,
        });
        id
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Cancel one timer. Returns false if it already fired (one-shot) or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancel everything. Returns how many timers were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Hand out the next timer due at or before `until_ms`, moving the clock
    /// to its deadline. Intervals re-arm one period later.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<FiredTimer<T>> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline_ms <= until_ms)
            .min_by_key(|(_, t)| t.order_key())
            .map(|(i, _)| i)?;

        let at_ms = self.pending[index].deadline_ms;
        self.now_ms = self.now_ms.max(at_ms);

        let fired = match self.pending[index].kind {
            TimerKind::Once => {
                let timer = self.pending.swap_remove(index);
                FiredTimer {
                    id: timer.id,
                    at_ms,
                    payload: timer.payload,
                }
            }
            TimerKind::Interval { period_ms } => {
                let seq = self.take_seq();
                let timer = &mut self.pending[index];
                timer.deadline_ms = at_ms.saturating_add(period_ms);
                timer.seq = seq;
                FiredTimer {
                    id: timer.id,
                    at_ms,
                    payload: timer.payload.clone(),
                }
            }
        };
        Some(fired)
    }

    /// Move the clock to `until_ms` once everything due has been popped
    pub fn finish(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
