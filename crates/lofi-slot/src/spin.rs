//! Spin state machine
//!
//! ```text
//!            spin()                 last reel settled + grace
//!   Idle ───────────────▶ Spinning ─────────────────────────▶ Resolving ──▶ Idle
//!     ▲                      │  per reel: Rolling ──deadline──▶ Settled
//!     └──────── reset() ─────┘
//! ```
//!
//! Each spin carries an immutable [`SpinPlan`] (the reels, bet and line mode
//! fixed at spin start). Every timer of that spin holds the plan, and the
//! final [`SpinSnapshot`] is built from it, so evaluation never reads reels
//! that a later spin or a reset may have replaced.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::paytable::Payline;
use crate::scheduler::{Scheduler, TimerId};
use crate::symbols::{REEL_COUNT, ReelSet, Symbol};
use crate::timing::TimingConfig;
use crate::wallet::LineMode;

/// Machine-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhase {
    #[default]
    Idle,
    Spinning,
    /// Only held while a resolution is being applied
    Resolving,
}

/// Per-reel sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReelState {
    Rolling,
    #[default]
    Settled,
}

/// Everything fixed at spin start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinPlan {
    pub spin_id: u64,
    pub reels: Arc<ReelSet>,
    pub bet: u64,
    pub line_mode: LineMode,
    pub cost: u64,
}

/// Immutable input to the payline evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinSnapshot {
    pub spin_id: u64,
    pub reels: Arc<ReelSet>,
    pub positions: [usize; REEL_COUNT],
    pub bet: u64,
    pub line_mode: LineMode,
    /// Credits charged when the spin started
    pub cost: u64,
}

impl SpinSnapshot {
    /// Symbols under a payline, reel 0 to 2
    pub fn line_symbols(&self, line: Payline) -> [Symbol; REEL_COUNT] {
        let reels = self.reels.reels();
        std::array::from_fn(|r| reels[r].symbol_at(self.positions[r], line.row_offset()))
    }
}

/// What a timer asks the machine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinStep {
    Tick(usize),
    Settle(usize),
    Resolve,
}

/// Timer payload
#[derive(Debug, Clone)]
pub struct SpinTimer {
    pub plan: Arc<SpinPlan>,
    pub step: SpinStep,
}

/// Observable result of one timer callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinTransition {
    /// A rolling reel moved to a new random position
    ReelTick { reel: usize, position: usize },
    /// A reel reached its final position
    ReelSettled {
        reel: usize,
        position: usize,
        elapsed_ms: u64,
    },
    /// All reels settled and the grace delay passed
    Resolved {
        snapshot: SpinSnapshot,
        elapsed_ms: u64,
    },
}

#[derive(Debug)]
struct ActiveSpin {
    plan: Arc<SpinPlan>,
    started_at_ms: u64,
    tick_timers: [Option<TimerId>; REEL_COUNT],
    final_positions: [Option<usize>; REEL_COUNT],
    settled: usize,
}

/// Timed lifecycle of spins over three reels
#[derive(Debug)]
pub struct SpinMachine {
    timing: TimingConfig,
    scheduler: Scheduler<SpinTimer>,
    phase: SpinPhase,
    positions: [usize; REEL_COUNT],
    reel_states: [ReelState; REEL_COUNT],
    active: Option<ActiveSpin>,
}

impl SpinMachine {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            scheduler: Scheduler::new(),
            phase: SpinPhase::Idle,
            positions: [0; REEL_COUNT],
            reel_states: [ReelState::Settled; REEL_COUNT],
            active: None,
        }
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Takes effect from the next spin
    pub fn set_timing(&mut self, timing: TimingConfig) {
        self.timing = timing;
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_spinning(&self) -> bool {
        self.phase != SpinPhase::Idle
    }

    pub fn positions(&self) -> [usize; REEL_COUNT] {
        self.positions
    }

    pub fn reel_states(&self) -> [ReelState; REEL_COUNT] {
        self.reel_states
    }

    /// Plan of the spin in flight
    pub fn active_plan(&self) -> Option<&Arc<SpinPlan>> {
        self.active.as_ref().map(|a| &a.plan)
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Milliseconds since the spin in flight started
    pub fn elapsed_ms(&self) -> u64 {
        self.active
            .as_ref()
            .map_or(0, |a| self.scheduler.now_ms().saturating_sub(a.started_at_ms))
    }

    /// `Idle → Spinning`: random initial positions, a tick per reel and a
    /// settle deadline per reel
    pub fn begin<R: Rng + ?Sized>(&mut self, plan: SpinPlan, rng: &mut R) -> SlotResult<Arc<SpinPlan>> {
        if self.phase != SpinPhase::Idle {
            return Err(SlotError::AlreadySpinning);
        }

        let plan = Arc::new(plan);
        for (r, reel) in plan.reels.iter().enumerate() {
            self.positions[r] = rng.random_range(0..reel.len());
        }
        self.reel_states = [ReelState::Rolling; REEL_COUNT];

        let mut tick_timers = [None; REEL_COUNT];
        for (r, timer) in tick_timers.iter_mut().enumerate() {
            *timer = Some(self.scheduler.schedule_interval(
                self.timing.tick_interval_ms,
                SpinTimer {
                    plan: Arc::clone(&plan),
                    step: SpinStep::Tick(r),
                },
            ));
        }
        for (r, &stop_ms) in self.timing.reel_stop_ms.iter().enumerate() {
            self.scheduler.schedule_once(
                stop_ms,
                SpinTimer {
                    plan: Arc::clone(&plan),
                    step: SpinStep::Settle(r),
                },
            );
        }

        self.active = Some(ActiveSpin {
            plan: Arc::clone(&plan),
            started_at_ms: self.scheduler.now_ms(),
            tick_timers,
            final_positions: [None; REEL_COUNT],
            settled: 0,
        });
        self.phase = SpinPhase::Spinning;

        log::debug!(
            "spin {} rolling from positions {:?}",
            plan.spin_id,
            self.positions
        );
        Ok(plan)
    }

    /// Run the next timer due at or before `until_ms`. `None` once nothing
    /// is due; call [`SpinMachine::finish_advance`] afterwards.
    pub fn step<R: Rng + ?Sized>(&mut self, until_ms: u64, rng: &mut R) -> Option<SpinTransition> {
        while let Some(fired) = self.scheduler.pop_due(until_ms) {
            let live = self
                .active
                .as_ref()
                .is_some_and(|a| a.plan.spin_id == fired.payload.plan.spin_id);
            if !live {
                log::warn!(
                    "dropping stale {:?} timer of spin {}",
                    fired.payload.step,
                    fired.payload.plan.spin_id
                );
                self.scheduler.cancel(fired.id);
                continue;
            }

            let transition = match fired.payload.step {
                SpinStep::Tick(reel) => self.tick(reel, &fired.payload.plan, rng),
                SpinStep::Settle(reel) => self.settle(reel, &fired.payload.plan, rng),
                SpinStep::Resolve => self.resolve(&fired.payload.plan),
            };
            if transition.is_some() {
                return transition;
            }
        }
        None
    }

    pub fn finish_advance(&mut self, until_ms: u64) {
        self.scheduler.finish(until_ms);
    }

    fn tick<R: Rng + ?Sized>(&mut self, reel: usize, plan: &SpinPlan, rng: &mut R) -> Option<SpinTransition> {
        if self.reel_states.get(reel) != Some(&ReelState::Rolling) {
            return None;
        }
        let position = rng.random_range(0..plan.reels.reels()[reel].len());
        self.positions[reel] = position;
        Some(SpinTransition::ReelTick { reel, position })
    }

    fn settle<R: Rng + ?Sized>(&mut self, reel: usize, plan: &Arc<SpinPlan>, rng: &mut R) -> Option<SpinTransition> {
        let elapsed_ms = self.elapsed_ms();
        let grace_ms = self.timing.resolve_grace_ms;
        let active = self.active.as_mut()?;
        if active.final_positions.get(reel).copied().flatten().is_some() {
            return None;
        }

        if let Some(tick) = active.tick_timers[reel].take() {
            self.scheduler.cancel(tick);
        }
        let position = rng.random_range(0..plan.reels.reels()[reel].len());
        active.final_positions[reel] = Some(position);
        active.settled += 1;
        self.positions[reel] = position;
        self.reel_states[reel] = ReelState::Settled;

        if active.settled == REEL_COUNT {
            self.scheduler.schedule_once(
                grace_ms,
                SpinTimer {
                    plan: Arc::clone(plan),
                    step: SpinStep::Resolve,
                },
            );
        }

        log::debug!("spin {} reel {reel} settled at {position}", plan.spin_id);
        Some(SpinTransition::ReelSettled {
            reel,
            position,
            elapsed_ms,
        })
    }

    fn resolve(&mut self, plan: &Arc<SpinPlan>) -> Option<SpinTransition> {
        let elapsed_ms = self.elapsed_ms();
        let active = self.active.as_ref()?;
        if active.settled != REEL_COUNT {
            return None;
        }

        let mut positions = [0; REEL_COUNT];
        for (slot, final_position) in positions.iter_mut().zip(active.final_positions) {
            *slot = final_position?;
        }

        self.phase = SpinPhase::Resolving;
        Some(SpinTransition::Resolved {
            snapshot: SpinSnapshot {
                spin_id: plan.spin_id,
                reels: Arc::clone(&plan.reels),
                positions,
                bet: plan.bet,
                line_mode: plan.line_mode,
                cost: plan.cost,
            },
            elapsed_ms,
        })
    }

    /// `Resolving → Idle` once the controller has applied the payout
    pub fn complete(&mut self) {
        self.active = None;
        self.phase = SpinPhase::Idle;
    }

    /// Cancel every pending tick, settle and resolve timer and force `Idle`
    /// with positions back at 0. Returns how many timers were dropped.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.scheduler.cancel_all();
        self.active = None;
        self.phase = SpinPhase::Idle;
        self.positions = [0; REEL_COUNT];
        self.reel_states = [ReelState::Settled; REEL_COUNT];
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::ReelGenerator;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn plan(spin_id: u64, rng: &mut StdRng) -> SpinPlan {
        SpinPlan {
            spin_id,
            reels: Arc::new(ReelGenerator::generate_set(rng)),
            bet: 1,
            line_mode: LineMode::Single,
            cost: 1,
        }
    }

    fn run(machine: &mut SpinMachine, until: u64, rng: &mut StdRng) -> Vec<SpinTransition> {
        let mut out = Vec::new();
        while let Some(t) = machine.step(until, rng) {
            if matches!(t, SpinTransition::Resolved { .. }) {
                machine.complete();
            }
            out.push(t);
        }
        machine.finish_advance(until);
        out
    }

    #[test]
    fn test_begin_requires_idle() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut machine = SpinMachine::new(TimingConfig::normal());

        let p = plan(1, &mut rng);
        machine.begin(p, &mut rng).unwrap();
        assert_eq!(machine.phase(), SpinPhase::Spinning);
        assert_eq!(machine.reel_states(), [ReelState::Rolling; 3]);
        // 3 ticks + 3 settles
        assert_eq!(machine.pending_timers(), 6);

        let p = plan(2, &mut rng);
        assert!(matches!(machine.begin(p, &mut rng), Err(SlotError::AlreadySpinning)));
        assert_eq!(machine.pending_timers(), 6);
    }

    #[test]
    fn test_settle_order_and_resolution_time() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut machine = SpinMachine::new(TimingConfig::normal());
        let p = plan(1, &mut rng);
        machine.begin(p, &mut rng).unwrap();

        let transitions = run(&mut machine, 5_000, &mut rng);
        let settles: Vec<(usize, u64)> = transitions
            .iter()
            .filter_map(|t| match t {
                SpinTransition::ReelSettled {
                    reel, elapsed_ms, ..
                } => Some((*reel, *elapsed_ms)),
                _ => None,
            })
            .collect();
        assert_eq!(settles, vec![(0, 900), (1, 1250), (2, 1600)]);

        let resolved: Vec<u64> = transitions
            .iter()
            .filter_map(|t| match t {
                SpinTransition::Resolved { elapsed_ms, .. } => Some(*elapsed_ms),
                _ => None,
            })
            .collect();
        assert_eq!(resolved, vec![1680]);
        assert!(matches!(transitions.last(), Some(SpinTransition::Resolved { .. })));
        assert_eq!(machine.phase(), SpinPhase::Idle);
        assert_eq!(machine.pending_timers(), 0);
    }

    #[test]
    fn test_ticks_stop_after_settle() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut machine = SpinMachine::new(TimingConfig::normal());
        let p = plan(1, &mut rng);
        machine.begin(p, &mut rng).unwrap();

        let transitions = run(&mut machine, 5_000, &mut rng);
        let ticks = |reel: usize| {
            transitions
                .iter()
                .filter(|t| matches!(t, SpinTransition::ReelTick { reel: r, .. } if *r == reel))
                .count()
        };
        // 900 / 70 = 12, 1250 / 70 = 17, 1600 / 70 = 22
        assert_eq!(ticks(0), 12);
        assert_eq!(ticks(1), 17);
        assert_eq!(ticks(2), 22);
    }

    #[test]
    fn test_no_resolution_before_all_settled() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut machine = SpinMachine::new(TimingConfig::normal());
        let p = plan(1, &mut rng);
        machine.begin(p, &mut rng).unwrap();

        let transitions = run(&mut machine, 1_679, &mut rng);
        assert!(
            !transitions
                .iter()
                .any(|t| matches!(t, SpinTransition::Resolved { .. }))
        );
        assert_eq!(machine.reel_states(), [ReelState::Settled; 3]);
        assert!(machine.is_spinning());

        let transitions = run(&mut machine, 1_680, &mut rng);
        assert_eq!(transitions.len(), 1);
    }

    #[test]
    fn test_snapshot_uses_plan_reels_and_final_positions() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut machine = SpinMachine::new(TimingConfig::normal());
        let p = machine
            .begin(SpinPlan { cost: 7, ..plan(9, &mut rng) }, &mut rng)
            .unwrap();

        let transitions = run(&mut machine, 5_000, &mut rng);
        let finals: Vec<usize> = transitions
            .iter()
            .filter_map(|t| match t {
                SpinTransition::ReelSettled { position, .. } => Some(*position),
                _ => None,
            })
            .collect();
        let Some(SpinTransition::Resolved { snapshot, .. }) = transitions.last() else {
            panic!("spin did not resolve");
        };
        assert!(Arc::ptr_eq(&snapshot.reels, &p.reels));
        assert_eq!(snapshot.positions.to_vec(), finals);
        assert_eq!(snapshot.spin_id, 9);
        assert_eq!(snapshot.cost, 7);
        assert_eq!(machine.positions(), snapshot.positions);
    }

    #[test]
    fn test_cancel_kills_every_timer() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut machine = SpinMachine::new(TimingConfig::normal());
        let p = plan(1, &mut rng);
        machine.begin(p, &mut rng).unwrap();
        run(&mut machine, 1_000, &mut rng);

        assert_eq!(machine.cancel(), 4); // 2 ticks + 2 settles left
        assert_eq!(machine.phase(), SpinPhase::Idle);
        assert_eq!(machine.positions(), [0; 3]);
        assert!(run(&mut machine, 10_000, &mut rng).is_empty());
    }
}
