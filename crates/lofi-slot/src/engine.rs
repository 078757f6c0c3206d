//! Game controller
//!
//! [`SlotMachine`] owns the wallet, the reels in play, the spin state machine
//! and the RNG. Hosts call commands (`spin`, `set_bet`, `reset`, ...), drive
//! time with [`SlotMachine::advance`], read [`GameState`] snapshots and
//! subscribe to [`StageEvent`]s.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use lofi_stage::{
    RejectReason, Stage, StageEvent, StagePayload, StageTrace, USER_INITIATED_TAG,
};

use crate::config::SlotConfig;
use crate::error::{SlotError, SlotResult};
use crate::paytable::{EvaluationResult, Payline, Win};
use crate::spin::{ReelState, SpinMachine, SpinPhase, SpinPlan, SpinTransition};
use crate::symbols::{REEL_COUNT, ReelGenerator, ReelSet, Symbol};
use crate::timing::TimingConfig;
use crate::wallet::Wallet;

/// Idle message after start and reset
pub const DEFAULT_MESSAGE: &str = "Press SPIN to play.";

pub const NO_CREDITS_MESSAGE: &str = "Not enough credits for that spin.";

pub const NO_WIN_MESSAGE: &str = "No win — try again!";

/// Stage event subscriber
pub type StageListener = Box<dyn FnMut(&StageEvent)>;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub total_wagered: u64,
    pub total_won: u64,
    pub winning_spins: u64,
    pub losing_spins: u64,
    /// Winning paylines across all spins
    pub lines_won: u64,
    pub best_win: u64,
}

impl SessionStats {
    /// Calculate RTP
    pub fn rtp(&self) -> f64 {
        if self.total_wagered > 0 {
            (self.total_won as f64 / self.total_wagered as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.winning_spins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    fn record(&mut self, wagered: u64, result: &EvaluationResult) {
        self.total_spins += 1;
        self.total_wagered = self.total_wagered.saturating_add(wagered);
        self.total_won = self.total_won.saturating_add(result.total_win);
        if result.is_win() {
            self.winning_spins += 1;
            self.lines_won += result.wins.len() as u64;
            self.best_win = self.best_win.max(result.total_win);
        } else {
            self.losing_spins += 1;
        }
    }
}

/// Everything a UI needs to render one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub credits: u64,
    pub bet: u64,
    pub spin_cost: u64,
    /// Current bet ceiling (never below 1)
    pub bet_cap: u64,
    pub extra_lines: bool,
    pub positions: [usize; REEL_COUNT],
    pub reel_states: [ReelState; REEL_COUNT],
    pub spinning: bool,
    pub phase: SpinPhase,
    pub wins: Vec<Win>,
    pub message: String,
    pub can_spin: bool,
    /// Lines to highlight, from the last resolved spin
    pub highlighted_lines: Vec<Payline>,
    /// "Reset bet" control applies
    pub can_reset_bet: bool,
    /// "Max bet" control applies
    pub can_max_bet: bool,
}

/// Player-facing summary of a resolved spin
pub fn result_message(result: &EvaluationResult) -> String {
    if !result.is_win() {
        return NO_WIN_MESSAGE.to_string();
    }
    let details = result
        .wins
        .iter()
        .map(|w| {
            format!(
                "{}: {} x{} (+{})",
                w.line.label(),
                w.symbol.glyph(),
                w.match_count,
                w.payout
            )
        })
        .collect::<Vec<_>>()
        .join(" • ");
    format!(
        "Win on {} line(s)! +{} — {}",
        result.wins.len(),
        result.total_win,
        details
    )
}

/// Three-reel slot machine
pub struct SlotMachine {
    config: SlotConfig,
    wallet: Wallet,
    /// Reels on display. Replaced at spin start and on reset.
    reels: Arc<ReelSet>,
    rng: StdRng,
    spin: SpinMachine,
    message: String,
    wins: Vec<Win>,
    stats: SessionStats,
    /// Monotonic across resets
    spin_count: u64,
    listeners: Vec<StageListener>,
    trace: Option<StageTrace>,
    last_trace: Option<StageTrace>,
}

impl SlotMachine {
    /// Reference game with an entropy-seeded RNG
    pub fn new() -> Self {
        Self::build(SlotConfig::default())
    }

    pub fn with_config(config: SlotConfig) -> SlotResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SlotConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let reels = Arc::new(ReelGenerator::generate_set(&mut rng));
        Self {
            wallet: Wallet::new(config.starting_credits, config.max_bet),
            reels,
            rng,
            spin: SpinMachine::new(config.timing.clone()),
            message: DEFAULT_MESSAGE.to_string(),
            wins: Vec::new(),
            stats: SessionStats::default(),
            spin_count: 0,
            listeners: Vec::new(),
            trace: None,
            last_trace: None,
            config,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn credits(&self) -> u64 {
        self.wallet.credits()
    }

    pub fn bet(&self) -> u64 {
        self.wallet.bet()
    }

    pub fn spin_cost(&self) -> u64 {
        self.wallet.spin_cost()
    }

    pub fn extra_lines(&self) -> bool {
        self.wallet.extra_lines()
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_spinning()
    }

    pub fn phase(&self) -> SpinPhase {
        self.spin.phase()
    }

    pub fn can_spin(&self) -> bool {
        !self.is_spinning() && self.wallet.can_afford_spin()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Wins of the last resolved spin
    pub fn wins(&self) -> &[Win] {
        &self.wins
    }

    pub fn positions(&self) -> [usize; REEL_COUNT] {
        self.spin.positions()
    }

    pub fn reels(&self) -> &Arc<ReelSet> {
        &self.reels
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Stage trace of the last resolved spin
    pub fn last_trace(&self) -> Option<&StageTrace> {
        self.last_trace.as_ref()
    }

    /// Virtual clock in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.spin.now_ms()
    }

    /// Symbol `offset` rows from the center of `reel`
    pub fn reel_symbol_at(&self, reel: usize, offset: i64) -> Option<Symbol> {
        let position = *self.spin.positions().get(reel)?;
        self.reels.reel(reel).map(|r| r.symbol_at(position, offset))
    }

    /// Visible cells of `reel` (top, mid, bottom)
    pub fn reel_window(&self, reel: usize) -> Option<[Symbol; 3]> {
        let position = *self.spin.positions().get(reel)?;
        self.reels.reel(reel).map(|r| r.window(position))
    }

    pub fn state(&self) -> GameState {
        let bet_cap = self.wallet.effective_cap();
        GameState {
            credits: self.wallet.credits(),
            bet: self.wallet.bet(),
            spin_cost: self.wallet.spin_cost(),
            bet_cap,
            extra_lines: self.wallet.extra_lines(),
            positions: self.spin.positions(),
            reel_states: self.spin.reel_states(),
            spinning: self.is_spinning(),
            phase: self.spin.phase(),
            wins: self.wins.clone(),
            message: self.message.clone(),
            can_spin: self.can_spin(),
            highlighted_lines: self.wins.iter().map(|w| w.line).collect(),
            can_reset_bet: self.wallet.bet() != 1,
            can_max_bet: self.wallet.bet_cap() >= 1 && self.wallet.bet() != bet_cap,
        }
    }

    /// Subscribe to every stage event
    pub fn on_stage(&mut self, listener: impl FnMut(&StageEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ─── Commands ───────────────────────────────────────────────────────────

    /// Start a spin. Returns the spin id.
    ///
    /// While a spin is in flight this is a silent no-op returning
    /// [`SlotError::AlreadySpinning`]. When the spin cost is not covered the
    /// status message says so and nothing else changes.
    pub fn spin(&mut self) -> SlotResult<u64> {
        if self.spin.is_spinning() {
            log::debug!("spin ignored, spin {} still in flight", self.spin_count);
            return Err(SlotError::AlreadySpinning);
        }

        self.wins.clear();
        self.message.clear();

        let cost = self.wallet.spin_cost();
        if let Err(err) = self.wallet.charge(cost) {
            log::debug!("spin rejected: {err}");
            self.message = NO_CREDITS_MESSAGE.to_string();
            let payload = StagePayload::new()
                .spin_cost(cost)
                .balance(self.wallet.credits())
                .message(NO_CREDITS_MESSAGE);
            self.emit_command(
                Stage::SpinRejected {
                    reason: RejectReason::InsufficientCredits,
                },
                payload,
            );
            return Err(err);
        }

        self.spin_count += 1;
        let spin_id = self.spin_count;
        let reels = Arc::new(ReelGenerator::generate_set(&mut self.rng));
        self.reels = Arc::clone(&reels);

        let plan = SpinPlan {
            spin_id,
            reels,
            bet: self.wallet.bet(),
            line_mode: self.wallet.line_mode(),
            cost,
        };
        let plan = self.spin.begin(plan, &mut self.rng)?;

        log::info!(
            "spin {spin_id}: bet {} x {} line(s), cost {cost}, credits left {}",
            plan.bet,
            plan.line_mode.line_count(),
            self.wallet.credits()
        );

        self.trace = Some(
            StageTrace::new(Some(spin_id))
                .with_metadata("bet", serde_json::json!(plan.bet))
                .with_metadata("line_mode", serde_json::json!(plan.line_mode))
                .with_metadata("spin_cost", serde_json::json!(cost)),
        );
        let payload = StagePayload::new()
            .spin_id(spin_id)
            .bet_amount(plan.bet)
            .spin_cost(cost)
            .balance(self.wallet.credits());
        self.emit_command(Stage::SpinStart, payload);
        for reel_index in 0..REEL_COUNT as u8 {
            self.emit_command(
                Stage::ReelSpinning { reel_index },
                StagePayload::new().spin_id(spin_id),
            );
        }
        Ok(spin_id)
    }

    /// Back to the default idle state: timers cancelled, default credits,
    /// bet and line mode, fresh reels, positions at 0, stats cleared
    pub fn reset(&mut self) {
        let dropped = self.spin.cancel();
        self.wallet = Wallet::new(self.config.starting_credits, self.config.max_bet);
        self.reels = Arc::new(ReelGenerator::generate_set(&mut self.rng));
        self.wins.clear();
        self.message = DEFAULT_MESSAGE.to_string();
        self.stats = SessionStats::default();
        self.trace = None;
        self.last_trace = None;

        log::info!("game reset, {dropped} pending timer(s) cancelled");
        let payload = StagePayload::new()
            .balance(self.wallet.credits())
            .message(DEFAULT_MESSAGE);
        self.emit_command(Stage::GameReset, payload);
    }

    /// Set the bet (clamped to the current cap). Returns the applied bet.
    pub fn set_bet(&mut self, bet: u64) -> SlotResult<u64> {
        self.ensure_idle()?;
        Ok(self.wallet.set_bet(bet))
    }

    pub fn increase_bet(&mut self) -> SlotResult<u64> {
        self.ensure_idle()?;
        Ok(self.wallet.increase_bet())
    }

    pub fn decrease_bet(&mut self) -> SlotResult<u64> {
        self.ensure_idle()?;
        Ok(self.wallet.decrease_bet())
    }

    pub fn max_bet(&mut self) -> SlotResult<u64> {
        self.ensure_idle()?;
        Ok(self.wallet.max_bet())
    }

    pub fn reset_bet(&mut self) -> SlotResult<u64> {
        self.ensure_idle()?;
        Ok(self.wallet.reset_bet())
    }

    /// Toggle top and bottom paylines. The bet is re-clamped immediately.
    pub fn set_extra_lines(&mut self, extra_lines: bool) -> SlotResult<()> {
        self.ensure_idle()?;
        self.wallet.set_extra_lines(extra_lines);
        Ok(())
    }

    /// Change spin timing, effective from the next spin
    pub fn set_timing(&mut self, timing: TimingConfig) -> SlotResult<()> {
        timing.validate()?;
        self.spin.set_timing(timing.clone());
        self.config.timing = timing;
        Ok(())
    }

    fn ensure_idle(&self) -> SlotResult<()> {
        if self.spin.is_spinning() {
            return Err(SlotError::AlreadySpinning);
        }
        Ok(())
    }

    // ─── Time ───────────────────────────────────────────────────────────────

    /// Advance the clock, running every timer that comes due in order.
    /// Returns the number of transitions applied.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.advance_ms(ms)
    }

    pub fn advance_ms(&mut self, ms: u64) -> usize {
        let until = self.spin.now_ms().saturating_add(ms);
        let mut applied = 0;
        while let Some(transition) = self.spin.step(until, &mut self.rng) {
            self.apply(transition);
            applied += 1;
        }
        self.spin.finish_advance(until);
        applied
    }

    /// Advance until the spin in flight has resolved
    pub fn run_to_idle(&mut self) -> usize {
        let mut applied = 0;
        while self.spin.is_spinning() {
            let Some(deadline) = self.spin.next_deadline() else {
                break;
            };
            applied += self.advance_ms(deadline.saturating_sub(self.spin.now_ms()));
        }
        applied
    }

    fn apply(&mut self, transition: SpinTransition) {
        match transition {
            SpinTransition::ReelTick { reel, position } => {
                log::trace!("reel {reel} rolling at {position}");
            }
            SpinTransition::ReelSettled {
                reel,
                position,
                elapsed_ms,
            } => {
                let Some(plan) = self.spin.active_plan().cloned() else {
                    return;
                };
                let symbols = plan
                    .reels
                    .reel(reel)
                    .map(|r| r.window(position).iter().map(|s| s.id()).collect())
                    .unwrap_or_default();
                self.emit(
                    Stage::ReelStop {
                        reel_index: reel as u8,
                        symbols,
                    },
                    elapsed_ms,
                    StagePayload::new().spin_id(plan.spin_id),
                );
            }
            SpinTransition::Resolved {
                snapshot,
                elapsed_ms,
            } => {
                let spin_id = snapshot.spin_id;
                self.emit(
                    Stage::EvaluateWins,
                    elapsed_ms,
                    StagePayload::new().spin_id(spin_id),
                );

                let result = self.config.paytable.evaluate(&snapshot);
                self.wallet.credit(result.total_win);
                self.stats.record(snapshot.cost, &result);
                self.message = result_message(&result);
                self.wins = result.wins.clone();
                self.spin.complete();

                log::info!(
                    "spin {spin_id} resolved at {:?}: won {} on {} line(s), credits {}",
                    snapshot.positions,
                    result.total_win,
                    result.wins.len(),
                    self.wallet.credits()
                );

                for win in &result.wins {
                    self.emit(
                        Stage::WinLineShow {
                            line: win.line.name().to_string(),
                            line_amount: win.payout,
                        },
                        elapsed_ms,
                        StagePayload::with_win(win.payout, snapshot.bet)
                            .spin_id(spin_id)
                            .win_lines(vec![win.to_win_line()]),
                    );
                }

                let outcome = if result.is_win() {
                    Stage::WinPresent {
                        win_amount: result.total_win,
                        line_count: result.wins.len() as u8,
                    }
                } else {
                    Stage::NoWin
                };
                let payload = StagePayload::with_win(result.total_win, snapshot.bet)
                    .spin_id(spin_id)
                    .spin_cost(snapshot.cost)
                    .win_lines(result.wins.iter().map(Win::to_win_line).collect())
                    .balance(self.wallet.credits())
                    .message(self.message.clone());
                self.emit(outcome, elapsed_ms, payload);
                self.emit(
                    Stage::SpinEnd,
                    elapsed_ms,
                    StagePayload::new()
                        .spin_id(spin_id)
                        .balance(self.wallet.credits()),
                );

                self.last_trace = self.trace.take();
            }
        }
    }

    /// Emit at timestamp 0 with the user-initiated tag
    fn emit_command(&mut self, stage: Stage, payload: StagePayload) {
        let event = StageEvent::with_payload(stage, 0, payload).with_tag(USER_INITIATED_TAG);
        self.dispatch(event);
    }

    fn emit(&mut self, stage: Stage, timestamp_ms: u64, payload: StagePayload) {
        self.dispatch(StageEvent::with_payload(stage, timestamp_ms, payload));
    }

    fn dispatch(&mut self, event: StageEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        if let Some(trace) = self.trace.as_mut().filter(|_| event.stage.is_spin_lifecycle()) {
            trace.push(event);
        }
    }
}

impl Default for SlotMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn machine(seed: u64) -> SlotMachine {
        SlotMachine::with_config(SlotConfig::default().with_seed(seed)).unwrap()
    }

    fn recorder(machine: &mut SlotMachine) -> Rc<RefCell<Vec<StageEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        machine.on_stage(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn test_initial_state() {
        let machine = machine(1);
        let state = machine.state();
        assert_eq!(state.credits, 100);
        assert_eq!(state.bet, 1);
        assert_eq!(state.spin_cost, 1);
        assert_eq!(state.bet_cap, 10);
        assert!(!state.extra_lines);
        assert_eq!(state.positions, [0, 0, 0]);
        assert!(!state.spinning);
        assert!(state.can_spin);
        assert!(state.can_max_bet);
        assert!(!state.can_reset_bet);
        assert_eq!(state.message, DEFAULT_MESSAGE);
        assert!(machine.reels().iter().all(|r| r.is_permutation()));
    }

    #[test]
    fn test_spin_deducts_and_resolves() {
        let mut machine = machine(2);
        machine.set_bet(3).unwrap();
        let id = machine.spin().unwrap();
        assert_eq!(id, 1);
        assert_eq!(machine.credits(), 97);
        assert!(machine.is_spinning());
        assert_eq!(machine.message(), "");

        machine.advance_ms(1_679);
        assert!(machine.is_spinning());
        machine.advance_ms(1);
        assert!(!machine.is_spinning());

        let won: u64 = machine.wins().iter().map(|w| w.payout).sum();
        assert_eq!(machine.credits(), 97 + won);
        assert_eq!(machine.stats().total_spins, 1);
        assert_eq!(machine.stats().total_wagered, 3);
        assert_ne!(machine.message(), "");
    }

    #[test]
    fn test_double_spin_charges_once() {
        let mut machine = machine(3);
        let events = recorder(&mut machine);

        machine.spin().unwrap();
        machine.advance_ms(500);
        assert!(matches!(machine.spin(), Err(SlotError::AlreadySpinning)));
        assert_eq!(machine.credits(), 99);
        assert_eq!(machine.message(), "");

        machine.run_to_idle();
        let events = events.borrow();
        let count = |name: &str| events.iter().filter(|e| e.type_name() == name).count();
        assert_eq!(count("spin_start"), 1);
        assert_eq!(count("evaluate_wins"), 1);
        assert_eq!(count("spin_end"), 1);
        assert_eq!(machine.stats().total_spins, 1);
    }

    #[test]
    fn test_insufficient_credits() {
        let config = SlotConfig {
            starting_credits: 2,
            ..SlotConfig::default()
        }
        .with_seed(4);
        let mut machine = SlotMachine::with_config(config).unwrap();
        let events = recorder(&mut machine);
        machine.set_extra_lines(true).unwrap();
        let reels = Arc::clone(machine.reels());

        let err = machine.spin().unwrap_err();
        assert!(matches!(
            err,
            SlotError::InsufficientCredits {
                needed: 3,
                available: 2
            }
        ));
        assert_eq!(machine.message(), NO_CREDITS_MESSAGE);
        assert_eq!(machine.credits(), 2);
        assert!(!machine.is_spinning());
        assert!(Arc::ptr_eq(machine.reels(), &reels));
        assert!(!machine.state().can_spin);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].stage,
            Stage::SpinRejected {
                reason: RejectReason::InsufficientCredits
            }
        );
    }

    #[test]
    fn test_controls_locked_while_spinning() {
        let mut machine = machine(5);
        machine.set_bet(4).unwrap();
        machine.spin().unwrap();

        assert!(matches!(machine.set_bet(2), Err(SlotError::AlreadySpinning)));
        assert!(machine.set_extra_lines(true).is_err());
        assert!(machine.increase_bet().is_err());
        assert!(machine.max_bet().is_err());
        assert_eq!(machine.bet(), 4);
        assert!(!machine.extra_lines());

        machine.run_to_idle();
        assert_eq!(machine.set_bet(2).unwrap(), 2);
    }

    #[test]
    fn test_reset_mid_spin() {
        let mut machine = machine(6);
        let events = recorder(&mut machine);
        machine.set_bet(5).unwrap();
        machine.set_extra_lines(true).unwrap();
        machine.spin().unwrap();
        machine.advance_ms(1_300);

        let in_play = Arc::clone(machine.reels());
        machine.reset();
        assert!(!Arc::ptr_eq(&in_play, machine.reels()));
        assert!(machine.reels().iter().all(|r| r.is_permutation()));
        let fresh = SlotMachine::with_config(SlotConfig::default().with_seed(0)).unwrap();
        assert_eq!(machine.state(), fresh.state());
        assert_eq!(machine.stats(), &SessionStats::default());

        let before = events.borrow().len();
        machine.advance_ms(10_000);
        assert_eq!(events.borrow().len(), before);
        assert_eq!(
            events.borrow().last().map(|e| e.stage.clone()),
            Some(Stage::GameReset)
        );
    }

    #[test]
    fn test_reset_when_idle_replaces_reels() {
        let mut machine = machine(16);
        let initial = Arc::clone(machine.reels());
        machine.reset();
        assert!(!Arc::ptr_eq(&initial, machine.reels()));
        assert!(machine.reels().iter().all(|r| r.is_permutation()));
        assert_eq!(machine.phase(), SpinPhase::Idle);

        machine.spin().unwrap();
        machine.run_to_idle();
        let settled = Arc::clone(machine.reels());
        machine.reset();
        assert!(!Arc::ptr_eq(&settled, machine.reels()));
        assert!(machine.reels().iter().all(|r| r.is_permutation()));
    }

    #[test]
    fn test_command_events_are_tagged() {
        let config = SlotConfig {
            starting_credits: 2,
            ..SlotConfig::default()
        }
        .with_seed(17);
        let mut machine = SlotMachine::with_config(config).unwrap();
        let events = recorder(&mut machine);
        machine.set_extra_lines(true).unwrap();
        assert!(machine.spin().is_err());
        machine.reset();
        machine.spin().unwrap();
        machine.run_to_idle();

        let events = events.borrow();
        for event in events.iter() {
            let by_command = matches!(
                event.stage,
                Stage::SpinStart
                    | Stage::ReelSpinning { .. }
                    | Stage::SpinRejected { .. }
                    | Stage::GameReset
            );
            assert_eq!(
                event.has_tag(USER_INITIATED_TAG),
                by_command,
                "{}",
                event.type_name()
            );
        }
        assert!(events.iter().any(|e| matches!(e.stage, Stage::SpinRejected { .. })));
        assert!(events.iter().any(|e| matches!(e.stage, Stage::ReelStop { .. })));
        assert!(events.iter().all(|e| e.tags.len() <= 1));
    }

    #[test]
    fn test_trace_of_last_spin() {
        let mut machine = machine(7);
        machine.spin().unwrap();
        assert!(machine.last_trace().is_none());
        machine.run_to_idle();

        let trace = machine.last_trace().unwrap();
        assert_eq!(trace.spin_id, Some(1));
        assert!(trace.validate().is_valid(), "{:?}", trace.validate().warnings());
        assert_eq!(trace.stop_order(), vec![0, 1, 2]);
        assert_eq!(trace.duration_ms(), 1680);
        assert_eq!(trace.metadata.get("line_mode"), Some(&serde_json::json!("single")));
        assert_eq!(trace.total_win(), machine.wins().iter().map(|w| w.payout).sum::<u64>());
    }

    #[test]
    fn test_reel_stop_symbols_match_window() {
        let mut machine = machine(8);
        let events = recorder(&mut machine);
        machine.spin().unwrap();
        machine.run_to_idle();

        for event in events.borrow().iter() {
            if let Stage::ReelStop {
                reel_index,
                symbols,
            } = &event.stage
            {
                let window = machine.reel_window(*reel_index as usize).unwrap();
                let ids: Vec<u32> = window.iter().map(|s| s.id()).collect();
                assert_eq!(symbols, &ids);
            }
        }
        assert_eq!(
            machine.reel_symbol_at(1, 0),
            machine.reel_window(1).map(|w| w[1])
        );
        assert_eq!(machine.reel_symbol_at(3, 0), None);
    }

    #[test]
    fn test_result_message() {
        let cherry = Symbol::from_id(0).unwrap();
        let bell = Symbol::from_id(2).unwrap();

        assert_eq!(result_message(&EvaluationResult::default()), NO_WIN_MESSAGE);

        let result = EvaluationResult {
            wins: vec![
                Win {
                    line: Payline::Top,
                    symbol: cherry,
                    match_count: 3,
                    payout: 10,
                },
                Win {
                    line: Payline::Mid,
                    symbol: bell,
                    match_count: 2,
                    payout: 4,
                },
            ],
            total_win: 14,
        };
        assert_eq!(
            result_message(&result),
            "Win on 2 line(s)! +14 — Top: 🍒 x3 (+10) • Center: 🔔 x2 (+4)"
        );
    }

    #[test]
    fn test_session_stats() {
        let mut stats = SessionStats::default();
        assert_eq!(stats.rtp(), 0.0);
        stats.record(10, &EvaluationResult::default());
        stats.record(
            10,
            &EvaluationResult {
                wins: vec![Win {
                    line: Payline::Mid,
                    symbol: Symbol::from_id(1).unwrap(),
                    match_count: 3,
                    payout: 50,
                }],
                total_win: 50,
            },
        );
        assert_eq!(stats.total_spins, 2);
        assert_eq!(stats.winning_spins, 1);
        assert_eq!(stats.losing_spins, 1);
        assert_eq!(stats.best_win, 50);
        assert!((stats.rtp() - 250.0).abs() < f64::EPSILON);
        assert!((stats.hit_rate() - 50.0).abs() < f64::EPSILON);

        let jackpot = EvaluationResult {
            wins: Vec::new(),
            total_win: u64::MAX,
        };
        stats.record(u64::MAX, &jackpot);
        assert_eq!(stats.total_wagered, u64::MAX);
        assert_eq!(stats.total_won, u64::MAX);
        assert_eq!(stats.total_spins, 3);
    }
}
