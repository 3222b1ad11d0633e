//! Session state: the countdown, press counters, per-tick context and the console itself.

pub mod orchestrator;
pub mod state_machine;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Millis,
    hal::{Hardware, Peripherals},
};

pub use self::orchestrator::{Console, SessionSnapshot};
pub use self::state_machine::{AppEvent, AppPhase, InvalidTransition, PhaseMachine};

/// Session-wide countdown.
///
/// Elapsed time is measured from `start` and grows by every penalty applied, so a penalty
/// brings the deadline closer without touching the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalClock {
    start: Millis,
    total: Millis,
    penalty: Millis,
}

impl GlobalClock {
    /// Countdown of `total` ms starting at `start`.
    pub fn new(start: Millis, total: Millis) -> Self {
        Self {
            start,
            total,
            penalty: 0,
        }
    }

    /// Authoritative elapsed session time at `now`, penalties included.
    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.start).saturating_add(self.penalty)
    }

    /// Time left before the deadline.
    pub fn remaining(&self, now: Millis) -> Millis {
        self.total.saturating_sub(self.elapsed(now))
    }

    /// Whether the deadline has been reached.
    pub fn expired(&self, now: Millis) -> bool {
        self.elapsed(now) >= self.total
    }

    /// Session length.
    pub fn total(&self) -> Millis {
        self.total
    }

    /// Sum of penalties applied so far.
    pub fn penalty(&self) -> Millis {
        self.penalty
    }

    /// Rewind the clock by `ms`, bounded by the session length.
    fn penalize(&mut self, ms: Millis) {
        self.penalty = self.penalty.saturating_add(ms.min(self.total));
    }
}

/// Debounced press counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressCounters {
    total: u32,
    current_game: u32,
}

impl PressCounters {
    /// Presses during any game this session.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Presses since the current game (or loading screen) started.
    pub fn current_game(&self) -> u32 {
        self.current_game
    }

    fn record(&mut self) {
        self.total += 1;
        self.current_game += 1;
    }

    fn reset_current(&mut self) {
        self.current_game = 0;
    }
}

/// Everything a game may read or drive during a tick.
///
/// Owned by the [`Console`]; games receive it by `&mut` for the duration of their poll.
pub struct SessionContext {
    now: Millis,
    clock: GlobalClock,
    presses: PressCounters,
    button_edge: bool,
    /// Console peripherals.
    pub io: Peripherals,
    /// Randomness for targets and combinations.
    pub rng: StdRng,
}

impl SessionContext {
    /// Fresh session starting at `now`.
    pub fn new(
        hardware: Box<dyn Hardware>,
        debounce_ms: Millis,
        total_time_ms: Millis,
        rng: StdRng,
        now: Millis,
    ) -> Self {
        let mut io = Peripherals::new(hardware, debounce_ms);
        io.set_now(now);
        Self {
            now,
            clock: GlobalClock::new(now, total_time_ms),
            presses: PressCounters::default(),
            button_edge: false,
            io,
            rng,
        }
    }

    /// Context with a fixed seed, for deterministic runs.
    pub fn seeded(
        hardware: Box<dyn Hardware>,
        debounce_ms: Millis,
        total_time_ms: Millis,
        seed: u64,
        now: Millis,
    ) -> Self {
        Self::new(
            hardware,
            debounce_ms,
            total_time_ms,
            StdRng::seed_from_u64(seed),
            now,
        )
    }

    /// Advance to the tick at `now` and sample the button once.
    ///
    /// Returns whether a press edge happened; the same edge is visible to the active game
    /// through [`SessionContext::button_pressed`] for the rest of the tick.
    pub fn begin_tick(&mut self, now: Millis) -> bool {
        self.now = now;
        self.io.set_now(now);
        self.button_edge = self.io.poll_button();
        self.button_edge
    }

    /// Timestamp of the tick in progress.
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Whether the push-button was pressed this tick.
    pub fn button_pressed(&self) -> bool {
        self.button_edge
    }

    /// Read access to the session countdown.
    pub fn clock(&self) -> &GlobalClock {
        &self.clock
    }

    /// Whether the session deadline has been reached.
    pub fn time_expired(&self) -> bool {
        self.clock.expired(self.now)
    }

    /// Bring the session deadline closer by `ms`.
    pub fn penalize(&mut self, ms: Millis) {
        self.clock.penalize(ms);
    }

    /// Press counters.
    pub fn presses(&self) -> PressCounters {
        self.presses
    }

    pub(crate) fn record_press(&mut self) {
        self.presses.record();
    }

    pub(crate) fn reset_game_presses(&mut self) {
        self.presses.reset_current();
    }

    /// Start a new session clock at the current tick and zero every counter.
    pub(crate) fn restart(&mut self) {
        self.clock = GlobalClock::new(self.now, self.clock.total);
        self.presses = PressCounters::default();
    }
}
