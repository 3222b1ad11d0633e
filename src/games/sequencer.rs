//! Small timing combinators shared by the games.

use crate::Millis;

/// What a [`MessageSequencer`] wants on screen this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence<'a> {
    /// A new message is due; paint it.
    Show(usize, &'a str, &'a str),
    /// The current message is still on screen.
    Hold(usize),
    /// Every message has had its time window.
    Done,
}

/// Time-gated list of two-row messages, each shown for a fixed interval.
#[derive(Debug, Clone)]
pub struct MessageSequencer {
    messages: Vec<(String, String)>,
    interval: Millis,
    started: Millis,
    shown: Option<usize>,
}

impl MessageSequencer {
    /// Start the sequence at `now`.
    pub fn new(messages: &[(&str, &str)], interval: Millis, now: Millis) -> Self {
        Self {
            messages: messages
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            interval,
            started: now,
            shown: None,
        }
    }

    /// Which message is due at `now`; [`Sequence::Show`] is reported once per message.
    pub fn poll(&mut self, now: Millis) -> Sequence<'_> {
        let elapsed = now.saturating_sub(self.started);
        let index = (elapsed / self.interval.max(1)) as usize;
        if index >= self.messages.len() {
            return Sequence::Done;
        }
        if self.shown == Some(index) {
            return Sequence::Hold(index);
        }
        self.shown = Some(index);
        let (line1, line2) = &self.messages[index];
        Sequence::Show(index, line1, line2)
    }
}

/// Start timestamp for a non-blocking wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopwatch {
    started: Millis,
}

impl Stopwatch {
    /// Stopwatch started at `now`.
    pub fn start(now: Millis) -> Self {
        Self { started: now }
    }

    /// Start over from `now`.
    pub fn restart(&mut self, now: Millis) {
        self.started = now;
    }

    /// Time since the last (re)start.
    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.started)
    }

    /// Whether at least `ms` have passed since the last (re)start.
    pub fn has_elapsed(&self, now: Millis, ms: Millis) -> bool {
        self.elapsed(now) >= ms
    }
}

/// Outcome of one [`DwellConfirm::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dwell {
    /// Nothing armed.
    Idle,
    /// Armed and still inside the dwell window.
    Holding,
    /// Condition held for the whole dwell.
    Confirmed,
    /// Condition broke before the dwell elapsed.
    Aborted,
}

/// Confirm-with-dwell: an armed confirmation only completes if the hold condition stays
/// true for `dwell` ms without interruption.
#[derive(Debug, Clone)]
pub struct DwellConfirm {
    dwell: Millis,
    armed_at: Option<Millis>,
}

impl DwellConfirm {
    /// Confirmation requiring `dwell` ms.
    pub fn new(dwell: Millis) -> Self {
        Self {
            dwell,
            armed_at: None,
        }
    }

    /// Feed one tick. `arm` starts a confirmation when idle; `hold` must stay true while
    /// armed.
    pub fn poll(&mut self, now: Millis, arm: bool, hold: bool) -> Dwell {
        match self.armed_at {
            None if arm => {
                self.armed_at = Some(now);
                Dwell::Holding
            }
            None => Dwell::Idle,
            Some(_) if !hold => {
                self.armed_at = None;
                Dwell::Aborted
            }
            Some(start) if now.saturating_sub(start) >= self.dwell => {
                self.armed_at = None;
                Dwell::Confirmed
            }
            Some(_) => Dwell::Holding,
        }
    }

    /// Whether a confirmation is in progress.
    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Drop any confirmation in progress.
    pub fn reset(&mut self) {
        self.armed_at = None;
    }
}

/// Rate limiter: ready at most once per interval.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Millis,
    last: Option<Millis>,
}

impl Throttle {
    /// Limiter firing at most every `interval` ms; the first call is always ready.
    pub fn new(interval: Millis) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true (and starts a new interval) when the previous interval has passed.
    pub fn ready(&mut self, now: Millis) -> bool {
        let due = self
            .last
            .is_none_or(|last| now.saturating_sub(last) >= self.interval);
        if due {
            self.last = Some(now);
        }
        due
    }

    /// Make the next call ready regardless of timing.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
