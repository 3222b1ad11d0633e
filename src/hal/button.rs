//! Debounced push-button.

use crate::Millis;

/// Default debounce window for the push-button.
pub const DEFAULT_DEBOUNCE_MS: Millis = 50;

/// Software-debounced push-button.
///
/// The raw level must stay unchanged for longer than the debounce window before it is
/// accepted as the new stable level. A released→pressed change of the stable level is a
/// press edge, reported by [`Button::is_pressed`] until the next [`Button::update`].
#[derive(Debug, Clone)]
pub struct Button {
    debounce_ms: Millis,
    stable: bool,
    last_raw: bool,
    last_change: Millis,
    edge: bool,
}

impl Button {
    /// Create a released button with the given debounce window.
    pub fn new(debounce_ms: Millis) -> Self {
        Self {
            debounce_ms,
            stable: false,
            last_raw: false,
            last_change: 0,
            edge: false,
        }
    }

    /// Sample the raw level at `now`.
    pub fn update(&mut self, raw_pressed: bool, now: Millis) {
        self.edge = false;

        if raw_pressed != self.last_raw {
            self.last_change = now;
            self.last_raw = raw_pressed;
        }

        if now.saturating_sub(self.last_change) > self.debounce_ms && raw_pressed != self.stable {
            self.edge = raw_pressed;
            self.stable = raw_pressed;
        }
    }

    /// True exactly once per debounced press.
    pub fn is_pressed(&self) -> bool {
        self.edge
    }
}

impl Default for Button {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}
