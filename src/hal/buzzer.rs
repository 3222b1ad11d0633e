//! Non-blocking buzzer and its canned melodies.

use std::collections::VecDeque;

use super::Hardware;
use crate::Millis;

/// A single note of a canned melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Pitch in hertz.
    pub freq_hz: u16,
    /// How long the note sounds.
    pub duration_ms: u32,
    /// Silence after the note before the next one starts.
    pub gap_ms: u32,
}

const fn note(freq_hz: u16, duration_ms: u32, gap_ms: u32) -> Note {
    Note {
        freq_hz,
        duration_ms,
        gap_ms,
    }
}

const SUCCESS: [Note; 8] = [
    note(261, 200, 200),
    note(293, 100, 150),
    note(329, 100, 150),
    note(349, 100, 150),
    note(392, 100, 150),
    note(440, 100, 150),
    note(493, 100, 150),
    note(523, 200, 200),
];

const ERROR: [Note; 1] = [note(300, 200, 0)];

const GAME_OVER: [Note; 8] = [
    note(523, 100, 50),
    note(493, 100, 50),
    note(440, 100, 50),
    note(392, 100, 50),
    note(349, 100, 50),
    note(329, 100, 50),
    note(293, 100, 50),
    note(261, 100, 50),
];

/// Canned sound sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Melody {
    /// Rising C-major scale.
    Success,
    /// Single low buzz.
    Error,
    /// Falling C-major scale.
    GameOver,
}

impl Melody {
    /// Notes of the melody in playback order.
    pub fn notes(self) -> &'static [Note] {
        match self {
            Melody::Success => &SUCCESS,
            Melody::Error => &ERROR,
            Melody::GameOver => &GAME_OVER,
        }
    }
}

/// Non-blocking tone player.
///
/// A new tone or melody always replaces whatever was playing. Melodies are stepped from
/// [`Buzzer::poll`], which the orchestrator calls once per tick.
#[derive(Debug, Default)]
pub struct Buzzer {
    queue: VecDeque<Note>,
    next_at: Millis,
    current: Option<u16>,
    busy_until: Millis,
}

impl Buzzer {
    /// Idle buzzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a single tone right away.
    ///
    /// Re-requesting the tone that is already sounding is a no-op, so feedback tones can be
    /// requested every tick without retriggering the driver.
    pub fn play_tone(
        &mut self,
        hw: &mut dyn Hardware,
        freq_hz: u16,
        duration_ms: u32,
        now: Millis,
    ) {
        self.queue.clear();
        if self.current == Some(freq_hz) && now < self.busy_until {
            return;
        }
        self.start(hw, freq_hz, duration_ms, now);
        self.next_at = self.busy_until;
    }

    /// Replace anything playing with `melody`; the first note starts immediately.
    pub fn play_melody(&mut self, hw: &mut dyn Hardware, melody: Melody, now: Millis) {
        self.queue = melody.notes().iter().copied().collect();
        self.next_at = now;
        self.current = None;
        self.poll(hw, now);
    }

    /// Start the next queued note once the previous one (and its gap) has run out.
    pub fn poll(&mut self, hw: &mut dyn Hardware, now: Millis) {
        if now < self.next_at {
            return;
        }
        if let Some(next) = self.queue.pop_front() {
            self.start(hw, next.freq_hz, next.duration_ms, now);
            self.next_at = now + Millis::from(next.duration_ms + next.gap_ms);
        } else if self.current.is_some() && now >= self.busy_until {
            self.current = None;
        }
    }

    /// Silence the buzzer and drop queued notes.
    pub fn stop(&mut self, hw: &mut dyn Hardware) {
        self.queue.clear();
        self.current = None;
        hw.stop_tone();
    }

    fn start(&mut self, hw: &mut dyn Hardware, freq_hz: u16, duration_ms: u32, now: Millis) {
        hw.start_tone(freq_hz, duration_ms);
        self.current = Some(freq_hz);
        self.busy_until = now + Millis::from(duration_ms);
    }
}
