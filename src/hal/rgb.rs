//! RGB status LED, the loading animation and the color palettes.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::Hardware;
use crate::Millis;

/// 8-bit-per-channel color for the PWM-driven status LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red duty cycle.
    pub r: u8,
    /// Green duty cycle.
    pub g: u8,
    /// Blue duty cycle.
    pub b: u8,
}

impl Rgb {
    /// LED off.
    pub const OFF: Rgb = Rgb::new(0, 0, 0);
    /// Full red.
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    /// Full green.
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    /// Full blue.
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    /// Full white.
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Status LED that skips redundant PWM writes.
#[derive(Debug, Default)]
pub struct RgbLed {
    current: Option<Rgb>,
}

impl RgbLed {
    /// LED in an unknown state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the LED to `color`.
    pub fn set(&mut self, hw: &mut dyn Hardware, color: Rgb) {
        if self.current != Some(color) {
            hw.set_rgb(color);
            self.current = Some(color);
        }
    }
}

const RAINBOW: [Rgb; 8] = [
    Rgb::new(255, 0, 0),
    Rgb::new(255, 127, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(75, 0, 130),
    Rgb::new(148, 0, 211),
    Rgb::new(255, 255, 255),
];

/// Time each rainbow color stays lit during the loading animation.
const RAINBOW_STEP_MS: Millis = 100;

/// Color of the loading animation `elapsed` ms in: an 800 ms rainbow cycle.
pub fn loading_animation_color(elapsed: Millis) -> Rgb {
    let slot = (elapsed / RAINBOW_STEP_MS) % RAINBOW.len() as Millis;
    RAINBOW[slot as usize]
}

/// Candidate target colors for the color-matching game, one set per difficulty level.
///
/// Every channel is a multiple of 32 so any target can be dialled in exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    levels: Vec<Vec<Rgb>>,
}

impl ColorPalette {
    /// Build a palette from per-level candidate sets (index 0 = level 1).
    ///
    /// Empty levels fall back to red when drawn from.
    pub fn new(levels: Vec<Vec<Rgb>>) -> Self {
        Self { levels }
    }

    /// Draw a random color for `level` (1-based). Levels past the last set reuse it.
    pub fn random_color<R: Rng + ?Sized>(&self, level: u8, rng: &mut R) -> Rgb {
        let index = usize::from(level.max(1) - 1).min(self.levels.len().saturating_sub(1));
        self.levels
            .get(index)
            .and_then(|set| set.choose(rng))
            .copied()
            .unwrap_or(Rgb::new(224, 0, 0))
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::new(vec![
            // Saturated primaries and secondaries.
            vec![
                Rgb::new(224, 0, 0),
                Rgb::new(0, 224, 0),
                Rgb::new(0, 0, 224),
                Rgb::new(224, 224, 0),
                Rgb::new(0, 224, 224),
                Rgb::new(224, 0, 224),
            ],
            // Two-channel blends.
            vec![
                Rgb::new(224, 160, 0),
                Rgb::new(160, 0, 160),
                Rgb::new(0, 128, 128),
                Rgb::new(128, 128, 0),
                Rgb::new(224, 96, 0),
                Rgb::new(96, 0, 224),
            ],
            // Three-channel mixes.
            vec![
                Rgb::new(224, 96, 192),
                Rgb::new(96, 160, 32),
                Rgb::new(128, 64, 32),
                Rgb::new(64, 192, 160),
                Rgb::new(192, 128, 64),
                Rgb::new(32, 96, 160),
            ],
        ])
    }
}
