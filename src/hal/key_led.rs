//! 7-segment timer and the eight key LEDs of the key module.

use super::Hardware;
use crate::Millis;

/// Number of keys (and LEDs) on the module.
pub const KEY_COUNT: u8 = 8;

/// 7-segment + 8-key module state; only pushes changes to the hardware.
#[derive(Debug, Default)]
pub struct KeyLed {
    leds: Option<u8>,
    segments: Option<String>,
}

impl KeyLed {
    /// Module with unknown LED and display state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Light exactly the LEDs set in `mask`.
    pub fn set_leds(&mut self, hw: &mut dyn Hardware, mask: u8) {
        let previous = self.leds.replace(mask);
        for index in 0..KEY_COUNT {
            let bit = 1 << index;
            let changed = previous.is_none_or(|p| (p ^ mask) & bit != 0);
            if changed {
                hw.set_key_led(index, mask & bit != 0);
            }
        }
    }

    /// Show the remaining session time and a one-digit counter.
    pub fn display_time(
        &mut self,
        hw: &mut dyn Hardware,
        elapsed: Millis,
        total: Millis,
        counter: u32,
    ) {
        let text = format_timer(elapsed, total, counter);
        if self.segments.as_deref() != Some(text.as_str()) {
            hw.show_segments(&text);
            self.segments = Some(text);
        }
    }
}

/// `MM.SS   c`: remaining minutes and seconds, then the counter capped at 9.
pub fn format_timer(elapsed: Millis, total: Millis, counter: u32) -> String {
    let remaining_s = total.saturating_sub(elapsed) / 1000;
    let counter = counter.min(9);
    format!("{:02}.{:02}   {}", remaining_s / 60, remaining_s % 60, counter)
}
