//! Peripheral layer: raw hardware access plus the small stateful wrappers the games talk to.
//!
//! [`Hardware`] is the only seam to the physical (or simulated) board. Everything above it
//! goes through [`Peripherals`], which owns the debouncer, the LCD repaint cache, the
//! non-blocking buzzer and the key-LED state so that games never block on I/O.

pub mod button;
pub mod buzzer;
pub mod key_led;
pub mod lcd;
pub mod pot;
pub mod rgb;
pub mod sim;

use crate::Millis;

pub use self::button::Button;
pub use self::buzzer::{Buzzer, Melody};
pub use self::key_led::KeyLed;
pub use self::lcd::Lcd;
pub use self::pot::{POT_MAX, map_range};
pub use self::rgb::{ColorPalette, Rgb, RgbLed};
pub use self::sim::SimulatedHardware;

/// Raw access to the console's pins and modules.
///
/// Implementations must not block: tones are started and left to run out on their own.
pub trait Hardware: Send {
    /// Whether the push-button is physically held down right now (undebounced).
    fn button_level(&self) -> bool;
    /// Raw potentiometer reading in `0..=1023`.
    fn pot_raw(&self) -> u16;
    /// Bit mask of the 8 module keys currently held (bit 0 = key 1).
    fn key_mask(&self) -> u8;
    /// Switch a single key LED (index `0..8`).
    fn set_key_led(&mut self, index: u8, on: bool);
    /// Replace the 7-segment text.
    fn show_segments(&mut self, text: &str);
    /// Drive the RGB status LED.
    fn set_rgb(&mut self, color: Rgb);
    /// Start a tone that stops by itself after `duration_ms`.
    fn start_tone(&mut self, freq_hz: u16, duration_ms: u32);
    /// Silence the buzzer immediately.
    fn stop_tone(&mut self);
    /// Repaint both LCD rows.
    fn write_lcd(&mut self, line1: &str, line2: &str);
}

/// The console's peripherals as seen by the game logic.
pub struct Peripherals {
    hw: Box<dyn Hardware>,
    now: Millis,
    button: Button,
    buzzer: Buzzer,
    lcd: Lcd,
    key_led: KeyLed,
    rgb: RgbLed,
}

impl Peripherals {
    /// Wrap a hardware backend; `debounce_ms` configures the push-button debouncer.
    pub fn new(hw: Box<dyn Hardware>, debounce_ms: Millis) -> Self {
        Self {
            hw,
            now: 0,
            button: Button::new(debounce_ms),
            buzzer: Buzzer::new(),
            lcd: Lcd::new(),
            key_led: KeyLed::new(),
            rgb: RgbLed::new(),
        }
    }

    /// Record the timestamp of the tick in progress.
    pub(crate) fn set_now(&mut self, now: Millis) {
        self.now = now;
    }

    /// Sample the push-button and return whether a press edge was detected this tick.
    pub fn poll_button(&mut self) -> bool {
        let level = self.hw.button_level();
        self.button.update(level, self.now);
        self.button.is_pressed()
    }

    /// Raw potentiometer value, clamped to `0..=1023`.
    pub fn pot_value(&self) -> u16 {
        self.hw.pot_raw().min(POT_MAX)
    }

    /// Potentiometer value linearly rescaled onto `min..=max`.
    pub fn pot_mapped(&self, min: i32, max: i32) -> i32 {
        map_range(i32::from(self.pot_value()), 0, i32::from(POT_MAX), min, max)
    }

    /// Current key mask of the key-LED module.
    pub fn keys(&self) -> u8 {
        self.hw.key_mask()
    }

    /// Mirror `mask` onto the 8 key LEDs.
    pub fn set_key_leds(&mut self, mask: u8) {
        self.key_led.set_leds(self.hw.as_mut(), mask);
    }

    /// Render the remaining time and a counter digit on the 7-segment display.
    pub fn display_time(&mut self, elapsed: Millis, total: Millis, counter: u32) {
        self.key_led
            .display_time(self.hw.as_mut(), elapsed, total, counter);
    }

    /// Set the RGB LED color.
    pub fn set_color(&mut self, color: Rgb) {
        self.rgb.set(self.hw.as_mut(), color);
    }

    /// Drive the rainbow loading animation for the given elapsed time.
    pub fn loading_animation(&mut self, elapsed: Millis) {
        self.rgb
            .set(self.hw.as_mut(), rgb::loading_animation_color(elapsed));
    }

    /// Repaint the LCD unconditionally.
    pub fn lcd_show(&mut self, line1: &str, line2: &str) {
        self.lcd.show(self.hw.as_mut(), line1, line2);
    }

    /// Repaint the LCD only if the content differs from what is on screen.
    pub fn lcd_update(&mut self, line1: &str, line2: &str) {
        self.lcd.update(self.hw.as_mut(), line1, line2);
    }

    /// Blank the LCD.
    pub fn lcd_clear(&mut self) {
        self.lcd.clear(self.hw.as_mut());
    }

    /// Fire-and-forget tone.
    pub fn play_tone(&mut self, freq_hz: u16, duration_ms: u32) {
        self.buzzer
            .play_tone(self.hw.as_mut(), freq_hz, duration_ms, self.now);
    }

    /// Queue one of the canned melodies.
    pub fn play_melody(&mut self, melody: Melody) {
        self.buzzer.play_melody(self.hw.as_mut(), melody, self.now);
    }

    /// Silence the buzzer and drop any queued notes.
    pub fn stop_tone(&mut self) {
        self.buzzer.stop(self.hw.as_mut());
    }

    /// Advance queued melodies; called once at the end of every tick.
    pub fn poll_buzzer(&mut self) {
        self.buzzer.poll(self.hw.as_mut(), self.now);
    }
}
