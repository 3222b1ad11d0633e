//! In-memory board used by the host binary and by tests.

use std::{
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;
use tracing::{debug, info, trace};

use super::{Hardware, Rgb, key_led::KEY_COUNT, pot::POT_MAX};

/// A tone started on the simulated buzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneEvent {
    /// Pitch in hertz.
    pub freq_hz: u16,
    /// Requested duration.
    pub duration_ms: u32,
}

#[derive(Debug, Default)]
struct SimState {
    button_held: bool,
    pot: u16,
    keys: u8,
    lcd: (String, String),
    lcd_writes: usize,
    rgb: Rgb,
    rgb_writes: usize,
    key_leds: u8,
    segments: String,
    tones: Vec<ToneEvent>,
}

/// Simulated console board.
///
/// Cloning yields another handle to the same board, so one handle can be boxed into the
/// console while another drives inputs and inspects outputs.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHardware {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHardware {
    /// Board with everything released, off, and the pot at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold or release the push-button.
    pub fn set_button(&self, held: bool) {
        self.lock().button_held = held;
    }

    /// Turn the potentiometer (clamped to the ADC range).
    pub fn set_pot(&self, value: u16) {
        self.lock().pot = value.min(POT_MAX);
    }

    /// Hold exactly the keys in `mask`.
    pub fn set_keys(&self, mask: u8) {
        self.lock().keys = mask;
    }

    /// Rows currently on the LCD.
    pub fn lcd_lines(&self) -> (String, String) {
        self.lock().lcd.clone()
    }

    /// Number of LCD repaints so far.
    pub fn lcd_writes(&self) -> usize {
        self.lock().lcd_writes
    }

    /// Current status LED color.
    pub fn rgb(&self) -> Rgb {
        self.lock().rgb
    }

    /// Number of status LED writes so far.
    pub fn rgb_writes(&self) -> usize {
        self.lock().rgb_writes
    }

    /// Lit key LEDs as a bit mask.
    pub fn key_leds(&self) -> u8 {
        self.lock().key_leds
    }

    /// 7-segment text.
    pub fn segments(&self) -> String {
        self.lock().segments.clone()
    }

    /// Every tone started so far, oldest first.
    pub fn tones(&self) -> Vec<ToneEvent> {
        self.lock().tones.clone()
    }

    /// Apply an operator command that maps directly onto an input.
    pub fn apply(&self, command: &SimCommand) {
        match *command {
            SimCommand::Press | SimCommand::Hold => self.set_button(true),
            SimCommand::Release => self.set_button(false),
            SimCommand::Pot(value) => self.set_pot(value),
            SimCommand::Keys(mask) => self.set_keys(mask),
            SimCommand::Key(number) => self.set_keys(1 << (number - 1)),
            SimCommand::Status | SimCommand::Quit => {}
        }
    }
}

impl Hardware for SimulatedHardware {
    fn button_level(&self) -> bool {
        self.lock().button_held
    }

    fn pot_raw(&self) -> u16 {
        self.lock().pot
    }

    fn key_mask(&self) -> u8 {
        self.lock().keys
    }

    fn set_key_led(&mut self, index: u8, on: bool) {
        let mut state = self.lock();
        if on {
            state.key_leds |= 1 << index;
        } else {
            state.key_leds &= !(1 << index);
        }
    }

    fn show_segments(&mut self, text: &str) {
        trace!(text, "7-segment");
        self.lock().segments = text.to_string();
    }

    fn set_rgb(&mut self, color: Rgb) {
        trace!(r = color.r, g = color.g, b = color.b, "rgb");
        let mut state = self.lock();
        state.rgb = color;
        state.rgb_writes += 1;
    }

    fn start_tone(&mut self, freq_hz: u16, duration_ms: u32) {
        trace!(freq_hz, duration_ms, "tone");
        self.lock().tones.push(ToneEvent {
            freq_hz,
            duration_ms,
        });
    }

    fn stop_tone(&mut self) {
        trace!("tone stopped");
    }

    fn write_lcd(&mut self, line1: &str, line2: &str) {
        info!(target: "escape_console::lcd", "[{line1:<16}] [{line2:<16}]");
        let mut state = self.lock();
        state.lcd = (line1.to_string(), line2.to_string());
        state.lcd_writes += 1;
    }
}

/// Operator command typed into the host simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    /// Tap the push-button (the runtime releases it shortly after).
    Press,
    /// Hold the push-button down.
    Hold,
    /// Release the push-button.
    Release,
    /// Set the potentiometer.
    Pot(u16),
    /// Hold an arbitrary key mask.
    Keys(u8),
    /// Tap a single key, numbered 1 to 8.
    Key(u8),
    /// Log the session snapshot.
    Status,
    /// Stop the simulator.
    Quit,
}

/// Error returned for a command line that cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimCommandError {
    /// Empty input.
    #[error("empty command")]
    Empty,
    /// First word is not a known command.
    #[error("unknown command `{0}`")]
    Unknown(String),
    /// Command requires an argument that was not given.
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    /// Argument could not be parsed or is out of range.
    #[error("invalid argument `{value}` for `{command}`")]
    InvalidArgument {
        /// Command being parsed.
        command: &'static str,
        /// Offending argument.
        value: String,
    },
}

impl FromStr for SimCommand {
    type Err = SimCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(SimCommandError::Empty);
        };
        let arg = words.next();

        let command = match verb.to_ascii_lowercase().as_str() {
            "press" | "p" => SimCommand::Press,
            "hold" => SimCommand::Hold,
            "release" => SimCommand::Release,
            "pot" => SimCommand::Pot(parse_arg("pot", arg, |v| {
                v.parse::<u16>().ok().filter(|v| *v <= POT_MAX)
            })?),
            "keys" => SimCommand::Keys(parse_arg("keys", arg, parse_mask)?),
            "key" | "k" => SimCommand::Key(parse_arg("key", arg, |v| {
                v.parse::<u8>().ok().filter(|n| (1..=KEY_COUNT).contains(n))
            })?),
            "status" | "s" => SimCommand::Status,
            "quit" | "exit" | "q" => SimCommand::Quit,
            other => return Err(SimCommandError::Unknown(other.to_string())),
        };

        debug!(?command, "parsed simulator command");
        Ok(command)
    }
}

fn parse_arg<T>(
    command: &'static str,
    arg: Option<&str>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, SimCommandError> {
    let value = arg.ok_or(SimCommandError::MissingArgument(command))?;
    parse(value).ok_or_else(|| SimCommandError::InvalidArgument {
        command,
        value: value.to_string(),
    })
}

fn parse_mask(value: &str) -> Option<u8> {
    if let Some(hex) = value.strip_prefix("0x") {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = value.strip_prefix("0b") {
        u8::from_str_radix(bin, 2).ok()
    } else {
        value.parse().ok()
    }
}
