//! Console configuration loading: session timings, game content and run options.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    Millis,
    error::ConfigError,
    games::{
        melody::{DEFAULT_TARGET, MELODY_LENGTH},
        trivia::{TriviaQuestion, default_questions},
    },
    hal::key_led::KEY_COUNT,
};

/// Default location on disk where the console looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ESCAPE_CONSOLE_CONFIG_PATH";

/// Session timings, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate)]
#[serde(default)]
pub struct TimingConfig {
    /// Length of the whole session.
    #[validate(range(min = 1))]
    pub total_time_ms: Millis,
    /// Period of the main loop.
    #[validate(range(min = 1))]
    pub tick_ms: Millis,
    /// Remaining time at which the session is declared lost.
    pub time_up_warning_ms: Millis,
    /// Time each intro message stays on screen.
    #[validate(range(min = 1))]
    pub intro_interval_ms: Millis,
    /// Length of the loading screen between games.
    #[validate(range(min = 1))]
    pub loading_ms: Millis,
    /// Push-button debounce window.
    pub debounce_ms: Millis,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            total_time_ms: 600_000,
            tick_ms: 10,
            time_up_warning_ms: 1_000,
            intro_interval_ms: 2_000,
            loading_ms: 3_000,
            debounce_ms: 50,
        }
    }
}

/// Immutable runtime configuration of the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Session timings.
    pub timing: TimingConfig,
    /// Eight key digits the melody game expects.
    pub melody_target: String,
    /// Trivia questions, asked in order.
    pub questions: Vec<TriviaQuestion>,
    /// Fixed seed for reproducible sessions; OS entropy when absent.
    pub rng_seed: Option<u64>,
    /// Whether a button press on the final screen starts a new session.
    pub restart_on_press: bool,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to the built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        total_time_ms = config.timing.total_time_ms,
                        questions = config.questions.len(),
                        "loaded console config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to load config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON document. Missing fields take their default.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        Ok(Self::try_from(raw)?)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            melody_target: DEFAULT_TARGET.to_string(),
            questions: default_questions(),
            rng_seed: None,
            restart_on_press: false,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[validate(nested)]
    timing: TimingConfig,
    #[validate(custom(function = "validate_melody"))]
    melody_target: String,
    #[validate(length(min = 1), nested)]
    questions: Vec<TriviaQuestion>,
    rng_seed: Option<u64>,
    restart_on_press: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            timing: defaults.timing,
            melody_target: defaults.melody_target,
            questions: defaults.questions,
            rng_seed: defaults.rng_seed,
            restart_on_press: defaults.restart_on_press,
        }
    }
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ValidationErrors;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        value.validate()?;

        Ok(Self {
            timing: value.timing,
            melody_target: value.melody_target,
            questions: value.questions,
            rng_seed: value.rng_seed,
            restart_on_press: value.restart_on_press,
        })
    }
}

/// Validate a melody target: exactly eight key digits, each naming one of the keys.
fn validate_melody(target: &str) -> Result<(), ValidationError> {
    let keys = 1..=u32::from(KEY_COUNT);
    let valid_key = |c: char| c.to_digit(10).is_some_and(|digit| keys.contains(&digit));
    if target.chars().count() == MELODY_LENGTH && target.chars().all(valid_key) {
        return Ok(());
    }
    let mut err = ValidationError::new("melody_target");
    err.message = Some(
        format!("Melody target must be {MELODY_LENGTH} digits between 1 and {KEY_COUNT}").into(),
    );
    Err(err)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
