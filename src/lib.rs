//! Library crate for escape-console, exposing the game core for the host binary and tests.

pub mod config;
pub mod error;
pub mod games;
pub mod hal;
pub mod score;
pub mod state;

/// Milliseconds since the console booted; every timer in the crate uses this unit.
pub type Millis = u64;
