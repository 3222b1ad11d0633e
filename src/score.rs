//! Points awarded for a completed game.
//!
//! Every game starts from [`BASE_POINTS`] and loses points for each button press beyond
//! the game's minimum and for each whole second beyond its ideal completion time. The
//! result never drops below zero.

use std::fmt;

use serde::Serialize;

use crate::{Millis, error::ScoreError};

/// Points for a flawless game.
pub const BASE_POINTS: u32 = 1000;
/// Deducted per press beyond the game's minimum.
pub const PRESS_PENALTY: u32 = 100;
/// Deducted per whole second beyond the game's ideal time.
pub const SECOND_PENALTY: u32 = 50;

/// The four games, in play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    /// Three-step vault dial.
    Combination = 1,
    /// Eight-note melody memory.
    Melody = 2,
    /// RGB color matching.
    ColorMatch = 3,
    /// Multiple-choice trivia.
    Trivia = 4,
}

/// Reference performance a game is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreTarget {
    /// Presses that are free of penalty.
    pub min_presses: u32,
    /// Completion time that is free of penalty.
    pub ideal_time_ms: Millis,
}

impl GameId {
    /// All games in play order.
    pub const ALL: [GameId; 4] = [
        GameId::Combination,
        GameId::Melody,
        GameId::ColorMatch,
        GameId::Trivia,
    ];

    /// 1-based game number.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// 0-based index, for per-game tables.
    pub fn index(self) -> usize {
        usize::from(self.number() - 1)
    }

    /// The game played after this one, if any.
    pub fn next(self) -> Option<GameId> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Reference presses and time for this game.
    pub fn target(self) -> ScoreTarget {
        let (min_presses, ideal_time_ms) = match self {
            GameId::Combination => (3, 3_000),
            GameId::Melody => (1, 5_000),
            GameId::ColorMatch => (1, 4_000),
            GameId::Trivia => (7, 35_000),
        };
        ScoreTarget {
            min_presses,
            ideal_time_ms,
        }
    }
}

impl TryFrom<u8> for GameId {
    type Error = ScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(GameId::Combination),
            2 => Ok(GameId::Melody),
            3 => Ok(GameId::ColorMatch),
            4 => Ok(GameId::Trivia),
            other => Err(ScoreError::UnknownGame(other)),
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameId::Combination => "combination",
            GameId::Melody => "melody",
            GameId::ColorMatch => "color-match",
            GameId::Trivia => "trivia",
        };
        write!(f, "{name}")
    }
}

/// Points for finishing `game` with `presses` presses in `time_taken_ms`.
pub fn score(game: GameId, presses: u32, time_taken_ms: Millis) -> u32 {
    let target = game.target();

    let extra_presses = u64::from(presses.saturating_sub(target.min_presses));
    let extra_seconds = time_taken_ms.saturating_sub(target.ideal_time_ms) / 1000;

    let penalty = extra_presses
        .saturating_mul(u64::from(PRESS_PENALTY))
        .saturating_add(extra_seconds.saturating_mul(u64::from(SECOND_PENALTY)));

    u64::from(BASE_POINTS).saturating_sub(penalty) as u32
}

/// [`score`] for a raw 1-based game number.
pub fn score_by_number(game: u8, presses: u32, time_taken_ms: Millis) -> Result<u32, ScoreError> {
    GameId::try_from(game).map(|game| score(game, presses, time_taken_ms))
}

/// Immutable record of a completed game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    game: GameId,
    presses: u32,
    time_taken_ms: Millis,
    points: u32,
}

impl GameResult {
    /// Record a completion and compute its points.
    pub fn new(game: GameId, presses: u32, time_taken_ms: Millis) -> Self {
        Self {
            game,
            presses,
            time_taken_ms,
            points: score(game, presses, time_taken_ms),
        }
    }

    /// Which game was completed.
    pub fn game(&self) -> GameId {
        self.game
    }

    /// Presses (or attempts) counted against the game.
    pub fn presses(&self) -> u32 {
        self.presses
    }

    /// Time from the start of play to completion.
    pub fn time_taken_ms(&self) -> Millis {
        self.time_taken_ms
    }

    /// Points awarded.
    pub fn points(&self) -> u32 {
        self.points
    }
}
