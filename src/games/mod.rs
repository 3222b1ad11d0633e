//! The four mini-games and the contract the orchestrator drives them through.
//!
//! Every game is a cooperative state machine polled once per tick with the shared
//! [`SessionContext`]. A poll never blocks; waits are expressed as timestamps compared on
//! later polls.

pub mod color_match;
pub mod combination;
pub mod melody;
pub mod sequencer;
pub mod trivia;

use crate::{
    config::AppConfig,
    hal::ColorPalette,
    score::{GameId, GameResult},
    state::SessionContext,
};

use self::{
    color_match::ColorMatchGame,
    combination::CombinationGame,
    melody::MelodyGame,
    trivia::{TriviaGame, TriviaQuestion},
};

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// Solved; carries the scored result.
    Completed(GameResult),
    /// The session deadline passed while the game was running.
    TimedOut,
}

/// Result of polling a game for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Still running.
    Continue,
    /// The game is over; further polls keep returning the same outcome.
    Finished(GameOutcome),
}

/// The game currently being played.
#[derive(Debug)]
pub enum ActiveGame {
    /// Game 1.
    Combination(CombinationGame),
    /// Game 2.
    Melody(MelodyGame),
    /// Game 3.
    ColorMatch(ColorMatchGame),
    /// Game 4.
    Trivia(TriviaGame),
}

impl ActiveGame {
    /// Run the game for one tick.
    pub fn poll(&mut self, ctx: &mut SessionContext) -> GameStatus {
        match self {
            ActiveGame::Combination(game) => game.poll(ctx),
            ActiveGame::Melody(game) => game.poll(ctx),
            ActiveGame::ColorMatch(game) => game.poll(ctx),
            ActiveGame::Trivia(game) => game.poll(ctx),
        }
    }
}

/// Content used to build each game when its turn comes.
#[derive(Debug, Clone)]
pub struct GameSetup {
    /// Fixed vault combination; drawn at random when absent.
    pub combination: Option<[i32; 3]>,
    /// Digits the melody game expects.
    pub melody_target: String,
    /// Target colors for the color-matching game.
    pub palette: ColorPalette,
    /// Trivia questions, asked in order.
    pub questions: Vec<TriviaQuestion>,
}

impl GameSetup {
    /// Content from the loaded configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            combination: None,
            melody_target: config.melody_target.clone(),
            palette: ColorPalette::default(),
            questions: config.questions.clone(),
        }
    }

    /// Fresh instance of `id`, starting its intro at the current tick.
    pub fn build(&self, id: GameId, ctx: &mut SessionContext) -> ActiveGame {
        let now = ctx.now();
        match id {
            GameId::Combination => {
                let combo = self
                    .combination
                    .unwrap_or_else(|| combination::random_combo(&mut ctx.rng));
                ActiveGame::Combination(CombinationGame::new(combo, now))
            }
            GameId::Melody => ActiveGame::Melody(MelodyGame::new(&self.melody_target, now)),
            GameId::ColorMatch => {
                ActiveGame::ColorMatch(ColorMatchGame::new(self.palette.clone(), now))
            }
            GameId::Trivia => ActiveGame::Trivia(TriviaGame::new(self.questions.clone(), now)),
        }
    }
}

impl Default for GameSetup {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
