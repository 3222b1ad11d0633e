//! Session phase machine: which phase follows which event.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::score::GameId;

/// Top-level phases of a console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "game", rename_all = "snake_case")]
pub enum AppPhase {
    /// Welcome messages before the first game.
    Intro,
    /// A mini-game is being played.
    Game(GameId),
    /// Pause screen after the given game was completed.
    Loading(GameId),
    /// The session deadline passed; terminal.
    TimeUp,
    /// All four games were completed in time; terminal.
    GameWon,
}

impl AppPhase {
    /// Whether a mini-game is active.
    pub fn is_game(self) -> bool {
        matches!(self, AppPhase::Game(_))
    }

    /// Whether the session is over.
    pub fn is_terminal(self) -> bool {
        matches!(self, AppPhase::TimeUp | AppPhase::GameWon)
    }
}

impl fmt::Display for AppPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppPhase::Intro => write!(f, "intro"),
            AppPhase::Game(game) => write!(f, "game {} ({game})", game.number()),
            AppPhase::Loading(game) => write!(f, "loading after game {}", game.number()),
            AppPhase::TimeUp => write!(f, "time up"),
            AppPhase::GameWon => write!(f, "game won"),
        }
    }
}

/// Events that can be applied to the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Every intro message has been shown.
    IntroFinished,
    /// The active game was solved. `deadline_passed` reports whether the global clock ran
    /// out in the meantime.
    GameCompleted {
        /// Global clock state at completion.
        deadline_passed: bool,
    },
    /// The active game ended on its own time-expiry.
    GameTimedOut,
    /// The loading screen has been shown for its full duration.
    LoadingFinished,
    /// The global countdown reached its warning threshold.
    DeadlineReached,
    /// Start a fresh session from a terminal phase.
    Restart,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the machine was in when the invalid event was received.
    pub from: AppPhase,
    /// The event that cannot be applied from this phase.
    pub event: AppEvent,
}

/// Transition table for the session flow: intro, four games separated by loading screens,
/// then a terminal win or time-up phase.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: AppPhase,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self {
            phase: AppPhase::Intro,
        }
    }
}

impl PhaseMachine {
    /// Machine starting in [`AppPhase::Intro`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> AppPhase {
        self.phase
    }

    /// Apply `event`, returning the new phase. Invalid events leave the phase untouched.
    pub fn apply(&mut self, event: AppEvent) -> Result<AppPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: AppEvent) -> Result<AppPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (AppPhase::Intro, AppEvent::IntroFinished) => AppPhase::Game(GameId::Combination),
            (AppPhase::Game(_), AppEvent::GameTimedOut) => AppPhase::TimeUp,
            (AppPhase::Game(game), AppEvent::GameCompleted { deadline_passed }) => {
                match game.next() {
                    Some(_) => AppPhase::Loading(game),
                    None if deadline_passed => AppPhase::TimeUp,
                    None => AppPhase::GameWon,
                }
            }
            (AppPhase::Loading(game), AppEvent::LoadingFinished) => match game.next() {
                Some(next) => AppPhase::Game(next),
                None => return Err(InvalidTransition { from: self.phase, event }),
            },
            (
                AppPhase::Intro | AppPhase::Game(_) | AppPhase::Loading(_),
                AppEvent::DeadlineReached,
            ) => AppPhase::TimeUp,
            (AppPhase::TimeUp | AppPhase::GameWon, AppEvent::Restart) => AppPhase::Intro,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut PhaseMachine, event: AppEvent) -> AppPhase {
        sm.apply(event).unwrap()
    }

    const COMPLETED: AppEvent = AppEvent::GameCompleted {
        deadline_passed: false,
    };

    #[test]
    fn initial_state_is_intro() {
        let sm = PhaseMachine::new();
        assert_eq!(sm.phase(), AppPhase::Intro);
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut sm = PhaseMachine::new();

        assert_eq!(
            apply(&mut sm, AppEvent::IntroFinished),
            AppPhase::Game(GameId::Combination)
        );
        for (game, next) in [
            (GameId::Combination, GameId::Melody),
            (GameId::Melody, GameId::ColorMatch),
            (GameId::ColorMatch, GameId::Trivia),
        ] {
            assert_eq!(apply(&mut sm, COMPLETED), AppPhase::Loading(game));
            assert_eq!(apply(&mut sm, AppEvent::LoadingFinished), AppPhase::Game(next));
        }
        assert_eq!(apply(&mut sm, COMPLETED), AppPhase::GameWon);
    }

    #[test]
    fn last_game_finished_after_deadline_is_time_up() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, AppEvent::IntroFinished);
        for _ in 0..3 {
            apply(&mut sm, COMPLETED);
            apply(&mut sm, AppEvent::LoadingFinished);
        }
        assert_eq!(
            apply(
                &mut sm,
                AppEvent::GameCompleted {
                    deadline_passed: true
                }
            ),
            AppPhase::TimeUp
        );
    }

    #[test]
    fn deadline_forces_time_up_from_every_live_phase() {
        let mut intro = PhaseMachine::new();
        assert_eq!(apply(&mut intro, AppEvent::DeadlineReached), AppPhase::TimeUp);

        let mut game = PhaseMachine::new();
        apply(&mut game, AppEvent::IntroFinished);
        assert_eq!(apply(&mut game, AppEvent::DeadlineReached), AppPhase::TimeUp);

        let mut loading = PhaseMachine::new();
        apply(&mut loading, AppEvent::IntroFinished);
        apply(&mut loading, COMPLETED);
        assert_eq!(apply(&mut loading, AppEvent::DeadlineReached), AppPhase::TimeUp);
    }

    #[test]
    fn game_timeout_goes_straight_to_time_up() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, AppEvent::IntroFinished);
        assert_eq!(apply(&mut sm, AppEvent::GameTimedOut), AppPhase::TimeUp);
    }

    #[test]
    fn terminal_phases_only_accept_restart() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, AppEvent::DeadlineReached);

        let err = sm.apply(AppEvent::DeadlineReached).unwrap_err();
        assert_eq!(err.from, AppPhase::TimeUp);
        assert_eq!(err.event, AppEvent::DeadlineReached);
        assert_eq!(sm.phase(), AppPhase::TimeUp);

        assert_eq!(apply(&mut sm, AppEvent::Restart), AppPhase::Intro);
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = PhaseMachine::new();
        let err = sm.apply(AppEvent::LoadingFinished).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                from: AppPhase::Intro,
                event: AppEvent::LoadingFinished,
            }
        );
        assert_eq!(sm.phase(), AppPhase::Intro);
    }

    #[test]
    fn terminal_and_game_helpers() {
        assert!(AppPhase::Game(GameId::Trivia).is_game());
        assert!(!AppPhase::Loading(GameId::Melody).is_game());
        assert!(AppPhase::GameWon.is_terminal());
        assert!(AppPhase::TimeUp.is_terminal());
        assert!(!AppPhase::Intro.is_terminal());
    }
}
