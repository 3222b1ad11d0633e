//! Game 4: multiple-choice trivia answered with the potentiometer and the push-button.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use super::{
    GameOutcome, GameStatus,
    sequencer::{MessageSequencer, Sequence, Stopwatch},
};
use crate::{
    Millis,
    hal::{Melody, Rgb, lcd::LCD_COLUMNS},
    score::{GameId, GameResult},
    state::SessionContext,
};

/// Answers offered per question, labelled A to E.
pub const OPTION_COUNT: usize = 5;

const INTRO_MS: Millis = 2_000;
const TYPEWRITER_MS: Millis = 50;
const WRONG_MS: Millis = 1_200;
const FEEDBACK_MS: Millis = 2_000;
const ERROR_TONE_HZ: u16 = 400;
const ERROR_TONE_MS: u32 = 100;

const FINAL_COLOR: Rgb = Rgb::new(0, 224, 0);

/// A question with five labelled options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TriviaQuestion {
    /// Shown on the first LCD row, cut to 16 characters.
    #[validate(length(min = 1))]
    pub prompt: String,
    /// Options A to E.
    #[validate(custom(function = "validate_options"))]
    pub options: [String; OPTION_COUNT],
    /// 0-based index of the right option.
    #[validate(range(max = 4))]
    pub correct: usize,
}

impl TriviaQuestion {
    /// Build a question from string slices.
    pub fn new(prompt: &str, options: [&str; OPTION_COUNT], correct: usize) -> Self {
        Self {
            prompt: prompt.to_string(),
            options: options.map(str::to_string),
            correct,
        }
    }

    /// Label and text of option `index`, formatted for the second LCD row.
    pub fn option_line(&self, index: usize) -> String {
        let index = index.min(OPTION_COUNT - 1);
        format!("{}: {}", option_letter(index), self.options[index])
    }
}

/// Letter labelling option `index`.
pub fn option_letter(index: usize) -> char {
    char::from(b'A' + index.min(OPTION_COUNT - 1) as u8)
}

/// Rejects option lists with a blank entry; the LCD would show a bare letter.
pub fn validate_options(options: &[String; OPTION_COUNT]) -> Result<(), ValidationError> {
    if let Some(index) = options.iter().position(|option| option.trim().is_empty()) {
        let mut err = ValidationError::new("trivia_option_blank");
        err.message = Some(format!("Option {} must not be blank", option_letter(index)).into());
        return Err(err);
    }
    Ok(())
}

/// The general-knowledge set the console ships with.
pub fn default_questions() -> Vec<TriviaQuestion> {
    vec![
        TriviaQuestion::new(
            "France: Capital",
            ["Paris", "Berlin", "Madrid", "Rome", "Lisbon"],
            0,
        ),
        TriviaQuestion::new(
            "Largest planet?",
            ["Earth", "Mars", "Jupiter", "Saturn", "Neptune"],
            2,
        ),
        TriviaQuestion::new(
            "Hamlet Author?",
            ["Dickens", "Shakespeare", "Twain", "Tolstoy", "Austen"],
            1,
        ),
        TriviaQuestion::new(
            "Water Boils at?",
            ["90 C", "100 C", "110 C", "120 C", "80 C"],
            1,
        ),
        TriviaQuestion::new(
            "Element 'O' is?",
            ["Gold", "Oxygen", "Silver", "Iron", "Hydrogen"],
            1,
        ),
        TriviaQuestion::new(
            "Largest ocean?",
            ["Atlantic", "Indian", "Arctic", "Southern", "Pacific"],
            4,
        ),
        TriviaQuestion::new(
            "Portugal is in?",
            ["Africa", "Asia", "S.America", "Europe", "Australia"],
            3,
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Intro,
    ShowQuestion,
    WaitForAnswer,
    Wrong,
    Success,
    Complete(GameResult),
    TimeUp,
}

/// Trivia game state.
#[derive(Debug)]
pub struct TriviaGame {
    questions: Vec<TriviaQuestion>,
    current: usize,
    selected: usize,
    first_try: bool,
    first_try_correct: u32,
    phase: Phase,
    intro: MessageSequencer,
    phase_timer: Stopwatch,
    play_timer: Stopwatch,
}

impl TriviaGame {
    /// New quiz over `questions`, asked in order, starting its intro at `now`.
    pub fn new(questions: Vec<TriviaQuestion>, now: Millis) -> Self {
        Self {
            questions,
            current: 0,
            selected: 0,
            first_try: true,
            first_try_correct: 0,
            phase: Phase::Intro,
            intro: MessageSequencer::new(&[("Trivia Time!", "Get Ready...")], INTRO_MS, now),
            phase_timer: Stopwatch::start(now),
            play_timer: Stopwatch::start(now),
        }
    }

    /// Questions answered correctly on the first attempt.
    pub fn first_try_correct(&self) -> u32 {
        self.first_try_correct
    }

    /// 0-based index of the question being asked.
    pub fn current_question(&self) -> usize {
        self.current
    }

    /// Run one tick.
    pub fn poll(&mut self, ctx: &mut SessionContext) -> GameStatus {
        let now = ctx.now();
        match self.phase {
            Phase::TimeUp => return GameStatus::Finished(GameOutcome::TimedOut),
            Phase::Complete(_) => {}
            _ if ctx.time_expired() => return self.time_up(ctx),
            _ => {}
        }

        match self.phase {
            Phase::Intro => {
                ctx.io.set_color(Rgb::BLUE);
                match self.intro.poll(now) {
                    Sequence::Show(_, line1, line2) => ctx.io.lcd_show(line1, line2),
                    Sequence::Hold(_) => {}
                    Sequence::Done => {
                        self.play_timer.restart(now);
                        self.ask(ctx);
                    }
                }
            }
            Phase::ShowQuestion => self.type_question(ctx),
            Phase::WaitForAnswer => self.wait_for_answer(ctx),
            Phase::Wrong => {
                if self.phase_timer.has_elapsed(now, WRONG_MS) {
                    ctx.io.set_color(Rgb::BLUE);
                    self.phase = Phase::WaitForAnswer;
                }
            }
            Phase::Success => {
                if self.phase_timer.has_elapsed(now, FEEDBACK_MS) {
                    self.current += 1;
                    self.ask(ctx);
                }
            }
            Phase::Complete(result) => {
                if self.phase_timer.has_elapsed(now, FEEDBACK_MS) {
                    return GameStatus::Finished(GameOutcome::Completed(result));
                }
            }
            Phase::TimeUp => return GameStatus::Finished(GameOutcome::TimedOut),
        }
        GameStatus::Continue
    }

    fn ask(&mut self, ctx: &mut SessionContext) {
        if self.current >= self.questions.len() {
            self.complete(ctx);
            return;
        }
        debug!(question = self.current + 1, "asking question");
        self.first_try = true;
        self.selected = 0;
        self.phase_timer.restart(ctx.now());
        self.phase = Phase::ShowQuestion;
    }

    fn type_question(&mut self, ctx: &mut SessionContext) {
        let prompt = &self.questions[self.current].prompt;
        let length = prompt.chars().count().min(LCD_COLUMNS);
        let typed = ((self.phase_timer.elapsed(ctx.now()) / TYPEWRITER_MS) as usize).min(length);
        let shown: String = prompt.chars().take(typed).collect();
        ctx.io.lcd_update(&shown, "Select: A");
        if typed >= length {
            self.phase = Phase::WaitForAnswer;
        }
    }

    fn wait_for_answer(&mut self, ctx: &mut SessionContext) {
        ctx.io.set_color(Rgb::BLUE);
        let question = &self.questions[self.current];
        let option = ctx.io.pot_mapped(0, OPTION_COUNT as i32).max(0) as usize;
        self.selected = option.min(OPTION_COUNT - 1);
        ctx.io
            .lcd_update(&question.prompt, &question.option_line(self.selected));

        if !ctx.button_pressed() {
            return;
        }
        let correct = self.selected == question.correct;
        info!(
            question = self.current + 1,
            answer = %option_letter(self.selected),
            correct,
            "answer submitted"
        );
        self.phase_timer.restart(ctx.now());

        if correct {
            if self.first_try {
                self.first_try_correct += 1;
            }
            ctx.io.lcd_show("Correct!", "");
            ctx.io.set_color(Rgb::GREEN);
            ctx.io.play_melody(Melody::Success);
            self.phase = Phase::Success;
        } else {
            self.first_try = false;
            ctx.io.lcd_show("Wrong Answer!", "Try Again...");
            ctx.io.set_color(Rgb::RED);
            ctx.io.play_tone(ERROR_TONE_HZ, ERROR_TONE_MS);
            self.phase = Phase::Wrong;
        }
    }

    fn complete(&mut self, ctx: &mut SessionContext) {
        let now = ctx.now();
        ctx.io.stop_tone();
        ctx.io.set_color(FINAL_COLOR);
        ctx.io.play_melody(Melody::Success);
        ctx.io.lcd_show(
            "Ohh, good job!",
            &format!("Good job {}/{}", self.first_try_correct, self.questions.len()),
        );
        let result = GameResult::new(
            GameId::Trivia,
            ctx.presses().current_game(),
            self.play_timer.elapsed(now),
        );
        info!(
            first_try_correct = self.first_try_correct,
            questions = self.questions.len(),
            presses = result.presses(),
            time_ms = result.time_taken_ms(),
            points = result.points(),
            "trivia complete"
        );
        self.phase_timer.restart(now);
        self.phase = Phase::Complete(result);
    }

    fn time_up(&mut self, ctx: &mut SessionContext) -> GameStatus {
        info!(question = self.current + 1, "trivia out of time");
        ctx.io.set_color(Rgb::RED);
        ctx.io.lcd_show("Time is up!", "Quiz over...");
        self.phase = Phase::TimeUp;
        GameStatus::Finished(GameOutcome::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{games::test_support::Rig, score::score};

    /// Pot readings selecting options A to E.
    const OPTION_POTS: [u16; OPTION_COUNT] = [0, 205, 410, 615, 820];

    fn started(questions: Vec<TriviaQuestion>) -> (Rig, TriviaGame) {
        let mut rig = Rig::new(600_000);
        let mut game = TriviaGame::new(questions, rig.now);
        rig.run(&mut game, INTRO_MS);
        assert_eq!(game.phase, Phase::ShowQuestion);
        (rig, game)
    }

    fn answer(rig: &mut Rig, game: &mut TriviaGame, option: usize) -> GameStatus {
        rig.run_until(game, 2_000, |g| g.phase == Phase::WaitForAnswer);
        rig.board.set_pot(OPTION_POTS[option]);
        rig.run(game, 20);
        rig.press(game)
    }

    #[test]
    fn default_questions_are_valid() {
        let questions = default_questions();
        assert_eq!(questions.len(), 7);
        for question in &questions {
            assert!(question.validate().is_ok(), "{question:?}");
            assert!(question.prompt.chars().count() <= LCD_COLUMNS);
        }
    }

    #[test]
    fn invalid_questions_are_rejected() {
        let mut question = TriviaQuestion::new("Q?", ["a", "b", "c", "d", "e"], 5);
        let errors = question.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("correct"));

        question.correct = 0;
        question.options[3] = " ".into();
        let errors = question.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("options"));

        question.options[3] = "d".into();
        question.prompt.clear();
        let errors = question.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("prompt"));
    }

    #[test]
    fn blank_option_is_named_by_letter() {
        let options = ["a", "", "c", "d", "e"].map(str::to_string);
        let err = validate_options(&options).unwrap_err();
        assert_eq!(err.code, "trivia_option_blank");
        assert_eq!(err.message.as_deref(), Some("Option B must not be blank"));
    }

    #[test]
    fn question_types_out_one_character_every_50ms() {
        let (mut rig, mut game) = started(default_questions());

        rig.run(&mut game, 100);
        assert_eq!(rig.board.lcd_lines(), ("Fr".into(), "Select: A".into()));
        rig.run(&mut game, 200);
        assert_eq!(rig.board.lcd_lines().0, "France");
        assert_eq!(game.phase, Phase::ShowQuestion);

        rig.run(&mut game, 450);
        assert_eq!(rig.board.lcd_lines().0, "France: Capital");
        assert_eq!(game.phase, Phase::WaitForAnswer);
    }

    #[test]
    fn long_prompts_stop_at_sixteen_characters() {
        let long = TriviaQuestion::new(
            "Which planet is the largest?",
            ["Earth", "Mars", "Jupiter", "Saturn", "Neptune"],
            2,
        );
        let (mut rig, mut game) = started(vec![long]);
        rig.run(&mut game, 16 * TYPEWRITER_MS + 10);
        assert_eq!(game.phase, Phase::WaitForAnswer);
        assert_eq!(rig.board.lcd_lines().0, "Which planet is ");
    }

    #[test]
    fn pot_selects_options_a_to_e() {
        let (mut rig, mut game) = started(default_questions());
        rig.run_until(&mut game, 2_000, |g| g.phase == Phase::WaitForAnswer);

        for (index, pot) in OPTION_POTS.into_iter().enumerate() {
            rig.board.set_pot(pot);
            rig.run(&mut game, 20);
            assert_eq!(game.selected, index);
        }
        assert_eq!(rig.board.lcd_lines().1, "E: Lisbon");

        rig.board.set_pot(1023);
        rig.run(&mut game, 20);
        assert_eq!(game.selected, 4);
    }

    #[test]
    fn wrong_answer_shows_feedback_and_costs_first_try() {
        let (mut rig, mut game) = started(default_questions());
        answer(&mut rig, &mut game, 3);
        assert_eq!(game.phase, Phase::Wrong);
        assert_eq!(rig.board.rgb(), Rgb::RED);
        assert_eq!(
            rig.board.lcd_lines(),
            ("Wrong Answer!".into(), "Try Again...".into())
        );
        assert_eq!(rig.board.tones().last().map(|t| t.freq_hz), Some(ERROR_TONE_HZ));

        rig.run(&mut game, WRONG_MS);
        assert_eq!(game.phase, Phase::WaitForAnswer);

        answer(&mut rig, &mut game, 0);
        assert_eq!(game.phase, Phase::Success);
        assert_eq!(rig.board.lcd_lines().0, "Correct!");
        assert_eq!(game.first_try_correct(), 0);
    }

    #[test]
    fn full_quiz_reports_first_try_tally_and_result() {
        let questions = default_questions();
        let count = questions.len();
        let answers: Vec<usize> = questions.iter().map(|q| q.correct).collect();
        let (mut rig, mut game) = started(questions);

        for (index, correct) in answers.into_iter().enumerate() {
            assert_eq!(game.current_question(), index);
            if index == 1 {
                answer(&mut rig, &mut game, (correct + 1) % OPTION_COUNT);
                rig.run(&mut game, WRONG_MS);
            }
            assert_eq!(answer(&mut rig, &mut game, correct), GameStatus::Continue);
            assert_eq!(rig.board.rgb(), Rgb::GREEN);
            rig.run(&mut game, FEEDBACK_MS);
        }

        assert_eq!(game.first_try_correct(), 6);
        assert_eq!(
            rig.board.lcd_lines(),
            ("Ohh, good job!".into(), format!("Good job 6/{count}"))
        );

        let status = rig.run(&mut game, FEEDBACK_MS + 100);
        let GameStatus::Finished(GameOutcome::Completed(result)) = status else {
            panic!("expected completion, got {status:?}");
        };
        assert_eq!(result.game(), GameId::Trivia);
        assert_eq!(result.presses(), 8);
        assert_eq!(result.points(), score(GameId::Trivia, 8, result.time_taken_ms()));
    }

    #[test]
    fn deadline_is_checked_every_poll() {
        let mut rig = Rig::new(1_500);
        let mut game = TriviaGame::new(default_questions(), rig.now);
        let status = rig.run(&mut game, 3_000);
        assert_eq!(status, GameStatus::Finished(GameOutcome::TimedOut));
        assert_eq!(rig.now, 1_500);
        assert_eq!(rig.board.lcd_lines().0, "Time is up!");
    }
}
