//! Game 2: reproduce a hidden eight-note tune on the key module, guided by riddles.

use tracing::{debug, info};

use super::{
    GameOutcome, GameStatus,
    sequencer::{MessageSequencer, Sequence, Stopwatch, Throttle},
};
use crate::{
    Millis,
    hal::{Melody, Rgb, key_led::KEY_COUNT},
    score::{GameId, GameResult},
    state::SessionContext,
};

/// Tune the game ships with.
pub const DEFAULT_TARGET: &str = "48215637";
/// Notes in a tune.
pub const MELODY_LENGTH: usize = 8;
/// Time taken off the session clock for a wrong submission.
pub const WRONG_PENALTY_MS: Millis = 30_000;

/// Pitch of each key, key 1 first.
pub const NOTE_FREQS: [u16; KEY_COUNT as usize] = [261, 293, 329, 349, 392, 440, 493, 523];

/// Riddles for [`DEFAULT_TARGET`], one per note.
const TIPS: [&str; MELODY_LENGTH] = [
    "A quartet awaits",
    "Infinite curve",
    "A pair in tune",
    "The lone melody",
    "Middle of magic",
    "Sixth sense",
    "Triple allure",
    "Lucky final touch",
];

const KEY_DEBOUNCE_MS: Millis = 150;
const NOTE_MS: u32 = 200;
const WRONG_MESSAGE_MS: Millis = 1_000;
const SUCCESS_HOLD_MS: Millis = 2_000;
const INTRO_MS: Millis = 3_000;
const TIME_UP_TONE_HZ: u16 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Intro,
    Play,
    Wrong,
    Complete(GameResult),
    TimeUp,
}

/// Melody memory game state.
#[derive(Debug)]
pub struct MelodyGame {
    target: String,
    input: String,
    attempts: u32,
    last_keys: u8,
    key_gate: Throttle,
    phase: Phase,
    intro: MessageSequencer,
    phase_timer: Stopwatch,
    play_timer: Stopwatch,
}

impl MelodyGame {
    /// New game expecting `target`, starting its intro at `now`.
    pub fn new(target: &str, now: Millis) -> Self {
        Self {
            target: target.to_string(),
            input: String::with_capacity(MELODY_LENGTH),
            attempts: 0,
            last_keys: 0,
            key_gate: Throttle::new(KEY_DEBOUNCE_MS),
            phase: Phase::Intro,
            intro: MessageSequencer::new(&[("Mystery Melody", "Find the tune!")], INTRO_MS, now),
            phase_timer: Stopwatch::start(now),
            play_timer: Stopwatch::start(now),
        }
    }

    /// Digits entered since the last submission.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Wrong submissions so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run one tick.
    pub fn poll(&mut self, ctx: &mut SessionContext) -> GameStatus {
        let now = ctx.now();
        match self.phase {
            Phase::Intro => {
                match self.intro.poll(now) {
                    Sequence::Show(_, line1, line2) => ctx.io.lcd_show(line1, line2),
                    Sequence::Hold(_) => {}
                    Sequence::Done => self.begin_play(ctx),
                }
                GameStatus::Continue
            }
            Phase::Play | Phase::Wrong if ctx.time_expired() => self.time_up(ctx),
            Phase::Play => {
                self.play(ctx);
                GameStatus::Continue
            }
            Phase::Wrong => {
                if self.phase_timer.has_elapsed(now, WRONG_MESSAGE_MS) {
                    ctx.io.set_color(Rgb::BLUE);
                    self.show_tip(ctx);
                    self.phase = Phase::Play;
                }
                GameStatus::Continue
            }
            Phase::Complete(result) if self.phase_timer.has_elapsed(now, SUCCESS_HOLD_MS) => {
                GameStatus::Finished(GameOutcome::Completed(result))
            }
            Phase::Complete(_) => GameStatus::Continue,
            Phase::TimeUp => GameStatus::Finished(GameOutcome::TimedOut),
        }
    }

    fn begin_play(&mut self, ctx: &mut SessionContext) {
        ctx.io.set_color(Rgb::BLUE);
        self.show_tip(ctx);
        self.last_keys = ctx.io.keys();
        self.play_timer.restart(ctx.now());
        self.phase = Phase::Play;
    }

    fn play(&mut self, ctx: &mut SessionContext) {
        let keys = ctx.io.keys();
        ctx.io.set_key_leds(keys);

        let newly_pressed = keys & !self.last_keys;
        self.last_keys = keys;
        if keys.count_ones() == 1 && newly_pressed == keys && self.key_gate.ready(ctx.now()) {
            self.enter_note(ctx, keys.trailing_zeros() as usize);
        }

        if ctx.button_pressed() && !self.input.is_empty() {
            self.submit(ctx);
        }
    }

    fn enter_note(&mut self, ctx: &mut SessionContext, key: usize) {
        ctx.io.play_tone(NOTE_FREQS[key], NOTE_MS);
        if self.input.len() >= MELODY_LENGTH {
            return;
        }
        self.input.push(char::from(b'1' + key as u8));
        debug!(key = key + 1, input = %self.input, "note entered");
        self.show_tip(ctx);
    }

    fn submit(&mut self, ctx: &mut SessionContext) {
        let now = ctx.now();
        if self.input == self.target {
            ctx.io.set_color(Rgb::GREEN);
            ctx.io.play_melody(Melody::Success);
            ctx.io.lcd_show("Correct Tune!", "Well done!");
            let elapsed = self.play_timer.elapsed(now);
            let result = GameResult::new(GameId::Melody, self.attempts, elapsed);
            info!(
                attempts = self.attempts,
                time_ms = result.time_taken_ms(),
                points = result.points(),
                "melody found"
            );
            self.phase_timer.restart(now);
            self.phase = Phase::Complete(result);
            return;
        }

        self.attempts += 1;
        let correct_prefix = self
            .input
            .chars()
            .zip(self.target.chars())
            .take_while(|(entered, expected)| entered == expected)
            .count();
        info!(
            attempts = self.attempts,
            correct_prefix,
            entered = self.input.len(),
            "wrong melody; {WRONG_PENALTY_MS} ms penalty"
        );

        ctx.penalize(WRONG_PENALTY_MS);
        ctx.io.set_color(Rgb::RED);
        ctx.io.play_melody(Melody::Error);
        ctx.io.lcd_show("Wrong Tune!", "Try again!");
        self.input.clear();
        self.phase_timer.restart(now);
        self.phase = Phase::Wrong;
    }

    fn show_tip(&self, ctx: &mut SessionContext) {
        let next = self.input.len();
        if next >= MELODY_LENGTH {
            ctx.io.lcd_show("Tune complete", "Press to check");
        } else if self.target == DEFAULT_TARGET {
            ctx.io.lcd_show(&format!("Tip for note {}", next + 1), TIPS[next]);
        } else {
            ctx.io.lcd_show(&format!("Tip for note {}", next + 1), "Listen closely");
        }
    }

    fn time_up(&mut self, ctx: &mut SessionContext) -> GameStatus {
        info!(attempts = self.attempts, "melody game out of time");
        ctx.io.lcd_show("Time's up!", "Game Over!");
        ctx.io.play_tone(TIME_UP_TONE_HZ, 200);
        ctx.io.set_key_leds(0);
        self.phase = Phase::TimeUp;
        GameStatus::Finished(GameOutcome::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{games::test_support::Rig, score::score};

    fn started(total_time_ms: Millis) -> (Rig, MelodyGame) {
        let mut rig = Rig::new(total_time_ms);
        let mut game = MelodyGame::new(DEFAULT_TARGET, rig.now);
        rig.run(&mut game, INTRO_MS + 100);
        assert_eq!(game.phase, Phase::Play);
        (rig, game)
    }

    fn enter(rig: &mut Rig, game: &mut MelodyGame, digits: &str) {
        for digit in digits.bytes() {
            rig.tap_key(game, digit - b'0');
        }
    }

    #[test]
    fn intro_then_first_tip() {
        let (rig, _game) = started(600_000);
        assert_eq!(
            rig.board.lcd_lines(),
            ("Tip for note 1".into(), "A quartet awaits".into())
        );
        assert_eq!(rig.board.rgb(), Rgb::BLUE);
    }

    #[test]
    fn keys_append_digits_and_play_notes() {
        let (mut rig, mut game) = started(600_000);
        enter(&mut rig, &mut game, "48");

        assert_eq!(game.input(), "48");
        assert_eq!(rig.board.lcd_lines().0, "Tip for note 3");
        let freqs: Vec<u16> = rig.board.tones().iter().map(|t| t.freq_hz).collect();
        assert_eq!(freqs, vec![349, 523]);
    }

    #[test]
    fn key_leds_mirror_held_keys() {
        let (mut rig, mut game) = started(600_000);
        rig.board.set_keys(0b1000_0001);
        rig.run(&mut game, 20);
        assert_eq!(rig.board.key_leds(), 0b1000_0001);
        // Chords are not notes.
        assert_eq!(game.input(), "");

        rig.board.set_keys(0);
        rig.run(&mut game, 20);
        assert_eq!(rig.board.key_leds(), 0);
    }

    #[test]
    fn held_key_counts_once() {
        let (mut rig, mut game) = started(600_000);
        rig.board.set_keys(1 << 2);
        rig.run(&mut game, 1_000);
        assert_eq!(game.input(), "3");
    }

    #[test]
    fn input_is_capped_at_eight_digits() {
        let (mut rig, mut game) = started(600_000);
        enter(&mut rig, &mut game, "1234567812");
        assert_eq!(game.input(), "12345678");
        assert_eq!(rig.board.lcd_lines().0, "Tune complete");
    }

    #[test]
    fn button_without_input_is_ignored() {
        let (mut rig, mut game) = started(600_000);
        rig.press(&mut game);
        assert_eq!(game.attempts(), 0);
        assert_eq!(rig.ctx.clock().penalty(), 0);
    }

    #[test]
    fn correct_tune_completes_with_attempt_count() {
        let (mut rig, mut game) = started(600_000);
        enter(&mut rig, &mut game, DEFAULT_TARGET);
        assert_eq!(rig.press(&mut game), GameStatus::Continue);
        assert_eq!(rig.board.lcd_lines().0, "Correct Tune!");
        assert_eq!(rig.board.rgb(), Rgb::GREEN);

        let status = rig.run(&mut game, SUCCESS_HOLD_MS + 100);
        let GameStatus::Finished(GameOutcome::Completed(result)) = status else {
            panic!("expected completion, got {status:?}");
        };
        assert_eq!(result.game(), GameId::Melody);
        assert_eq!(result.presses(), 0);
        assert_eq!(result.points(), score(GameId::Melody, 0, result.time_taken_ms()));
    }

    #[test]
    fn wrong_tune_costs_exactly_thirty_seconds() {
        let (mut rig, mut game) = started(600_000);
        enter(&mut rig, &mut game, "4821");
        // The session clock started at 0 and has no penalty yet.
        assert_eq!(rig.ctx.clock().elapsed(rig.now), rig.now);

        rig.press(&mut game);
        assert_eq!(game.attempts(), 1);
        assert_eq!(rig.ctx.clock().penalty(), WRONG_PENALTY_MS);
        assert_eq!(rig.ctx.clock().elapsed(rig.now), rig.now + WRONG_PENALTY_MS);
    }

    #[test]
    fn wrong_tune_resets_input_after_message() {
        let (mut rig, mut game) = started(600_000);
        enter(&mut rig, &mut game, "12");
        rig.press(&mut game);

        assert_eq!(game.attempts(), 1);
        assert_eq!(game.input(), "");
        assert_eq!(game.phase, Phase::Wrong);
        assert_eq!(rig.board.lcd_lines(), ("Wrong Tune!".into(), "Try again!".into()));
        assert_eq!(rig.board.rgb(), Rgb::RED);

        rig.run(&mut game, WRONG_MESSAGE_MS);
        assert_eq!(game.phase, Phase::Play);
        assert_eq!(rig.board.rgb(), Rgb::BLUE);
        assert_eq!(rig.board.lcd_lines().0, "Tip for note 1");

        // A second try still succeeds; the miss shows up in the result.
        enter(&mut rig, &mut game, DEFAULT_TARGET);
        rig.press(&mut game);
        let status = rig.run(&mut game, SUCCESS_HOLD_MS + 100);
        assert!(matches!(
            status,
            GameStatus::Finished(GameOutcome::Completed(result)) if result.presses() == 1
        ));
    }

    #[test]
    fn penalties_can_run_the_clock_out() {
        let (mut rig, mut game) = started(40_000);
        enter(&mut rig, &mut game, "1");
        rig.press(&mut game);

        let status = rig.run(&mut game, 10_000);
        assert_eq!(status, GameStatus::Finished(GameOutcome::TimedOut));
        assert_eq!(rig.board.lcd_lines(), ("Time's up!".into(), "Game Over!".into()));
    }

    #[test]
    fn custom_target_hides_the_riddles() {
        let mut rig = Rig::new(600_000);
        let mut game = MelodyGame::new("11111111", rig.now);
        rig.run(&mut game, INTRO_MS + 100);
        assert_eq!(
            rig.board.lcd_lines(),
            ("Tip for note 1".into(), "Listen closely".into())
        );
    }
}
