//! Game 3: memorize a color on the status LED, then mix it back channel by channel.

use tracing::{debug, info};

use super::{
    GameOutcome, GameStatus,
    sequencer::{MessageSequencer, Sequence, Stopwatch, Throttle},
};
use crate::{
    Millis,
    hal::{ColorPalette, Melody, POT_MAX, Rgb, map_range},
    score::{GameId, GameResult},
    state::SessionContext,
};

/// Levels to clear.
pub const LEVELS: u8 = 3;
/// Largest per-channel difference accepted as a match.
pub const COLOR_TOLERANCE: u8 = 15;
/// Channel increment selected by each potentiometer step.
pub const CHANNEL_STEP: i32 = 32;
const POT_STEPS: i32 = 9;

const INTRO_INTERVAL_MS: Millis = 2_000;
const MEMORIZE_INTERVAL_MS: Millis = 2_000;
const KEY_LOCKOUT_MS: Millis = 200;
const LCD_REFRESH_MS: Millis = 500;
const LEVEL_SUCCESS_MS: Millis = 2_000;
const FINAL_SUCCESS_MS: Millis = 3_000;
const FAIL_MS: Millis = 2_000;

const INTRO: [(&str, &str); 3] = [
    ("Welcome to Game3", "Level: 1"),
    ("Get ready...", "Colors incoming"),
    ("Look closely", "be an artist!"),
];
const MEMORIZE: [(&str, &str); 2] = [("Memorize this", "color!"), ("Press btn when", "ready")];

const SUCCESS_COLOR: Rgb = Rgb::new(0, 224, 0);
const FAIL_COLOR: Rgb = Rgb::new(224, 0, 0);

const KEY_RED: u8 = 0x01;
const KEY_GREEN: u8 = 0x02;
const KEY_BLUE: u8 = 0x04;
const KEY_RESET: u8 = 0x80;

/// Whether `guess` is close enough to `target` on every channel.
pub fn guess_matches(target: Rgb, guess: Rgb) -> bool {
    target.r.abs_diff(guess.r) <= COLOR_TOLERANCE
        && target.g.abs_diff(guess.g) <= COLOR_TOLERANCE
        && target.b.abs_diff(guess.b) <= COLOR_TOLERANCE
}

/// Channel value selected by a raw potentiometer reading, quantized to [`CHANNEL_STEP`].
pub fn channel_value(pot: u16) -> u8 {
    let step = map_range(i32::from(pot.min(POT_MAX)), 0, i32::from(POT_MAX), 0, POT_STEPS);
    (step * CHANNEL_STEP).clamp(0, i32::from(u8::MAX)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Red,
    Green,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Intro,
    ShowColor,
    UserGuess,
    Validate,
    Success,
    Fail,
    Complete(GameResult),
    TimeUp,
}

/// Color matching game state.
#[derive(Debug)]
pub struct ColorMatchGame {
    palette: ColorPalette,
    level: u8,
    target: Rgb,
    guess: Rgb,
    channel: Channel,
    phase: Phase,
    messages: MessageSequencer,
    phase_timer: Stopwatch,
    play_timer: Stopwatch,
    key_lock: Stopwatch,
    lcd_refresh: Throttle,
}

impl ColorMatchGame {
    /// New game drawing its targets from `palette`, starting its intro at `now`.
    pub fn new(palette: ColorPalette, now: Millis) -> Self {
        Self {
            palette,
            level: 1,
            target: Rgb::OFF,
            guess: Rgb::OFF,
            channel: Channel::Red,
            phase: Phase::Intro,
            messages: MessageSequencer::new(&INTRO, INTRO_INTERVAL_MS, now),
            phase_timer: Stopwatch::start(now),
            play_timer: Stopwatch::start(now),
            key_lock: Stopwatch::start(now),
            lcd_refresh: Throttle::new(LCD_REFRESH_MS),
        }
    }

    /// Current level, starting at 1.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Color being dialled in.
    pub fn guess(&self) -> Rgb {
        self.guess
    }

    /// Run one tick.
    pub fn poll(&mut self, ctx: &mut SessionContext) -> GameStatus {
        let now = ctx.now();
        match self.phase {
            Phase::Intro => {
                match self.messages.poll(now) {
                    Sequence::Show(_, line1, line2) => ctx.io.lcd_show(line1, line2),
                    Sequence::Hold(_) => {}
                    Sequence::Done => {
                        self.play_timer.restart(now);
                        self.show_new_target(ctx);
                    }
                }
                GameStatus::Continue
            }
            Phase::Complete(result) if self.phase_timer.has_elapsed(now, FINAL_SUCCESS_MS) => {
                GameStatus::Finished(GameOutcome::Completed(result))
            }
            Phase::Complete(_) => GameStatus::Continue,
            Phase::TimeUp => GameStatus::Finished(GameOutcome::TimedOut),
            _ if ctx.time_expired() => self.time_up(ctx),
            Phase::ShowColor => {
                self.show_color(ctx);
                GameStatus::Continue
            }
            Phase::UserGuess => {
                self.user_guess(ctx);
                GameStatus::Continue
            }
            Phase::Validate => {
                self.validate(ctx);
                GameStatus::Continue
            }
            Phase::Success => {
                if self.phase_timer.has_elapsed(now, LEVEL_SUCCESS_MS) {
                    self.level += 1;
                    info!(level = self.level, "advancing to next color level");
                    self.show_new_target(ctx);
                }
                GameStatus::Continue
            }
            Phase::Fail => {
                if self.phase_timer.has_elapsed(now, FAIL_MS) {
                    self.level = 1;
                    info!("color game restarting at level 1");
                    self.show_new_target(ctx);
                }
                GameStatus::Continue
            }
        }
    }

    fn show_new_target(&mut self, ctx: &mut SessionContext) {
        self.target = self.palette.random_color(self.level, &mut ctx.rng);
        debug!(
            level = self.level,
            r = self.target.r,
            g = self.target.g,
            b = self.target.b,
            "color to match"
        );
        self.guess = Rgb::OFF;
        self.channel = Channel::Red;
        self.messages = MessageSequencer::new(&MEMORIZE, MEMORIZE_INTERVAL_MS, ctx.now());
        self.phase = Phase::ShowColor;
    }

    fn show_color(&mut self, ctx: &mut SessionContext) {
        let now = ctx.now();
        ctx.io.set_color(self.target);
        let window_over = match self.messages.poll(now) {
            Sequence::Show(_, line1, line2) => {
                ctx.io.lcd_show(line1, line2);
                false
            }
            Sequence::Hold(_) => false,
            Sequence::Done => true,
        };
        if window_over || ctx.button_pressed() {
            ctx.io.set_color(Rgb::OFF);
            self.key_lock.restart(now);
            self.lcd_refresh.reset();
            self.phase = Phase::UserGuess;
        }
    }

    fn user_guess(&mut self, ctx: &mut SessionContext) {
        let now = ctx.now();
        let keys = ctx.io.keys();
        if keys != 0 && self.key_lock.has_elapsed(now, KEY_LOCKOUT_MS) {
            if keys & KEY_RESET != 0 {
                self.guess = Rgb::OFF;
                self.channel = Channel::Red;
            } else if keys & KEY_RED != 0 {
                self.channel = Channel::Red;
            } else if keys & KEY_GREEN != 0 {
                self.channel = Channel::Green;
            } else if keys & KEY_BLUE != 0 {
                self.channel = Channel::Blue;
            }
            self.key_lock.restart(now);
        }

        let value = channel_value(ctx.io.pot_value());
        match self.channel {
            Channel::Red => self.guess.r = value,
            Channel::Green => self.guess.g = value,
            Channel::Blue => self.guess.b = value,
        }
        ctx.io.set_color(self.guess);

        if self.lcd_refresh.ready(now) {
            let line1 = format!("Lv:{} R:{:03}", self.level, self.guess.r);
            let line2 = format!("G:{:03} B:{:03}", self.guess.g, self.guess.b);
            ctx.io.lcd_update(&line1, &line2);
        }

        if ctx.button_pressed() {
            self.phase = Phase::Validate;
        }
    }

    fn validate(&mut self, ctx: &mut SessionContext) {
        let now = ctx.now();
        let (target, guess) = (self.target, self.guess);
        debug!(
            level = self.level,
            guess_r = guess.r,
            guess_g = guess.g,
            guess_b = guess.b,
            "guess submitted"
        );
        self.phase_timer.restart(now);

        if !guess_matches(target, guess) {
            info!(level = self.level, "wrong color");
            ctx.io.set_color(FAIL_COLOR);
            ctx.io.play_melody(Melody::Error);
            ctx.io.lcd_show("Wrong color!", "Restarting...");
            self.phase = Phase::Fail;
            return;
        }

        ctx.io.set_color(SUCCESS_COLOR);
        ctx.io.play_melody(Melody::Success);
        if self.level < LEVELS {
            ctx.io.lcd_show("Good job!", "Next Level...");
            self.phase = Phase::Success;
            return;
        }

        ctx.io.lcd_show("Final Level", "Complete!");
        let result = GameResult::new(
            GameId::ColorMatch,
            ctx.presses().current_game(),
            self.play_timer.elapsed(now),
        );
        info!(
            presses = result.presses(),
            time_ms = result.time_taken_ms(),
            points = result.points(),
            "final color level complete"
        );
        self.phase = Phase::Complete(result);
    }

    fn time_up(&mut self, ctx: &mut SessionContext) -> GameStatus {
        info!(level = self.level, "color game out of time");
        ctx.io.set_color(Rgb::RED);
        ctx.io.lcd_show("Time is up!", "Colors faded...");
        self.phase = Phase::TimeUp;
        GameStatus::Finished(GameOutcome::TimedOut)
    }
}
