//! Game 1: crack a three-step vault combination by ear with the potentiometer dial.

use rand::Rng;
use tracing::{debug, info};

use super::{
    GameOutcome, GameStatus,
    sequencer::{Dwell, DwellConfirm, MessageSequencer, Sequence, Stopwatch, Throttle},
};
use crate::{
    Millis,
    hal::{Melody, Rgb, map_range},
    score::{GameId, GameResult},
    state::SessionContext,
};

/// Highest dial value.
pub const DIAL_MAX: i32 = 3600;
/// Combination values are multiples of this.
pub const DIAL_STEP: i32 = 10;
/// Number of values to find.
pub const STEPS: usize = 3;
/// Once armed, a step is kept only while the dial stays this close to the target.
pub const CONFIRMATION_THRESHOLD: i32 = 75;
/// Time the dial must stay in tolerance after the press.
pub const CONFIRMATION_DELAY_MS: Millis = 80;

const FREQ_SEARCH: u16 = 500;
const FREQ_HOVER: u16 = 1000;
const HOVER_MARGIN: i32 = 5;
const HOVER_BEEP_MS: u32 = 100;
const HOVER_INTERVAL_MS: Millis = 500;
const FEEDBACK_TONE_MS: u32 = 50;

const INTRO_INTERVAL_MS: Millis = 3_000;
const STEP_MESSAGE_MS: Millis = 2_000;
const VAULT_OPEN_MS: Millis = 2_000;

const COLOR_START: Rgb = Rgb::new(255, 0, 255);
const COLOR_CLOSE: Rgb = Rgb::new(255, 50, 0);

const INTRO: [(&str, &str); 3] = [
    ("Escape in time", "or rocks hit you"),
    ("Listen carefully", "find the beep"),
    ("When you find it", "press the button"),
];

/// Tolerance and confirmation pitch of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepLevel {
    /// Distance under which the dial counts as on target.
    pub threshold: i32,
    /// Tone played while on target.
    pub tone_hz: u16,
}

/// Steps get tighter and higher-pitched as the vault opens.
pub const LEVELS: [StepLevel; STEPS] = [
    StepLevel {
        threshold: 55,
        tone_hz: 1200,
    },
    StepLevel {
        threshold: 45,
        tone_hz: 1500,
    },
    StepLevel {
        threshold: 35,
        tone_hz: 1800,
    },
];

/// Draw a fresh combination of [`STEPS`] values in `0..=DIAL_MAX`, multiples of [`DIAL_STEP`].
pub fn random_combo<R: Rng + ?Sized>(rng: &mut R) -> [i32; STEPS] {
    std::array::from_fn(|_| rng.random_range(0..=DIAL_MAX / DIAL_STEP) * DIAL_STEP)
}

/// Tone (frequency, duration) guiding the player at `distance` from the target.
///
/// `hover_due` allows the short hover beep when the dial sits just outside the threshold.
pub fn feedback_tone(distance: i32, level: StepLevel, hover_due: bool) -> (u16, u32) {
    if distance < level.threshold {
        return (level.tone_hz, FEEDBACK_TONE_MS);
    }
    if distance < level.threshold + HOVER_MARGIN && hover_due {
        return (FREQ_HOVER, HOVER_BEEP_MS);
    }
    let search = map_range(
        distance.min(DIAL_MAX),
        0,
        DIAL_MAX,
        i32::from(level.tone_hz),
        i32::from(FREQ_SEARCH),
    );
    (search as u16, FEEDBACK_TONE_MS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Intro,
    Play,
    StepDone,
    Complete(GameResult),
    TimeUp,
}

/// Vault dial game state.
#[derive(Debug)]
pub struct CombinationGame {
    combo: [i32; STEPS],
    step: usize,
    phase: Phase,
    intro: MessageSequencer,
    phase_timer: Stopwatch,
    play_timer: Stopwatch,
    confirm: DwellConfirm,
    hover: Throttle,
}

impl CombinationGame {
    /// New game for `combo`, starting its intro at `now`.
    pub fn new(combo: [i32; STEPS], now: Millis) -> Self {
        Self {
            combo,
            step: 0,
            phase: Phase::Intro,
            intro: MessageSequencer::new(&INTRO, INTRO_INTERVAL_MS, now),
            phase_timer: Stopwatch::start(now),
            play_timer: Stopwatch::start(now),
            confirm: DwellConfirm::new(CONFIRMATION_DELAY_MS),
            hover: Throttle::new(HOVER_INTERVAL_MS),
        }
    }

    /// Steps confirmed so far.
    pub fn steps_done(&self) -> usize {
        self.step
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
            Phase::Play | Phase::StepDone if ctx.time_expired() => self.time_up(ctx),
            Phase::Play => {
                self.play(ctx);
                GameStatus::Continue
            }
            Phase::StepDone => {
                if self.phase_timer.has_elapsed(now, STEP_MESSAGE_MS) {
                    self.confirm.reset();
                    self.phase = Phase::Play;
                }
                GameStatus::Continue
            }
            Phase::Complete(result) if self.phase_timer.has_elapsed(now, VAULT_OPEN_MS) => {
                GameStatus::Finished(GameOutcome::Completed(result))
            }
            Phase::Complete(_) => GameStatus::Continue,
            Phase::TimeUp => GameStatus::Finished(GameOutcome::TimedOut),
        }
    }

    fn begin_play(&mut self, ctx: &mut SessionContext) {
        debug!(combo = ?self.combo, "vault combination drawn");
        ctx.io.set_color(COLOR_START);
        ctx.io.lcd_clear();
        self.play_timer.restart(ctx.now());
        self.phase = Phase::Play;
    }

    fn play(&mut self, ctx: &mut SessionContext) {
        let now = ctx.now();
        let level = LEVELS[self.step];
        let dial = ctx.io.pot_mapped(0, DIAL_MAX);
        let distance = (dial - self.combo[self.step]).abs();
        let on_target = distance < level.threshold;

        let hovering = !on_target && distance < level.threshold + HOVER_MARGIN;
        let (freq, duration) = feedback_tone(distance, level, hovering && self.hover.ready(now));
        ctx.io.play_tone(freq, duration);
        // The last step gives no color hint.
        let hint = on_target && self.step + 1 < STEPS;
        ctx.io.set_color(if hint { COLOR_CLOSE } else { Rgb::RED });

        let arm = on_target && ctx.button_pressed();
        match self.confirm.poll(now, arm, distance < CONFIRMATION_THRESHOLD) {
            Dwell::Confirmed => self.confirm_step(ctx),
            Dwell::Aborted => {
                debug!(step = self.step + 1, dial, "dial left tolerance; confirmation dropped")
            }
            Dwell::Idle | Dwell::Holding => {}
        }
    }

    fn confirm_step(&mut self, ctx: &mut SessionContext) {
        let now = ctx.now();
        self.step += 1;
        info!(step = self.step, "combination step confirmed");

        if self.step < STEPS {
            ctx.io
                .lcd_show(&format!("STEP {} OF {STEPS} DONE", self.step), "KEEP GOING");
            self.phase_timer.restart(now);
            self.phase = Phase::StepDone;
            return;
        }

        ctx.io.stop_tone();
        ctx.io.set_color(Rgb::GREEN);
        ctx.io.play_melody(Melody::Success);
        ctx.io.lcd_show("Vault opened!", "Congrats!");

        let result = GameResult::new(
            GameId::Combination,
            ctx.presses().current_game(),
            self.play_timer.elapsed(now),
        );
        info!(
            presses = result.presses(),
            time_ms = result.time_taken_ms(),
            points = result.points(),
            "vault opened"
        );
        self.phase_timer.restart(now);
        self.phase = Phase::Complete(result);
    }

    fn time_up(&mut self, ctx: &mut SessionContext) -> GameStatus {
        info!(steps = self.step, "vault locked: time is up");
        ctx.io.lcd_show("Time is up!", "Vault locked!");
        ctx.io.set_color(Rgb::RED);
        self.phase = Phase::TimeUp;
        GameStatus::Finished(GameOutcome::TimedOut)
    }
}
