//! The console: runs one tick at a time, sequencing the intro, the four games, loading
//! screens and the final win or time-up screen against the shared countdown.

use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::{info, warn};

use super::{
    SessionContext,
    state_machine::{AppEvent, AppPhase, PhaseMachine},
};
use crate::{
    Millis,
    config::{AppConfig, TimingConfig},
    games::{
        ActiveGame, GameOutcome, GameSetup, GameStatus,
        sequencer::{MessageSequencer, Sequence, Stopwatch, Throttle},
    },
    hal::{Hardware, Melody, Rgb},
    score::{GameId, GameResult},
};

const GAME_OVER_REPEAT_MS: Millis = 2_000;
const WIN_BLINK_MS: Millis = 500;
const WIN_MELODY_INTERVAL_MS: Millis = 5_000;
const WIN_CYCLE_MS: Millis = 6_000;
const WIN_MESSAGE_MS: Millis = 5_000;

/// Point-in-time view of a session, for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Active phase.
    pub phase: AppPhase,
    /// Session time used, penalties included.
    pub elapsed_ms: Millis,
    /// Time left before the deadline.
    pub remaining_ms: Millis,
    /// Penalties applied so far.
    pub penalty_ms: Millis,
    /// Presses during any game.
    pub total_presses: u32,
    /// Presses in the current game.
    pub current_game_presses: u32,
    /// Completed games, in play order.
    pub results: Vec<GameResult>,
    /// Points earned so far.
    pub total_score: u32,
}

/// The game console.
pub struct Console {
    machine: PhaseMachine,
    ctx: SessionContext,
    setup: GameSetup,
    timing: TimingConfig,
    restart_on_press: bool,
    game: Option<ActiveGame>,
    results: [Option<GameResult>; GameId::ALL.len()],
    final_score: Option<u32>,
    phase_timer: Stopwatch,
    intro: MessageSequencer,
    screen_painted: bool,
    game_over_repeat: Throttle,
    win_melody_cycle: Option<Millis>,
}

impl Console {
    /// Console running the games described by `config`, booted at `now`.
    pub fn new(config: &AppConfig, hardware: Box<dyn Hardware>, now: Millis) -> Self {
        Self::with_setup(config, GameSetup::from_config(config), hardware, now)
    }

    /// Console with explicit game content.
    pub fn with_setup(
        config: &AppConfig,
        setup: GameSetup,
        hardware: Box<dyn Hardware>,
        now: Millis,
    ) -> Self {
        let timing = config.timing;
        let rng = config
            .rng_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let ctx = SessionContext::new(
            hardware,
            timing.debounce_ms,
            timing.total_time_ms,
            rng,
            now,
        );
        info!(
            total_time_ms = timing.total_time_ms,
            seeded = config.rng_seed.is_some(),
            "console started"
        );

        Self {
            machine: PhaseMachine::new(),
            ctx,
            setup,
            timing,
            restart_on_press: config.restart_on_press,
            game: None,
            results: [None; GameId::ALL.len()],
            final_score: None,
            phase_timer: Stopwatch::start(now),
            intro: intro_sequence(&timing, now),
            screen_painted: false,
            game_over_repeat: Throttle::new(GAME_OVER_REPEAT_MS),
            win_melody_cycle: None,
        }
    }

    /// Active phase.
    pub fn phase(&self) -> AppPhase {
        self.machine.phase()
    }

    /// Completed games, in play order.
    pub fn results(&self) -> Vec<GameResult> {
        self.results.iter().flatten().copied().collect()
    }

    /// Final score, available once the session is won.
    pub fn total_score(&self) -> Option<u32> {
        self.final_score
    }

    /// Session counters and results.
    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.ctx.now();
        let clock = self.ctx.clock();
        let results = self.results();
        SessionSnapshot {
            phase: self.phase(),
            elapsed_ms: clock.elapsed(now),
            remaining_ms: clock.remaining(now),
            penalty_ms: clock.penalty(),
            total_presses: self.ctx.presses().total(),
            current_game_presses: self.ctx.presses().current_game(),
            total_score: results.iter().map(GameResult::points).sum(),
            results,
        }
    }

    /// Run one tick at `now` and return the phase afterwards.
    pub fn tick(&mut self, now: Millis) -> AppPhase {
        let pressed = self.ctx.begin_tick(now);
        let phase = self.machine.phase();

        if phase != AppPhase::GameWon {
            let clock = *self.ctx.clock();
            let counter = self.ctx.presses().current_game();
            self.ctx
                .io
                .display_time(clock.elapsed(now), clock.total(), counter);
        }

        if pressed && phase.is_game() {
            self.ctx.record_press();
        }

        if !phase.is_terminal()
            && self.ctx.clock().remaining(now) <= self.timing.time_up_warning_ms
        {
            self.apply(AppEvent::DeadlineReached);
        }

        match self.machine.phase() {
            AppPhase::Intro => self.run_intro(),
            AppPhase::Game(id) => self.run_game(id),
            AppPhase::Loading(id) => self.run_loading(id),
            AppPhase::TimeUp => self.run_time_up(pressed),
            AppPhase::GameWon => self.run_game_won(pressed),
        }

        self.ctx.io.poll_buzzer();
        self.machine.phase()
    }

    fn apply(&mut self, event: AppEvent) {
        let from = self.machine.phase();
        match self.machine.apply(event) {
            Ok(to) => {
                info!(%from, %to, ?event, "phase transition");
                self.enter(to);
            }
            Err(err) => warn!(error = %err, "ignoring phase event"),
        }
    }

    fn enter(&mut self, phase: AppPhase) {
        let now = self.ctx.now();
        self.phase_timer.restart(now);
        self.screen_painted = false;

        match phase {
            AppPhase::Intro => {
                self.ctx.restart();
                self.ctx.io.stop_tone();
                self.ctx.io.set_color(Rgb::OFF);
                self.ctx.io.set_key_leds(0);
                self.results = [None; GameId::ALL.len()];
                self.final_score = None;
                self.game = None;
                self.intro = intro_sequence(&self.timing, now);
            }
            AppPhase::Game(id) => {
                self.ctx.reset_game_presses();
                self.game = Some(self.setup.build(id, &mut self.ctx));
            }
            AppPhase::Loading(_) => {
                self.ctx.reset_game_presses();
                self.game = None;
            }
            AppPhase::TimeUp => {
                self.game = None;
                self.ctx.io.stop_tone();
                self.ctx.io.set_key_leds(0);
                self.game_over_repeat.reset();
                info!(
                    total_presses = self.ctx.presses().total(),
                    games_completed = self.results.iter().flatten().count(),
                    "session lost: time is up"
                );
            }
            AppPhase::GameWon => {
                self.game = None;
                self.win_melody_cycle = None;
                self.ctx.io.set_key_leds(0);
                self.ctx.io.lcd_clear();
                self.aggregate_score();
            }
        }
    }

    fn aggregate_score(&mut self) -> u32 {
        if let Some(total) = self.final_score {
            return total;
        }
        let total = self.results.iter().flatten().map(GameResult::points).sum();
        self.final_score = Some(total);
        info!(
            total_presses = self.ctx.presses().total(),
            total_score = total,
            "game won"
        );
        total
    }

    fn run_intro(&mut self) {
        match self.intro.poll(self.ctx.now()) {
            Sequence::Show(_, line1, line2) => self.ctx.io.lcd_show(line1, line2),
            Sequence::Hold(_) => {}
            Sequence::Done => self.apply(AppEvent::IntroFinished),
        }
    }

    fn run_game(&mut self, id: GameId) {
        let status = match self.game.as_mut() {
            Some(game) => game.poll(&mut self.ctx),
            None => {
                warn!(game = %id, "no active game instance; rebuilding");
                self.game = Some(self.setup.build(id, &mut self.ctx));
                return;
            }
        };

        match status {
            GameStatus::Continue => {}
            GameStatus::Finished(GameOutcome::Completed(result)) => {
                info!(
                    game = %result.game(),
                    presses = result.presses(),
                    time_ms = result.time_taken_ms(),
                    points = result.points(),
                    "game completed"
                );
                self.results[result.game().index()] = Some(result);
                let deadline_passed = self.ctx.time_expired();
                self.apply(AppEvent::GameCompleted { deadline_passed });
            }
            GameStatus::Finished(GameOutcome::TimedOut) => {
                info!(game = %id, "game ran out of time");
                self.apply(AppEvent::GameTimedOut);
            }
        }
    }

    fn run_loading(&mut self, finished: GameId) {
        let elapsed = self.phase_timer.elapsed(self.ctx.now());
        if elapsed >= self.timing.loading_ms {
            self.apply(AppEvent::LoadingFinished);
            return;
        }
        if !self.screen_painted {
            let next = finished.number() + 1;
            self.ctx
                .io
                .lcd_show(&format!("Game {next} Loading"), "Loading...");
            self.screen_painted = true;
        }
        self.ctx.io.loading_animation(elapsed);
    }

    fn run_time_up(&mut self, pressed: bool) {
        if pressed && self.restart_on_press {
            self.apply(AppEvent::Restart);
            return;
        }
        self.ctx.io.set_color(Rgb::RED);
        if !self.screen_painted {
            self.ctx.io.lcd_show("You are forever", "Lost...");
            self.screen_painted = true;
        }
        if self.game_over_repeat.ready(self.ctx.now()) {
            self.ctx.io.play_melody(Melody::GameOver);
        }
    }

    fn run_game_won(&mut self, pressed: bool) {
        if pressed && self.restart_on_press {
            self.apply(AppEvent::Restart);
            return;
        }
        let elapsed = self.phase_timer.elapsed(self.ctx.now());

        let blink_on = (elapsed / WIN_BLINK_MS) % 2 == 0;
        self.ctx
            .io
            .set_color(if blink_on { Rgb::GREEN } else { Rgb::OFF });

        let melody_cycle = elapsed / WIN_MELODY_INTERVAL_MS;
        if self.win_melody_cycle != Some(melody_cycle) {
            self.win_melody_cycle = Some(melody_cycle);
            self.ctx.io.play_melody(Melody::Success);
        }

        if elapsed % WIN_CYCLE_MS < WIN_MESSAGE_MS {
            self.ctx.io.lcd_update("GAME WON!", "Congratulations!");
        } else {
            let presses = self.ctx.presses().total();
            let points = self.aggregate_score();
            self.ctx
                .io
                .lcd_update(&format!("BTN:{presses}"), &format!("PTS:{points}"));
        }
    }
}

fn intro_sequence(timing: &TimingConfig, now: Millis) -> MessageSequencer {
    let minutes = timing.total_time_ms / 60_000;
    let length = if minutes > 0 {
        format!("with {minutes}m timer...")
    } else {
        format!("with {}s timer...", timing.total_time_ms / 1_000)
    };
    MessageSequencer::new(
        &[
            ("New Adventure", "has begun!"),
            ("Have Fun", "Good Luck!"),
            ("Starting Games", length.as_str()),
        ],
        timing.intro_interval_ms,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        games::trivia::TriviaQuestion,
        hal::{ColorPalette, SimulatedHardware},
        score::score,
    };

    const TICK_MS: Millis = 10;

    struct Driver {
        board: SimulatedHardware,
        console: Console,
        now: Millis,
    }

    impl Driver {
        fn new(config: AppConfig) -> Self {
            Self::with_setup(config.clone(), GameSetup::from_config(&config))
        }

        fn with_setup(config: AppConfig, setup: GameSetup) -> Self {
            let board = SimulatedHardware::new();
            let console = Console::with_setup(&config, setup, Box::new(board.clone()), 0);
            Self {
                board,
                console,
                now: 0,
            }
        }

        fn run(&mut self, ms: Millis) -> AppPhase {
            for _ in 0..ms / TICK_MS {
                self.now += TICK_MS;
                self.console.tick(self.now);
            }
            self.console.phase()
        }

        fn run_until(&mut self, phase: AppPhase, limit_ms: Millis) {
            for _ in 0..limit_ms / TICK_MS {
                if self.console.phase() == phase {
                    return;
                }
                self.run(TICK_MS);
            }
            assert_eq!(self.console.phase(), phase, "phase not reached at {}", self.now);
        }

        fn press(&mut self) {
            self.board.set_button(true);
            self.run(100);
            self.board.set_button(false);
            self.run(100);
        }

        fn tap_key(&mut self, key: u8) {
            self.board.set_keys(1 << (key - 1));
            self.run(30);
            self.board.set_keys(0);
            self.run(200);
        }
    }

    fn config(total_time_ms: Millis) -> AppConfig {
        let mut config = AppConfig::default();
        config.timing.total_time_ms = total_time_ms;
        config.rng_seed = Some(7);
        config
    }

    #[test]
    fn intro_shows_three_messages_then_starts_game_one() {
        let mut driver = Driver::new(config(600_000));

        driver.run(10);
        assert_eq!(
            driver.board.lcd_lines(),
            ("New Adventure".into(), "has begun!".into())
        );
        driver.run(2_000);
        assert_eq!(driver.board.lcd_lines().0, "Have Fun");
        driver.run(2_000);
        assert_eq!(
            driver.board.lcd_lines(),
            ("Starting Games".into(), "with 10m timer..".into())
        );

        assert_eq!(driver.run(5_990 - driver.now), AppPhase::Intro);
        assert_eq!(driver.run(10), AppPhase::Game(GameId::Combination));
    }

    #[test]
    fn timer_display_counts_down() {
        let mut driver = Driver::new(config(600_000));
        driver.run(1_000);
        assert_eq!(driver.board.segments(), "09.59   0");
        driver.run(60_000);
        assert_eq!(driver.board.segments(), "08.59   0");
    }

    #[test]
    fn presses_are_only_counted_during_games() {
        let mut driver = Driver::new(config(600_000));
        driver.press();
        assert_eq!(driver.console.snapshot().total_presses, 0);

        driver.run_until(AppPhase::Game(GameId::Combination), 7_000);
        driver.press();
        driver.press();
        let snapshot = driver.console.snapshot();
        assert_eq!(snapshot.total_presses, 2);
        assert_eq!(snapshot.current_game_presses, 2);
        driver.run(20);
        assert!(driver.board.segments().ends_with('2'));
    }

    #[test]
    fn deadline_forces_time_up_within_one_tick() {
        let mut driver = Driver::new(config(20_000));
        driver.run_until(AppPhase::Game(GameId::Combination), 7_000);

        // Warning threshold is 1 s: the session is lost once 19 s have elapsed.
        assert_eq!(driver.run(18_990 - driver.now), AppPhase::Game(GameId::Combination));
        assert_eq!(driver.run(10), AppPhase::TimeUp);

        driver.run(10);
        assert_eq!(
            driver.board.lcd_lines(),
            ("You are forever".into(), "Lost...".into())
        );
        assert_eq!(driver.board.rgb(), Rgb::RED);
        assert_eq!(driver.board.tones().last().map(|t| t.freq_hz), Some(523));
    }

    #[test]
    fn deadline_applies_during_intro_too() {
        let mut driver = Driver::new(config(5_000));
        assert_eq!(driver.run(3_990), AppPhase::Intro);
        assert_eq!(driver.run(10), AppPhase::TimeUp);
    }

    #[test]
    fn time_up_repeats_game_over_melody_and_ignores_presses() {
        let mut driver = Driver::new(config(5_000));
        driver.run(4_000);
        driver.run(GAME_OVER_REPEAT_MS * 2);
        let starts = driver
            .board
            .tones()
            .iter()
            .filter(|tone| tone.freq_hz == 523)
            .count();
        assert!(starts >= 2, "game over melody started {starts} times");

        driver.press();
        assert_eq!(driver.console.phase(), AppPhase::TimeUp);
    }

    #[test]
    fn press_restarts_a_finished_session_when_enabled() {
        let mut config = config(5_000);
        config.restart_on_press = true;
        let mut driver = Driver::new(config);
        driver.run(4_000);
        assert_eq!(driver.console.phase(), AppPhase::TimeUp);

        driver.press();
        assert_eq!(driver.console.phase(), AppPhase::Intro);
        let snapshot = driver.console.snapshot();
        assert!(snapshot.elapsed_ms < 200);
        assert_eq!(snapshot.total_presses, 0);
        assert_eq!(driver.board.lcd_lines().0, "New Adventure");
        assert_eq!(driver.board.rgb(), Rgb::OFF);

        // The game-over melody is cut off instead of playing into the new intro.
        let tones = driver.board.tones().len();
        driver.run(1_000);
        assert_eq!(driver.console.phase(), AppPhase::Intro);
        assert_eq!(driver.board.tones().len(), tones);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut driver = Driver::new(config(600_000));
        driver.run(100);
        let json = serde_json::to_value(driver.console.snapshot()).unwrap();
        assert_eq!(json["total_presses"], 0);
        assert_eq!(json["remaining_ms"], 599_900);
        assert_eq!(json["phase"]["phase"], "intro");
    }

    /// Content every game accepts with the pot at zero and minimal key input.
    fn easy_setup() -> GameSetup {
        GameSetup {
            combination: Some([0, 0, 0]),
            melody_target: "11111111".into(),
            palette: ColorPalette::new(vec![vec![Rgb::OFF]]),
            questions: vec![TriviaQuestion::new(
                "Pick A",
                ["yes", "no", "no", "no", "no"],
                0,
            )],
        }
    }

    #[test]
    fn full_session_is_won_and_scored_once() {
        let mut driver = Driver::with_setup(config(600_000), easy_setup());

        driver.run_until(AppPhase::Game(GameId::Combination), 7_000);
        driver.run(9_100);
        for _ in 0..3 {
            driver.press();
            driver.run(2_100);
        }
        driver.run_until(AppPhase::Loading(GameId::Combination), 3_000);
        driver.run(10);
        assert_eq!(
            driver.board.lcd_lines(),
            ("Game 2 Loading".into(), "Loading...".into())
        );

        driver.run_until(AppPhase::Game(GameId::Melody), 4_000);
        assert_eq!(driver.console.snapshot().current_game_presses, 0);
        driver.run(3_100);
        for _ in 0..8 {
            driver.tap_key(1);
        }
        driver.press();
        driver.run_until(AppPhase::Loading(GameId::Melody), 3_000);

        driver.run_until(AppPhase::Game(GameId::ColorMatch), 4_000);
        driver.run(6_100);
        for _ in 0..3 {
            driver.press();
            driver.run(300);
            driver.press();
            driver.run(2_100);
        }
        driver.run_until(AppPhase::Loading(GameId::ColorMatch), 4_000);

        driver.run_until(AppPhase::Game(GameId::Trivia), 4_000);
        driver.run(3_000);
        driver.press();
        driver.run_until(AppPhase::GameWon, 5_000);

        let results = driver.console.results();
        assert_eq!(results.len(), 4);
        assert_eq!(results[1].presses(), 0);
        let expected: u32 = results.iter().map(GameResult::points).sum();
        assert_eq!(driver.console.total_score(), Some(expected));
        assert_eq!(
            results[0].points(),
            score(GameId::Combination, results[0].presses(), results[0].time_taken_ms())
        );

        driver.run(10);
        assert_eq!(
            driver.board.lcd_lines(),
            ("GAME WON!".into(), "Congratulations!".into())
        );
        assert_eq!(driver.board.rgb(), Rgb::GREEN);

        driver.run(WIN_MESSAGE_MS);
        let presses = driver.console.snapshot().total_presses;
        assert_eq!(presses, 3 + 1 + 6 + 1);
        assert_eq!(
            driver.board.lcd_lines(),
            (format!("BTN:{presses}"), format!("PTS:{expected}"))
        );

        // More ticks never re-aggregate or leave the terminal phase.
        assert_eq!(driver.run(20_000), AppPhase::GameWon);
        assert_eq!(driver.console.total_score(), Some(expected));
    }
}
