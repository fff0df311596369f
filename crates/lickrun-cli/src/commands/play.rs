//! Interactive terminal session.
//!
//! The frame loop and stdin share one current-thread runtime: a 16ms
//! interval drives `SessionController::tick`, and every line read from stdin
//! (i.e. each Enter press) toggles licking. EOF abandons the session.

use std::io::Write;
use std::time::{Duration, Instant};

use clap::Args;
use lickrun_core::{
    ActionInput, Config, GameEvent, Leaderboard, LeaderboardEntry, Player, RandomSource,
    SeededRandom, SessionController, SessionState, ThreadRandom,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::render;
use crate::PresetArg;

const FRAME_MS: u64 = 16;

#[derive(Args)]
pub struct PlayArgs {
    /// Player name shown on the leaderboard
    name: String,
    /// Optional contact email
    #[arg(long)]
    email: Option<String>,
    /// Use a timing preset instead of the configured game settings
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,
    /// Seed the threat scheduler for a reproducible session
    #[arg(long)]
    seed: Option<u64>,
    /// Don't record a win on the leaderboard
    #[arg(long)]
    no_record: bool,
}

pub fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let game = config.game_config(args.preset.map(Into::into));
    let rng: Box<dyn RandomSource> = match args.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    };
    let mut controller = SessionController::with_random(game, rng)?;

    let mut player = Player::new(args.name);
    if let Some(email) = args.email {
        player = player.with_email(email);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let entry = runtime.block_on(play_session(&mut controller, player))?;

    match entry {
        Some(entry) if !args.no_record => {
            let board = Leaderboard::open(config.leaderboard.max_entries)?;
            match board.record(&entry)? {
                Some(rank) => println!("New leaderboard entry at #{rank}!"),
                None => println!("Not fast enough for the leaderboard this time."),
            }
        }
        Some(_) => info!("win not recorded (--no-record)"),
        None => {}
    }
    Ok(())
}

async fn play_session(
    controller: &mut SessionController,
    player: Player,
) -> Result<Option<LeaderboardEntry>, Box<dyn std::error::Error>> {
    let origin = Instant::now();
    let now_ms = || origin.elapsed().as_millis() as u64;

    let mut input = ActionInput::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frames = tokio::time::interval(Duration::from_millis(FRAME_MS));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut view = View::default();
    view.show(controller.start(player, now_ms())?);

    while controller.state() != SessionState::Ended {
        tokio::select! {
            _ = frames.tick() => {
                view.show(controller.tick(now_ms()));
            }
            line = lines.next_line() => {
                match line? {
                    Some(_) => {
                        if let Some(intent) = input.toggle(controller.state()) {
                            view.show(controller.apply(intent, now_ms()));
                        }
                    }
                    None => {
                        debug!("stdin closed");
                        view.show(controller.reset());
                        return Ok(None);
                    }
                }
            }
        }
    }
    input.clear();
    Ok(view.record)
}

/// Terminal output state: the last status line shown and a pending win.
#[derive(Default)]
struct View {
    remaining_ms: u64,
    percent: f64,
    shown_secs: Option<u64>,
    record: Option<LeaderboardEntry>,
}

impl View {
    fn show(&mut self, events: Vec<GameEvent>) {
        for event in events {
            match &event {
                GameEvent::TimeChanged { remaining_ms } => self.remaining_ms = *remaining_ms,
                GameEvent::ProgressChanged { percent } => self.percent = *percent,
                GameEvent::LeaderboardRecord { entry } => self.record = Some(entry.clone()),
                _ => {}
            }
            if let Some(line) = render::event_line(&event) {
                println!("{line}");
            }
        }

        let secs = self.remaining_ms / 1000;
        if self.remaining_ms > 0 && self.shown_secs != Some(secs) {
            self.shown_secs = Some(secs);
            println!("{}", render::status_line(self.remaining_ms, self.percent));
        }
        let _ = std::io::stdout().flush();
    }
}
