//! Endless Elevator headless runner
//!
//! Plays one autopilot run and prints the final stats as JSON.
//!
//! Usage: `endless-elevator [seed] [tuning.json] [seconds]`

use std::process::ExitCode;

use endless_elevator::consts::*;
use endless_elevator::sim::{GamePhase, GameState, TickInput, tick};
use endless_elevator::{HighScoreStore, MemoryHighScore, SimResult, Tuning};

/// Frame time the runner pretends to render at
const FRAME_DT: f32 = 1.0 / 30.0;
const DEFAULT_SECONDS: f32 = 120.0;

struct Runner {
    state: GameState,
    accumulator: f32,
    input: TickInput,
}

impl Runner {
    fn new(seed: u64, tuning: Tuning, high_score: u64) -> SimResult<Self> {
        let mut state = GameState::new(seed, tuning, high_score)?;
        state.start();
        Ok(Self {
            state,
            accumulator: 0.0,
            input: TickInput {
                autopilot: true,
                ..Default::default()
            },
        })
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.jump = false;
            self.input.dash = None;
            self.input.pause = false;
        }
    }
}

fn load_tuning(path: Option<&str>) -> SimResult<Tuning> {
    match path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Tuning::from_json(&json),
            Err(e) => {
                log::warn!("Could not read tuning file {}: {}, using defaults", path, e);
                Ok(Tuning::default())
            }
        },
        None => Ok(Tuning::default()),
    }
}

fn run() -> SimResult<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = args
        .first()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x00E1_E7A7);
    let tuning = load_tuning(args.get(1).map(String::as_str))?;
    let seconds = args
        .get(2)
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_SECONDS);

    let mut store = MemoryHighScore::default();
    let mut runner = Runner::new(seed, tuning, store.best())?;
    log::info!("Endless Elevator (headless) seed {} for {:.0}s", seed, seconds);

    let frames = (seconds / FRAME_DT).ceil() as u32;
    for _ in 0..frames {
        runner.update(FRAME_DT);
        if runner.state.phase == GamePhase::GameOver {
            break;
        }
    }

    runner.state.end_game(&mut store);
    match serde_json::to_string_pretty(&runner.state.stats) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not serialize stats: {}", e),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
