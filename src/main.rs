/// Entry point and game loop.
///
/// `slopeland`               play in the terminal
/// `slopeland --headless N`  simulate N frames with scripted input, no terminal

use std::error::Error;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};

use slopeland::config::GameConfig;
use slopeland::domain::object::{FrameEvent, FrameInput, GameObject};
use slopeland::sim::event::GameEvent;
use slopeland::sim::level::{load_levels, LevelDef};
use slopeland::sim::stage::Stage;
use slopeland::ui::input::InputState;
use slopeland::ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const DEFAULT_HEADLESS_FRAMES: u64 = 600;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = GameConfig::load();
    let levels = load_levels(&config.levels_dir);
    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = match headless_frames(&args) {
        Some(frames) => run_headless(&levels, &config, frames),
        None => run_terminal(&levels, &config),
    };

    if let Err(e) = result {
        eprintln!("Game error: {e}");
        std::process::exit(1);
    }
}

fn headless_frames(args: &[String]) -> Option<u64> {
    let pos = args.iter().position(|a| a == "--headless")?;
    let frames = match args.get(pos + 1).map(|n| n.parse::<u64>()) {
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            log::warn!("invalid frame count for --headless, using {DEFAULT_HEADLESS_FRAMES}");
            DEFAULT_HEADLESS_FRAMES
        }
        None => DEFAULT_HEADLESS_FRAMES,
    };
    Some(frames)
}

// ══════════════════════════════════════════════════════════════
// Terminal
// ══════════════════════════════════════════════════════════════

fn run_terminal(levels: &[LevelDef], config: &GameConfig) -> Result<(), Box<dyn Error>> {
    let mut renderer = Renderer::new();
    renderer.init()?;

    let mut input = InputState::new();
    if terminal::supports_keyboard_enhancement().unwrap_or(false) {
        let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        if execute!(std::io::stdout(), PushKeyboardEnhancementFlags(flags)).is_ok() {
            input.honor_release = true;
        }
    }

    let result = game_loop(levels, config, &mut renderer, &mut input);

    if input.honor_release {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result
}

fn game_loop(
    levels: &[LevelDef],
    config: &GameConfig,
    renderer: &mut Renderer,
    input: &mut InputState,
) -> Result<(), Box<dyn Error>> {
    let first = levels.first().ok_or("no levels available")?;
    let mut level_idx = 0;
    let mut stage = Stage::load(first, config)?;
    renderer.show_message(stage.name.clone());

    let frame_time = Duration::from_millis(config.timing.frame_ms);
    let mut last_step = Instant::now();
    let mut pending = FrameInput::default();

    loop {
        input.drain_events();
        if input.quit_requested() {
            break;
        }
        // Presses between two steps must not be lost.
        let now_input = input.frame_input();
        pending.jump_pressed |= now_input.jump_pressed;
        pending.fire_pressed |= now_input.fire_pressed;
        pending.switch_pressed |= now_input.switch_pressed;

        let elapsed = last_step.elapsed();
        if elapsed >= frame_time {
            last_step = Instant::now();
            let tick = config.timing.tick_for(elapsed.as_secs_f32() * 1000.0);
            let frame_input = FrameInput {
                jump_pressed: pending.jump_pressed,
                fire_pressed: pending.fire_pressed,
                switch_pressed: pending.switch_pressed,
                ..now_input
            };
            pending = FrameInput::default();

            let events = stage.step(&FrameEvent::with_input(tick, frame_input));
            for event in &events {
                if let Some(text) = describe(event) {
                    renderer.show_message(text);
                }
            }

            if stage.is_cleared() {
                level_idx = (level_idx + 1) % levels.len();
                stage = Stage::load(&levels[level_idx], config)?;
                renderer.show_message(stage.name.clone());
            } else if stage.is_over() {
                stage = Stage::load(&levels[level_idx], config)?;
                renderer.show_message(format!("Game over - retrying {}", stage.name));
            }
        }

        renderer.render(&mut stage)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn describe(event: &GameEvent) -> Option<String> {
    let text = match event {
        GameEvent::PlayerHurt { health } => format!("Ouch! HP {health}"),
        GameEvent::PlayerKilled => "You died".to_string(),
        GameEvent::PlayerSplash => "Splash!".to_string(),
        GameEvent::EnemyKilled { kind } | GameEvent::EnemyStomped { kind } => format!("{kind:?} defeated"),
        GameEvent::ColorBlocksToggled { changed } => format!("Switched {changed} blocks"),
        GameEvent::StageCleared => "Stage clear!".to_string(),
        GameEvent::GameOver => "Game over".to_string(),
        GameEvent::PlayerRespawned | GameEvent::ShotFired => return None,
    };
    Some(text)
}

// ══════════════════════════════════════════════════════════════
// Headless
// ══════════════════════════════════════════════════════════════

/// Run every level with a scripted player: walk right, jump and fire at
/// fixed intervals, flip the color blocks now and then.
fn run_headless(levels: &[LevelDef], config: &GameConfig, frames: u64) -> Result<(), Box<dyn Error>> {
    let first = levels.first().ok_or("no levels available")?;
    let mut level_idx = 0;
    let mut stage = Stage::load(first, config)?;
    let mut counts = EventCounts::default();

    for frame in 0..frames {
        let input = FrameInput {
            right: true,
            jump_held: frame % 45 < 20,
            jump_pressed: frame % 45 == 0,
            fire_pressed: frame % 30 == 0,
            switch_pressed: frame % 240 == 120,
            ..Default::default()
        };
        let events = stage.step(&FrameEvent::with_input(1.0, input));
        counts.add(&events);

        if stage.is_cleared() || stage.is_over() {
            if stage.is_cleared() {
                level_idx += 1;
                if level_idx >= levels.len() {
                    log::info!("all levels cleared at frame {frame}");
                    break;
                }
            }
            stage = Stage::load(&levels[level_idx], config)?;
        }
    }

    let pos = stage.player.position();
    log::info!("headless run finished: {counts:?}");
    println!(
        "level {} \"{}\"  player at ({:.1}, {:.1})  lives {}",
        level_idx + 1,
        stage.name,
        pos.x,
        pos.y,
        stage.lives
    );
    println!(
        "cleared {}  deaths {}  enemies defeated {}  shots {}  switches {}",
        counts.cleared, counts.deaths, counts.defeated, counts.shots, counts.switches
    );
    Ok(())
}

#[derive(Debug, Default)]
struct EventCounts {
    cleared: u32,
    deaths: u32,
    defeated: u32,
    shots: u32,
    switches: u32,
}

impl EventCounts {
    fn add(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::StageCleared => self.cleared += 1,
                GameEvent::PlayerKilled => self.deaths += 1,
                GameEvent::EnemyKilled { .. } | GameEvent::EnemyStomped { .. } => self.defeated += 1,
                GameEvent::ShotFired => self.shots += 1,
                GameEvent::ColorBlocksToggled { .. } => self.switches += 1,
                _ => {}
            }
        }
    }
}
