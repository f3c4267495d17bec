/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, unreadable or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Frame duration that counts as one tick.
const BASE_FRAME_MS: f32 = 1000.0 / 60.0;

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub physics: PhysicsConfig,
    pub camera: CameraConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub max_tick: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: f32,        // ease rate of fall speed, per tick
    pub max_fall: f32,
    pub walk_speed: f32,
    pub walk_friction: f32,
    pub jump_speed: f32,
    pub bounce: f32,         // player restitution on floors and ceilings
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub width: f32,
    pub height: f32,
}

impl TimingConfig {
    /// Tick multiplier for a frame that took `elapsed_ms`.
    pub fn tick_for(&self, elapsed_ms: f32) -> f32 {
        (elapsed_ms / BASE_FRAME_MS).clamp(0.0, self.max_tick)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        GameConfig::default().physics
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    camera: TomlCamera,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_max_tick")]
    max_tick: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_max_fall")]
    max_fall: f32,
    #[serde(default = "default_walk_speed")]
    walk_speed: f32,
    #[serde(default = "default_walk_friction")]
    walk_friction: f32,
    #[serde(default = "default_jump_speed")]
    jump_speed: f32,
    #[serde(default = "default_bounce")]
    bounce: f32,
}

#[derive(Deserialize, Debug)]
struct TomlCamera {
    #[serde(default = "default_camera_width")]
    width: f32,
    #[serde(default = "default_camera_height")]
    height: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }
fn default_max_tick() -> f32 { 2.0 }      // below 30 fps the game slows down instead
fn default_gravity() -> f32 { 0.15 }
fn default_max_fall() -> f32 { 4.0 }
fn default_walk_speed() -> f32 { 1.0 }
fn default_walk_friction() -> f32 { 0.1 }
fn default_jump_speed() -> f32 { 3.25 }
fn default_bounce() -> f32 { 0.0 }
fn default_camera_width() -> f32 { 320.0 }
fn default_camera_height() -> f32 { 192.0 }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            max_tick: default_max_tick(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            max_fall: default_max_fall(),
            walk_speed: default_walk_speed(),
            walk_friction: default_walk_friction(),
            jump_speed: default_jump_speed(),
            bounce: default_bounce(),
        }
    }
}

impl Default for TomlCamera {
    fn default() -> Self {
        TomlCamera {
            width: default_camera_width(),
            height: default_camera_height(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config document. Errors fall back to defaults.
    pub fn parse(text: &str) -> Self {
        GameConfig::from_toml(parse_toml(text, Path::new("config.toml")), &[])
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let mut timing = TimingConfig {
            frame_ms: toml_cfg.timing.frame_ms,
            max_tick: toml_cfg.timing.max_tick,
        };
        if timing.frame_ms == 0 {
            log::warn!("timing.frame_ms must be positive, using {}", default_frame_ms());
            timing.frame_ms = default_frame_ms();
        }
        if !(timing.max_tick > 0.0) {
            log::warn!("timing.max_tick must be positive, using {}", default_max_tick());
            timing.max_tick = default_max_tick();
        }

        GameConfig {
            timing,
            physics: PhysicsConfig {
                gravity: toml_cfg.physics.gravity,
                max_fall: toml_cfg.physics.max_fall,
                walk_speed: toml_cfg.physics.walk_speed,
                walk_friction: toml_cfg.physics.walk_friction,
                jump_speed: toml_cfg.physics.jump_speed,
                bounce: toml_cfg.physics.bounce.clamp(0.0, 1.0),
            },
            camera: CameraConfig {
                width: toml_cfg.camera.width.max(16.0),
                height: toml_cfg.camera.height.max(16.0),
            },
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    log::info!("loading {}", path.display());
                    return parse_toml(&text, &path);
                }
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    log::debug!("no config.toml found, using defaults");
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &Path) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("{} parse error: {e}; using default settings", path.display());
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::parse("");
        assert_eq!(cfg, GameConfig::default());
        assert_eq!(cfg.timing.frame_ms, 16);
        assert_eq!(cfg.physics.max_fall, 4.0);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn keys_default_individually() {
        let cfg = GameConfig::parse("[physics]\ngravity = 0.3\n[camera]\nwidth = 640.0\n");
        assert_eq!(cfg.physics.gravity, 0.3);
        assert_eq!(cfg.physics.jump_speed, 3.25);
        assert_eq!(cfg.camera.width, 640.0);
        assert_eq!(cfg.camera.height, 192.0);
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let cfg = GameConfig::parse("[physics\ngravity = ");
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn bad_values_are_replaced() {
        let cfg = GameConfig::parse("[timing]\nframe_ms = 0\nmax_tick = -1.0\n[physics]\nbounce = 3.0\n");
        assert_eq!(cfg.timing.frame_ms, 16);
        assert_eq!(cfg.timing.max_tick, 2.0);
        assert_eq!(cfg.physics.bounce, 1.0);
    }

    #[test]
    fn tick_is_relative_to_sixty_hz_and_capped() {
        let timing = GameConfig::default().timing;
        assert!((timing.tick_for(1000.0 / 60.0) - 1.0).abs() < 1e-5);
        assert!((timing.tick_for(1000.0 / 120.0) - 0.5).abs() < 1e-5);
        assert_eq!(timing.tick_for(500.0), 2.0);
    }
}
