//! Run configuration – reads/writes `~/.roam/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use roam_types::RoamError;

/// Persisted run configuration stored in `~/.roam/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Length of one control-loop tick in milliseconds.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Global RNG seed; every behaviour derives its own stream from it, so
    /// a run is reproducible from this one number.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Palette name of the goal color.
    #[serde(default = "default_goal_color")]
    pub goal_color: String,

    /// Maximum number of ticks to run; `0` runs until a halt.
    #[serde(default)]
    pub max_ticks: u64,

    /// Behaviour priorities.  Higher wins arbitration at equal confidence.
    #[serde(default = "default_crash_priority")]
    pub crash_priority: f32,
    #[serde(default = "default_goal_priority")]
    pub goal_priority: f32,
    #[serde(default = "default_line_priority")]
    pub line_priority: f32,
    #[serde(default = "default_explore_priority")]
    pub explore_priority: f32,
}

fn default_tick_period_ms() -> u64 {
    500
}
fn default_seed() -> u64 {
    42
}
fn default_goal_color() -> String {
    "green".to_string()
}
fn default_crash_priority() -> f32 {
    2.0
}
fn default_goal_priority() -> f32 {
    5.0
}
fn default_line_priority() -> f32 {
    1.0
}
fn default_explore_priority() -> f32 {
    0.25
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            seed: default_seed(),
            goal_color: default_goal_color(),
            max_ticks: 0,
            crash_priority: default_crash_priority(),
            goal_priority: default_goal_priority(),
            line_priority: default_line_priority(),
            explore_priority: default_explore_priority(),
        }
    }
}

/// Return the path to `~/.roam/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".roam").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, RoamError> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, RoamError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        RoamError::Config(format!("failed to read config at {}: {}", path.display(), e))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| RoamError::Config(format!("failed to parse config: {}", e)))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ROAM_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `ROAM_SEED` | `seed` |
/// | `ROAM_GOAL_COLOR` | `goal_color` |
/// | `ROAM_TICK_PERIOD_MS` | `tick_period_ms` |
/// | `ROAM_MAX_TICKS` | `max_ticks` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ROAM_SEED")
        && let Ok(seed) = v.parse::<u64>()
    {
        cfg.seed = seed;
    }
    if let Ok(v) = std::env::var("ROAM_GOAL_COLOR") {
        cfg.goal_color = v;
    }
    if let Ok(v) = std::env::var("ROAM_TICK_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.tick_period_ms = ms;
    }
    if let Ok(v) = std::env::var("ROAM_MAX_TICKS")
        && let Ok(ticks) = v.parse::<u64>()
    {
        cfg.max_ticks = ticks;
    }
}

/// Save the config to disk, creating `~/.roam/` if necessary.
pub fn save(cfg: &Config) -> Result<(), RoamError> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), RoamError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            RoamError::Config(format!("failed to create config directory: {}", e))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| RoamError::Config(format!("failed to serialize config: {}", e)))?;
    fs::write(path, raw).map_err(|e| {
        RoamError::Config(format!("failed to write config at {}: {}", path.display(), e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.tick_period_ms, 500);
        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.goal_color, "green");
        assert_eq!(loaded.max_ticks, 0);
        assert!((loaded.goal_priority - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        let result = load_from(&path).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn config_path_points_to_roam_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".roam"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "goal_color = \"red\"\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.goal_color, "red");
        assert_eq!(loaded.tick_period_ms, 500);
    }

    #[test]
    fn apply_env_overrides_changes_seed() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("ROAM_SEED", "1234") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.seed, 1234);
        unsafe { std::env::remove_var("ROAM_SEED") };
    }

    #[test]
    fn apply_env_overrides_changes_goal_color() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("ROAM_GOAL_COLOR", "blue") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.goal_color, "blue");
        unsafe { std::env::remove_var("ROAM_GOAL_COLOR") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_numbers() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("ROAM_TICK_PERIOD_MS", "not-a-number") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_period_ms, 500);
        unsafe { std::env::remove_var("ROAM_TICK_PERIOD_MS") };
    }
}
