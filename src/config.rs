//! Tunables for the simulation and the terminal front-end.

use std::path::PathBuf;

const DEFAULT_TICK_MS: u64 = 16;
const DEFAULT_RENDER_FPS: u64 = 60;

/// Alternating scatter/chase phases, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeSchedule {
    pub scatter_secs: f32,
    pub chase_secs: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Seconds a ghost spends in `Wait` before leaving home.
    pub wait_duration: f32,
    pub scared_duration: f32,
    /// Cells beyond the maze bounds a ghost may stray before it is reset.
    pub bounds_margin: i32,
    pub game_speed: f32,
    pub capture_radius: f32,
    /// Seconds a released direction keeps steering the player.
    pub input_decay: f32,
    pub player_speed: f32,
    pub player_post_buffer: f32,
    /// Distance at which Orange flees and Yellow gives chase.
    pub ghost_radius: f32,
    pub lives: u32,
    pub start_in_scatter: bool,
    pub schedule: Option<ModeSchedule>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            wait_duration: 5.0,
            scared_duration: 5.0,
            bounds_margin: 2,
            game_speed: 1.0,
            capture_radius: 0.5,
            input_decay: 0.1,
            player_speed: 5.0,
            player_post_buffer: 0.3,
            ghost_radius: 8.0,
            lives: 3,
            start_in_scatter: true,
            schedule: Some(ModeSchedule {
                scatter_secs: 7.0,
                chase_secs: 20.0,
            }),
        }
    }
}

/// Front-end settings read from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub tick_ms: u64,
    pub render_fps: u64,
    pub seed: Option<u64>,
    pub layout: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset or unparsable values fall
    /// back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let positive = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        Self {
            tick_ms: positive("GAKMAN_TICK_MS", DEFAULT_TICK_MS),
            render_fps: positive("GAKMAN_FPS", DEFAULT_RENDER_FPS),
            seed: lookup("GAKMAN_SEED").and_then(|v| v.parse::<u64>().ok()),
            layout: lookup("GAKMAN_LAYOUT").map(PathBuf::from),
            log_file: lookup("GAKMAN_LOG").map(PathBuf::from),
            verbose: lookup("GAKMAN_VERBOSE").is_some_and(|v| v == "1" || v == "true"),
        }
    }

    pub fn tick_secs(&self) -> f32 {
        self.tick_ms as f32 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let vars: HashMap<&str, &str> = [
            ("GAKMAN_TICK_MS", "0"),
            ("GAKMAN_FPS", "fast"),
            ("GAKMAN_SEED", "42"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(settings.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(settings.render_fps, DEFAULT_RENDER_FPS);
        assert_eq!(settings.seed, Some(42));
        assert!(settings.layout.is_none());
        assert!(!settings.verbose);
    }
}
