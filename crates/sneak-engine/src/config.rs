//! Simulation tuning, loadable from JSON.
//!
//! Every field has a default taken from the shipped game, so a config file
//! only needs to name the values it overrides:
//!
//! ```
//! use sneak_engine::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "pursuit_speed": 140.0 }"#).unwrap();
//! assert_eq!(config.pursuit_speed, 140.0);
//! assert_eq!(config.pursuit_interval_s, 0.5);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Errors produced while loading or validating a [`SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The JSON did not match the expected shape.
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is outside its allowed range.
    #[error("config field '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// EntitySizes
// ---------------------------------------------------------------------------

/// Collision extents per spawned role, in world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitySizes {
    pub player: Vec2,
    pub pursuer: Vec2,
    pub wall: Vec2,
    pub exit: Vec2,
    pub trap: Vec2,
    pub light: Vec2,
    pub camera: Vec2,
    pub pickup: Vec2,
    pub npc: Vec2,
}

impl Default for EntitySizes {
    fn default() -> Self {
        Self {
            player: Vec2::new(49.5, 49.5),
            pursuer: Vec2::new(102.4, 102.4),
            wall: Vec2::new(20.2, 20.2),
            exit: Vec2::new(90.0, 100.0),
            trap: Vec2::new(40.0, 40.0),
            light: Vec2::new(60.0, 60.0),
            camera: Vec2::new(40.0, 40.0),
            pickup: Vec2::new(40.0, 40.0),
            npc: Vec2::new(49.5, 49.5),
        }
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Tunable constants for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World units per level-grid cell.
    pub wall_size: f32,
    /// Pursuer speed while chasing, world units per second.
    pub pursuit_speed: f32,
    /// Minimum simulated time between chase recomputations.
    pub pursuit_interval_s: f32,
    /// Chebyshev clearance from walls required of every searched cell.
    pub wall_buffer: i32,
    /// Added to a light's extent before the overlap test.
    pub light_inflation: Vec2,
    /// Distance the player is pushed back off a wall.
    pub wall_push: f32,
    /// Player walking speed, world units per second.
    pub player_speed: f32,
    /// Initial horizontal patrol velocity of guards (signed). Zero spawns
    /// guards that stand still until pursuit starts.
    pub patrol_velocity: f32,
    /// Level numbers whose guards patrol. See [`SimConfig::for_level`].
    pub patrol_levels: Vec<u32>,
    pub patrol_period_ms: f32,
    /// Angular sweep speed of lights, radians per second.
    pub light_sweep_speed: f32,
    pub light_sweep_period_ms: f32,
    pub sandglass_ms: f32,
    pub remote_control_ms: f32,
    pub bee_going_ms: f32,
    pub bee_stay_ms: f32,
    /// Cells the hammer reaches before the target on each axis; it reaches
    /// one fewer after.
    pub hammer_range: i32,
    /// Seed for the pathfinder's fallback RNG.
    pub seed: u64,
    pub sizes: EntitySizes,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            wall_size: 20.2,
            pursuit_speed: 100.0,
            pursuit_interval_s: 0.5,
            wall_buffer: 3,
            light_inflation: Vec2::new(90.0, -30.0),
            wall_push: 15.0,
            player_speed: 200.0,
            patrol_velocity: -50.0,
            patrol_levels: vec![1, 2],
            patrol_period_ms: 12_000.0,
            light_sweep_speed: 0.5,
            light_sweep_period_ms: 3_000.0,
            sandglass_ms: 5_000.0,
            remote_control_ms: 5_000.0,
            bee_going_ms: 2_000.0,
            bee_stay_ms: 3_000.0,
            hammer_range: 3,
            seed: 0x5eed,
            sizes: EntitySizes::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// The tuning for level number `level`: guards keep the patrol velocity
    /// on the levels listed in `patrol_levels` and stand still elsewhere.
    ///
    /// ```
    /// use sneak_engine::config::SimConfig;
    ///
    /// let base = SimConfig::default();
    /// assert_eq!(base.for_level(1).patrol_velocity, -50.0);
    /// assert_eq!(base.for_level(3).patrol_velocity, 0.0);
    /// ```
    pub fn for_level(&self, level: u32) -> Self {
        let mut config = self.clone();
        if !self.patrol_levels.contains(&level) {
            config.patrol_velocity = 0.0;
        }
        config
    }

    /// Reject values the systems cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("wall_size", self.wall_size)?;
        positive("pursuit_interval_s", self.pursuit_interval_s)?;
        positive("patrol_period_ms", self.patrol_period_ms)?;
        positive("light_sweep_period_ms", self.light_sweep_period_ms)?;
        non_negative("pursuit_speed", self.pursuit_speed)?;
        non_negative("wall_push", self.wall_push)?;
        non_negative("player_speed", self.player_speed)?;
        non_negative("sandglass_ms", self.sandglass_ms)?;
        non_negative("remote_control_ms", self.remote_control_ms)?;
        non_negative("bee_going_ms", self.bee_going_ms)?;
        non_negative("bee_stay_ms", self.bee_stay_ms)?;
        if self.wall_buffer < 0 {
            return Err(ConfigError::Invalid {
                field: "wall_buffer",
                reason: format!("must be >= 0, got {}", self.wall_buffer),
            });
        }
        if self.hammer_range < 0 {
            return Err(ConfigError::Invalid {
                field: "hammer_range",
                reason: format!("must be >= 0, got {}", self.hammer_range),
            });
        }
        if !self.light_inflation.is_finite() {
            return Err(ConfigError::Invalid {
                field: "light_inflation",
                reason: "must be finite".to_string(),
            });
        }
        if !self.patrol_velocity.is_finite() {
            return Err(ConfigError::Invalid {
                field: "patrol_velocity",
                reason: "must be finite".to_string(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be positive and finite, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be non-negative and finite, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "seed": 7, "sizes": { "player": { "x": 10.0, "y": 12.0 } } }"#;
        let config = SimConfig::from_json_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.sizes.player, Vec2::new(10.0, 12.0));
        assert_eq!(config.sizes.pursuer, EntitySizes::default().pursuer);
        assert_eq!(config.wall_push, 15.0);
    }

    #[test]
    fn patrol_levels_come_from_json() {
        let config = SimConfig::from_json_str(r#"{ "patrol_levels": [4] }"#).unwrap();
        assert_eq!(config.for_level(4).patrol_velocity, -50.0);
        assert_eq!(config.for_level(1).patrol_velocity, 0.0);
        // The base config is untouched.
        assert_eq!(config.patrol_velocity, -50.0);
    }

    #[test]
    fn rejects_non_positive_interval() {
        let err = SimConfig::from_json_str(r#"{ "pursuit_interval_s": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "pursuit_interval_s",
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SimConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SimConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
