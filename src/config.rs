use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::constants::{arena, character, obstacle, physics, render};
use crate::util::vec2::Vec2;

/// How the obstacle travels once spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstaclePolicy {
    /// Enter just outside the right edge and slide left until fully past the left edge
    Sweep,
    /// Travel to a random point in the arena over a random duration
    Waypoint,
}

impl FromStr for ObstaclePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sweep" => Ok(Self::Sweep),
            "waypoint" => Ok(Self::Waypoint),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown obstacle policy '{0}' (expected 'sweep' or 'waypoint')")]
    UnknownPolicy(String),
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    #[error("{name} range is empty: {min}..{max}")]
    EmptyRange {
        name: &'static str,
        min: u64,
        max: u64,
    },
    #[error("{0} does not fit inside the arena")]
    DoesNotFit(&'static str),
}

/// Game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Arena width in pixels
    pub arena_width: f32,
    /// Arena height in pixels
    pub arena_height: f32,
    pub character_size: Vec2,
    pub obstacle_size: Vec2,
    /// Velocity removed every tick
    pub gravity: f32,
    /// Velocity set by a jump
    pub jump_velocity: f32,
    /// Horizontal pixels per tick on the ground
    pub move_speed: f32,
    /// Multiplier applied to `move_speed` while airborne
    pub airborne_speed_factor: f32,
    pub obstacle_policy: ObstaclePolicy,
    /// Sweep policy: pixels per tick
    pub sweep_speed: f32,
    pub spawn_delay_min_ms: u64,
    pub spawn_delay_max_ms: u64,
    pub transit_min_ms: u64,
    pub transit_max_ms: u64,
    /// Fixed RNG seed for reproducible matches
    pub rng_seed: Option<u64>,
    /// Render sink receives a snapshot every N update ticks
    pub snapshot_every_ticks: u64,
    /// Serve metrics over HTTP on this port when set
    pub metrics_port: Option<u16>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            arena_width: arena::WIDTH,
            arena_height: arena::HEIGHT,
            character_size: Vec2::new(character::WIDTH, character::HEIGHT),
            obstacle_size: Vec2::new(obstacle::WIDTH, obstacle::HEIGHT),
            gravity: physics::GRAVITY,
            jump_velocity: physics::JUMP_VELOCITY,
            move_speed: character::MOVE_SPEED,
            airborne_speed_factor: character::AIRBORNE_SPEED_FACTOR,
            obstacle_policy: ObstaclePolicy::Waypoint,
            sweep_speed: obstacle::SWEEP_SPEED,
            spawn_delay_min_ms: obstacle::SPAWN_DELAY_MIN_MS,
            spawn_delay_max_ms: obstacle::SPAWN_DELAY_MAX_MS,
            transit_min_ms: obstacle::TRANSIT_MIN_MS,
            transit_max_ms: obstacle::TRANSIT_MAX_MS,
            rng_seed: None,
            snapshot_every_ticks: render::SNAPSHOT_EVERY_TICKS,
            metrics_port: None,
        }
    }
}

/// Overwrite `slot` with the parsed value of env var `name`, if present and valid
fn env_override<T: FromStr>(name: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse::<T>() {
            Ok(parsed) => *slot = parsed,
            Err(_) => tracing::warn!("Invalid {} '{}', using default", name, raw),
        }
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite(name));
    }
    if value <= 0.0 {
        return Err(ConfigError::NotPositive(name));
    }
    Ok(())
}

impl GameConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        env_override("ARENA_WIDTH", &mut config.arena_width);
        env_override("ARENA_HEIGHT", &mut config.arena_height);
        env_override("GRAVITY", &mut config.gravity);
        env_override("JUMP_VELOCITY", &mut config.jump_velocity);
        env_override("MOVE_SPEED", &mut config.move_speed);
        env_override("OBSTACLE_POLICY", &mut config.obstacle_policy);
        env_override("SWEEP_SPEED", &mut config.sweep_speed);
        env_override("SPAWN_DELAY_MIN_MS", &mut config.spawn_delay_min_ms);
        env_override("SPAWN_DELAY_MAX_MS", &mut config.spawn_delay_max_ms);
        env_override("TRANSIT_MIN_MS", &mut config.transit_min_ms);
        env_override("TRANSIT_MAX_MS", &mut config.transit_max_ms);

        if let Ok(seed) = std::env::var("RNG_SEED") {
            match seed.parse::<u64>() {
                Ok(parsed) => config.rng_seed = Some(parsed),
                Err(_) => tracing::warn!("Invalid RNG_SEED '{}', using entropy", seed),
            }
        }

        if let Ok(every) = std::env::var("SNAPSHOT_EVERY_TICKS") {
            match every.parse::<u64>() {
                Ok(parsed) if parsed > 0 => config.snapshot_every_ticks = parsed,
                _ => tracing::warn!("SNAPSHOT_EVERY_TICKS must be >= 1, using default"),
            }
        }

        if let Ok(port) = std::env::var("METRICS_PORT") {
            match port.parse::<u16>() {
                Ok(parsed) if parsed > 0 => config.metrics_port = Some(parsed),
                _ => tracing::warn!("Invalid METRICS_PORT '{}', metrics endpoint disabled", port),
            }
        }

        config
    }

    /// Validate configuration after loading. Every float must be finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("arena_width", self.arena_width)?;
        check_positive("arena_height", self.arena_height)?;
        check_positive("character_size.x", self.character_size.x)?;
        check_positive("character_size.y", self.character_size.y)?;
        check_positive("obstacle_size.x", self.obstacle_size.x)?;
        check_positive("obstacle_size.y", self.obstacle_size.y)?;
        check_positive("gravity", self.gravity)?;
        check_positive("jump_velocity", self.jump_velocity)?;
        check_positive("move_speed", self.move_speed)?;
        check_positive("airborne_speed_factor", self.airborne_speed_factor)?;
        check_positive("sweep_speed", self.sweep_speed)?;
        if self.snapshot_every_ticks == 0 {
            return Err(ConfigError::NotPositive("snapshot_every_ticks"));
        }
        if self.spawn_delay_min_ms >= self.spawn_delay_max_ms {
            return Err(ConfigError::EmptyRange {
                name: "spawn delay",
                min: self.spawn_delay_min_ms,
                max: self.spawn_delay_max_ms,
            });
        }
        if self.transit_min_ms == 0 || self.transit_min_ms >= self.transit_max_ms {
            return Err(ConfigError::EmptyRange {
                name: "transit duration",
                min: self.transit_min_ms,
                max: self.transit_max_ms,
            });
        }
        if character::START_X + self.character_size.x > self.arena_width
            || self.character_size.y > self.arena_height
        {
            return Err(ConfigError::DoesNotFit("character"));
        }
        if self.obstacle_size.x > self.arena_width
            || self.obstacle_size.y > self.arena_height
        {
            return Err(ConfigError::DoesNotFit("obstacle"));
        }
        Ok(())
    }

    /// Largest x the character may occupy
    pub fn character_max_x(&self) -> f32 {
        self.arena_width - self.character_size.x
    }

    /// Upper corner of the region a waypoint obstacle may occupy
    pub fn obstacle_max_position(&self) -> Vec2 {
        Vec2::new(
            self.arena_width - self.obstacle_size.x,
            self.arena_height - self.obstacle_size.y,
        )
    }
}
