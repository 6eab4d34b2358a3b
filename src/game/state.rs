//! Game state definitions and structures
//!
//! Holds the character, the single reusable obstacle and the match bookkeeping.
//! Systems mutate these through `&mut GameState`; only the game loop decides
//! when they run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::game::constants::{character, physics};
use crate::util::aabb::Aabb;
use crate::util::vec2::Vec2;

/// Unique match identifier
pub type MatchId = Uuid;

/// Horizontal direction for movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

/// Held left/right keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    pub fn set(&mut self, direction: Direction, held: bool) {
        match direction {
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    /// -1, 0 or 1. Holding both directions cancels out.
    pub fn axis(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// The player-controlled character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Bottom-left corner; y is height above ground
    pub position: Vec2,
    /// Vertical velocity (positive = rising)
    pub velocity_y: f32,
    pub size: Vec2,
    pub intent: MoveIntent,
}

impl Character {
    pub fn new(size: Vec2) -> Self {
        Self {
            position: Vec2::new(character::START_X, physics::GROUND_LEVEL),
            velocity_y: 0.0,
            size,
            intent: MoveIntent::default(),
        }
    }

    /// Exactly at rest height. Jumps are only honored here.
    #[inline]
    pub fn on_ground(&self) -> bool {
        self.position.y == physics::GROUND_LEVEL
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_origin_size(self.position, self.size)
    }
}

/// Point-to-point transit with explicit interpolation state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub start: Vec2,
    pub end: Vec2,
    pub duration_ms: u64,
    pub elapsed_ms: u64,
}

impl Waypoint {
    pub fn new(start: Vec2, end: Vec2, duration_ms: u64) -> Self {
        Self {
            start,
            end,
            duration_ms,
            elapsed_ms: 0,
        }
    }

    /// Fraction of the transit completed, in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms as f32 / self.duration_ms as f32).min(1.0)
    }

    pub fn position(&self) -> Vec2 {
        self.start.lerp(self.end, self.progress())
    }

    /// Advance by `dt_ms`; returns true once the target is reached
    pub fn advance(&mut self, dt_ms: u64) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms).min(self.duration_ms);
        self.is_finished()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Current obstacle movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleMotion {
    /// Constant horizontal delta per tick (negative = leftward)
    Sweep { velocity_x: f32 },
    Waypoint(Waypoint),
}

/// The single reusable obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    /// Bottom-left corner
    pub position: Vec2,
    pub size: Vec2,
    /// Visible and collidable
    pub active: bool,
    /// None when frozen or hidden
    pub motion: Option<ObstacleMotion>,
    /// Delay chosen for the pending spawn, if one is scheduled
    pub pending_spawn_ms: Option<u64>,
}

impl Obstacle {
    /// Hidden obstacle resting on the ground at the arena's right edge
    pub fn new(size: Vec2, arena_width: f32) -> Self {
        Self {
            position: Vec2::new(arena_width - size.x, physics::GROUND_LEVEL),
            size,
            active: false,
            motion: None,
            pending_spawn_ms: None,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_origin_size(self.position, self.size)
    }
}

/// Match phase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MatchPhase {
    /// Nothing started yet
    #[default]
    Idle,
    /// Match in progress
    Playing,
    /// Ended by collision or cancellation; waiting for restart
    GameOver,
}

/// Match state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchState {
    pub phase: MatchPhase,
    pub match_id: Option<MatchId>,
    /// Whole seconds survived
    pub score: u32,
    /// Update ticks processed this match
    pub ticks: u64,
    /// Obstacles that retired without a collision
    pub obstacles_dodged: u32,
}

impl MatchState {
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == MatchPhase::Playing
    }
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub arena: Vec2,
    pub character: Character,
    pub obstacle: Obstacle,
    pub match_state: MatchState,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            arena: Vec2::new(config.arena_width, config.arena_height),
            character: Character::new(config.character_size),
            obstacle: Obstacle::new(config.obstacle_size, config.arena_width),
            match_state: MatchState::default(),
        }
    }

    /// Put character and obstacle back at their initial placement and zero the score.
    /// The phase is left to the caller.
    pub fn reset_entities(&mut self) {
        self.character = Character::new(self.character.size);
        self.obstacle = Obstacle::new(self.obstacle.size, self.arena.x);
        self.match_state.score = 0;
        self.match_state.ticks = 0;
        self.match_state.obstacles_dodged = 0;
    }
}
