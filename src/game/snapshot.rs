//! Render-facing view of the game state
//!
//! The core never touches rendering; sinks receive these plain values.

use serde::{Deserialize, Serialize};

use crate::game::state::{GameState, MatchId, MatchPhase, ObstacleMotion};
use crate::util::aabb::Aabb;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub position: Vec2,
    pub velocity_y: f32,
    pub bounds: Aabb,
    pub airborne: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub position: Vec2,
    pub bounds: Aabb,
    /// Waypoint transit progress in [0, 1]; absent for sweeps and frozen obstacles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
}

/// Full game snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub tick: u64,
    pub match_id: Option<MatchId>,
    pub phase: MatchPhase,
    pub score: u32,
    pub arena: Vec2,
    pub character: CharacterSnapshot,
    /// Only present while the obstacle is visible
    pub obstacle: Option<ObstacleSnapshot>,
}

impl GameSnapshot {
    pub fn from_game_state(state: &GameState) -> Self {
        let character = &state.character;
        let obstacle = state.obstacle.active.then(|| ObstacleSnapshot {
            position: state.obstacle.position,
            bounds: state.obstacle.bounds(),
            progress: match state.obstacle.motion {
                Some(ObstacleMotion::Waypoint(wp)) => Some(wp.progress()),
                _ => None,
            },
        });

        Self {
            tick: state.match_state.ticks,
            match_id: state.match_state.match_id,
            phase: state.match_state.phase,
            score: state.match_state.score,
            arena: state.arena,
            character: CharacterSnapshot {
                position: character.position,
                velocity_y: character.velocity_y,
                bounds: character.bounds(),
                airborne: !character.on_ground(),
            },
            obstacle,
        }
    }
}
