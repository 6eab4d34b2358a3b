//! Obstacle spawn, motion and retirement
//!
//! There is exactly one obstacle instance. It is spawned (made active with a
//! fresh motion), advanced once per update tick, and retired (hidden) when the
//! motion completes. The game loop schedules the next spawn after a retire.

use rand::Rng;

use crate::config::{GameConfig, ObstaclePolicy};
use crate::game::constants::physics::GROUND_LEVEL;
use crate::game::state::{GameState, ObstacleMotion, Waypoint};
use crate::util::vec2::Vec2;

/// Outcome of advancing the obstacle by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleUpdate {
    /// Hidden or frozen
    Inactive,
    Moving,
    /// Motion completed this tick; the obstacle is now hidden
    Retired,
}

/// Activate the obstacle under the configured policy
///
/// No-op (returns None) when not playing or when the obstacle is already active.
pub fn spawn<R: Rng + ?Sized>(
    state: &mut GameState,
    config: &GameConfig,
    rng: &mut R,
) -> Option<ObstacleMotion> {
    if !state.match_state.is_playing() || state.obstacle.active {
        return None;
    }

    let motion = match config.obstacle_policy {
        ObstaclePolicy::Sweep => {
            state.obstacle.position = Vec2::new(state.arena.x, GROUND_LEVEL);
            ObstacleMotion::Sweep {
                velocity_x: -config.sweep_speed,
            }
        }
        ObstaclePolicy::Waypoint => {
            let max = config.obstacle_max_position();
            let start = state.obstacle.position.clamp(Vec2::ZERO, max);
            let target = random_waypoint(max, rng);
            let duration_ms = rng.gen_range(config.transit_min_ms..config.transit_max_ms);
            state.obstacle.position = start;
            ObstacleMotion::Waypoint(Waypoint::new(start, target, duration_ms))
        }
    };

    state.obstacle.active = true;
    state.obstacle.motion = Some(motion);
    state.obstacle.pending_spawn_ms = None;
    Some(motion)
}

/// Uniform point in [0, max.x] x [0, max.y]
pub fn random_waypoint<R: Rng + ?Sized>(max: Vec2, rng: &mut R) -> Vec2 {
    Vec2::new(rng.gen_range(0.0..=max.x), rng.gen_range(0.0..=max.y))
}

/// Delay before the next spawn, uniform in [min, max)
pub fn random_spawn_delay<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> u64 {
    rng.gen_range(config.spawn_delay_min_ms..config.spawn_delay_max_ms)
}

/// Advance the active obstacle by one tick of `dt_ms`
pub fn update(state: &mut GameState, dt_ms: u64) -> ObstacleUpdate {
    if !state.obstacle.active {
        return ObstacleUpdate::Inactive;
    }

    let arena_width = state.arena.x;
    let obstacle = &mut state.obstacle;
    let finished = match obstacle.motion.as_mut() {
        None => return ObstacleUpdate::Inactive,
        Some(ObstacleMotion::Sweep { velocity_x }) => {
            obstacle.position.x += *velocity_x;
            if *velocity_x < 0.0 {
                obstacle.position.x + obstacle.size.x < 0.0
            } else {
                obstacle.position.x > arena_width
            }
        }
        Some(ObstacleMotion::Waypoint(waypoint)) => {
            let done = waypoint.advance(dt_ms);
            obstacle.position = waypoint.position();
            done
        }
    };

    if finished {
        retire(state);
        ObstacleUpdate::Retired
    } else {
        ObstacleUpdate::Moving
    }
}

/// Hide the obstacle and drop its motion. Position is kept as the next start point.
pub fn retire(state: &mut GameState) {
    state.obstacle.active = false;
    state.obstacle.motion = None;
}

/// Stop the obstacle where it is, leaving it visible
pub fn freeze(state: &mut GameState) {
    state.obstacle.motion = None;
}
