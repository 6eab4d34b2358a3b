use crate::config::GameConfig;
use crate::game::constants::physics::GROUND_LEVEL;
use crate::game::state::GameState;

/// Integrate the character's vertical motion for one tick
///
/// Semi-implicit Euler with a single gravity constant for rise and fall:
/// velocity is reduced first, then applied to position. Landing (or any
/// position at or below ground) snaps to ground and zeroes velocity.
pub fn update(state: &mut GameState, config: &GameConfig) {
    let character = &mut state.character;

    character.velocity_y -= config.gravity;
    character.position.y += character.velocity_y;

    if character.position.y <= GROUND_LEVEL {
        character.position.y = GROUND_LEVEL;
        character.velocity_y = 0.0;
    }
}

/// Start a jump. No effect unless playing and resting exactly on the ground.
///
/// Returns true if the jump was taken.
pub fn jump(state: &mut GameState, config: &GameConfig) -> bool {
    if !state.match_state.is_playing() || !state.character.on_ground() {
        return false;
    }
    state.character.velocity_y = config.jump_velocity;
    true
}
