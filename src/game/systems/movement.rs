//! Horizontal character movement from held left/right intent

use crate::config::GameConfig;
use crate::game::state::{Direction, GameState};

/// Apply one tick of horizontal movement and clamp into the arena
pub fn update(state: &mut GameState, config: &GameConfig) {
    let character = &mut state.character;
    let axis = character.intent.axis();

    if axis != 0.0 {
        let speed = if character.on_ground() {
            config.move_speed
        } else {
            config.move_speed * config.airborne_speed_factor
        };
        character.position.x += axis * speed;
    }

    let max_x = (state.arena.x - character.size.x).max(0.0);
    character.position.x = character.position.x.clamp(0.0, max_x);
}

/// Record a key press/release. Ignored unless playing.
pub fn set_intent(state: &mut GameState, direction: Direction, held: bool) -> bool {
    if !state.match_state.is_playing() {
        return false;
    }
    state.character.intent.set(direction, held);
    true
}
