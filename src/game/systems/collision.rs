//! Character/obstacle collision

use crate::game::state::GameState;

/// True if the character overlaps an active obstacle
///
/// Hidden obstacles never collide.
pub fn check(state: &GameState) -> bool {
    if !state.obstacle.active {
        return false;
    }
    state.character.bounds().overlaps(&state.obstacle.bounds())
}
