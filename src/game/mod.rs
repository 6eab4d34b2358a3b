pub mod constants;
pub mod state;
pub mod systems;
pub mod scheduler;
pub mod game_loop;
pub mod match_result;
pub mod snapshot;
pub mod input_buffer;
