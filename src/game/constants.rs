/// Fixed-timestep constants. Velocities and speeds are in pixels per tick.
pub mod physics {
    /// Update tick rate in Hz
    pub const TICK_RATE: u32 = 50;
    /// Tick duration in milliseconds
    pub const TICK_DURATION_MS: u64 = 1000 / TICK_RATE as u64;
    /// Downward acceleration applied every tick (same constant while rising and falling)
    pub const GRAVITY: f32 = 0.5;
    /// Upward velocity set by a jump
    pub const JUMP_VELOCITY: f32 = 11.0;
    /// Resting height of the character
    pub const GROUND_LEVEL: f32 = 0.0;
}

/// Arena dimensions
pub mod arena {
    pub const WIDTH: f32 = 800.0;
    pub const HEIGHT: f32 = 300.0;
}

/// Character constants
pub mod character {
    pub const WIDTH: f32 = 60.0;
    pub const HEIGHT: f32 = 60.0;
    /// Initial distance from the arena's left edge
    pub const START_X: f32 = 50.0;
    /// Horizontal speed on the ground
    pub const MOVE_SPEED: f32 = 5.0;
    /// Horizontal speed multiplier while airborne
    pub const AIRBORNE_SPEED_FACTOR: f32 = 0.5;
}

/// Obstacle constants
pub mod obstacle {
    pub const WIDTH: f32 = 60.0;
    pub const HEIGHT: f32 = 60.0;
    /// Sweep policy: horizontal distance covered per tick
    pub const SWEEP_SPEED: f32 = 5.0;
    /// Minimum delay before the next spawn (inclusive)
    pub const SPAWN_DELAY_MIN_MS: u64 = 1000;
    /// Maximum delay before the next spawn (exclusive)
    pub const SPAWN_DELAY_MAX_MS: u64 = 3000;
    /// Waypoint policy: minimum transit duration (inclusive)
    pub const TRANSIT_MIN_MS: u64 = 1000;
    /// Waypoint policy: maximum transit duration (exclusive)
    pub const TRANSIT_MAX_MS: u64 = 2500;
}

/// Match scoring
pub mod score {
    /// Score increments by one every interval while playing
    pub const INTERVAL_MS: u64 = 1000;
}

/// Presentation defaults
pub mod render {
    /// Emit a snapshot every N update ticks (5 = 10 Hz at 50 Hz ticks)
    pub const SNAPSHOT_EVERY_TICKS: u64 = 5;
}

/// Highest point reached by a jump under the discrete integrator
///
/// Velocity is reduced before position is integrated, so the apex is
/// the sum of `v - k*g` over every step where that term is still positive.
pub fn jump_apex(jump_velocity: f32, gravity: f32) -> f32 {
    if gravity <= 0.0 || jump_velocity <= 0.0 {
        return 0.0;
    }
    let mut velocity = jump_velocity;
    let mut height = 0.0;
    loop {
        velocity -= gravity;
        if velocity <= 0.0 {
            return height;
        }
        height += velocity;
    }
}
