//! Game loop engine
//!
//! `GameLoop` owns the whole match: state, RNG and the scheduler holding the
//! three match timers (score tick, update tick, obstacle spawn). Driving code
//! only feeds elapsed time and input; every timer callback runs here, and
//! ending a match tears all timers down in one call.
//!
//! State machine: `Idle/GameOver -> start -> Playing -> collision -> GameOver`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{ConfigError, GameConfig};
use crate::game::constants::{physics::TICK_DURATION_MS, score};
use crate::game::input_buffer::InputCommand;
use crate::game::match_result::{check_match_end, determine_result, MatchEndReason, MatchResult};
use crate::game::scheduler::{Scheduler, TimerHandle, TimerKind};
use crate::game::snapshot::GameSnapshot;
use crate::game::state::{Direction, GameState, MatchId, MatchPhase, MoveIntent, ObstacleMotion};
use crate::game::systems::{movement, obstacle, physics};
use crate::game::systems::obstacle::ObstacleUpdate;

/// Events produced by the game loop for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameLoopEvent {
    MatchStarted { match_id: MatchId },
    ScoreChanged { score: u32 },
    Jumped,
    ObstacleSpawned { motion: ObstacleMotion },
    ObstacleRetired { next_spawn_ms: u64 },
    MatchEnded { result: MatchResult },
}

/// Handles for the timers armed by the current match
#[derive(Debug, Default)]
struct MatchTimers {
    score: Option<TimerHandle>,
    update: Option<TimerHandle>,
    spawn: Option<TimerHandle>,
}

/// The single owned engine
pub struct GameLoop {
    config: GameConfig,
    state: GameState,
    scheduler: Scheduler,
    rng: StdRng,
    /// Match epoch; bumped on every start so timers from earlier matches are ignored
    generation: u64,
    timers: MatchTimers,
    events: Vec<GameLoopEvent>,
    last_result: Option<MatchResult>,
}

impl GameLoop {
    /// Validate `config`, then build the engine
    pub fn try_new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Build the engine from an already validated config
    ///
    /// Spawning panics on empty random ranges and positions go NaN on
    /// non-finite floats; use `try_new` for untrusted configs.
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: GameState::new(&config),
            config,
            scheduler: Scheduler::new(),
            rng,
            generation: 0,
            timers: MatchTimers::default(),
            events: Vec::new(),
            last_result: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.match_state.phase
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state.match_state.is_playing()
    }

    pub fn score(&self) -> u32 {
        self.state.match_state.score
    }

    /// Result of the most recent finished match
    pub fn last_result(&self) -> Option<&MatchResult> {
        self.last_result.as_ref()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Virtual time in milliseconds since the loop was created
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Begin a fresh match
    ///
    /// Resets score, character and obstacle, then arms the score tick, the
    /// update tick and the first obstacle spawn. Any timers left from an
    /// earlier match are dropped first.
    pub fn start(&mut self) -> MatchId {
        self.scheduler.cancel_all();
        self.timers = MatchTimers::default();
        self.generation += 1;

        self.state.reset_entities();
        let match_id = Uuid::new_v4();
        self.state.match_state.match_id = Some(match_id);
        self.state.match_state.phase = MatchPhase::Playing;

        self.timers.score = Some(self.scheduler.schedule_repeating(
            TimerKind::ScoreTick,
            score::INTERVAL_MS,
            self.generation,
        ));
        self.timers.update = Some(self.scheduler.schedule_repeating(
            TimerKind::UpdateTick,
            TICK_DURATION_MS,
            self.generation,
        ));
        let first_spawn_ms = self.schedule_spawn();

        info!(
            "Match {} started (policy {:?}, first obstacle in {}ms)",
            match_id, self.config.obstacle_policy, first_spawn_ms
        );
        self.events.push(GameLoopEvent::MatchStarted { match_id });
        match_id
    }

    /// Start again from `Idle` or `GameOver`. Ignored while playing.
    pub fn restart(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }
        self.start();
        true
    }

    pub fn jump(&mut self) -> bool {
        let jumped = physics::jump(&mut self.state, &self.config);
        if jumped {
            self.events.push(GameLoopEvent::Jumped);
        }
        jumped
    }

    pub fn set_move_intent(&mut self, direction: Direction, held: bool) -> bool {
        movement::set_intent(&mut self.state, direction, held)
    }

    /// Apply one input command; returns whether it had any effect
    pub fn apply_input(&mut self, command: InputCommand) -> bool {
        match command {
            InputCommand::Jump => self.jump(),
            InputCommand::MoveStart(direction) => self.set_move_intent(direction, true),
            InputCommand::MoveStop(direction) => self.set_move_intent(direction, false),
            InputCommand::Restart => self.restart(),
            InputCommand::Action => {
                if self.is_playing() {
                    self.jump()
                } else {
                    self.restart()
                }
            }
        }
    }

    /// One fixed-timestep update: physics, movement, obstacle, collision
    ///
    /// Returns false (and does nothing) unless a match is in progress.
    pub fn update_tick(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state.match_state.ticks += 1;

        physics::update(&mut self.state, &self.config);
        movement::update(&mut self.state, &self.config);

        if obstacle::update(&mut self.state, TICK_DURATION_MS) == ObstacleUpdate::Retired {
            self.state.match_state.obstacles_dodged += 1;
            let next_spawn_ms = self.schedule_spawn();
            debug!("Obstacle retired, next spawn in {}ms", next_spawn_ms);
            self.events.push(GameLoopEvent::ObstacleRetired { next_spawn_ms });
        }

        if let Some(reason) = check_match_end(&self.state) {
            self.end_match(reason);
        }
        true
    }

    /// Add one second to the score. No-op unless playing.
    pub fn score_tick(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state.match_state.score += 1;
        self.events.push(GameLoopEvent::ScoreChanged {
            score: self.state.match_state.score,
        });
        true
    }

    /// Activate the obstacle now
    ///
    /// No-op if not playing or if the obstacle is already active. A successful
    /// spawn cancels any spawn still pending.
    pub fn spawn_obstacle(&mut self) -> bool {
        let Some(motion) = obstacle::spawn(&mut self.state, &self.config, &mut self.rng) else {
            return false;
        };
        if let Some(handle) = self.timers.spawn.take() {
            self.scheduler.cancel(handle);
        }
        debug!("Obstacle spawned: {:?}", motion);
        self.events.push(GameLoopEvent::ObstacleSpawned { motion });
        true
    }

    /// Arm the next obstacle spawn after a random delay, replacing any pending one
    fn schedule_spawn(&mut self) -> u64 {
        if let Some(handle) = self.timers.spawn.take() {
            self.scheduler.cancel(handle);
        }
        let delay = obstacle::random_spawn_delay(&self.config, &mut self.rng);
        self.state.obstacle.pending_spawn_ms = Some(delay);
        self.timers.spawn = Some(self.scheduler.schedule_once(
            TimerKind::ObstacleSpawn,
            delay,
            self.generation,
        ));
        delay
    }

    /// Stop the match: cancel every timer, freeze the obstacle, publish the result
    ///
    /// Returns None if no match was in progress.
    pub fn end_match(&mut self, reason: MatchEndReason) -> Option<MatchResult> {
        if !self.is_playing() {
            return None;
        }
        self.state.match_state.phase = MatchPhase::GameOver;

        let cancelled = self.scheduler.cancel_all();
        self.timers = MatchTimers::default();
        obstacle::freeze(&mut self.state);
        self.state.obstacle.pending_spawn_ms = None;
        self.state.character.intent = MoveIntent::default();

        let result = determine_result(&self.state, reason);
        info!(
            "Match {:?} ended ({:?}): score {}s, {} obstacles dodged, {} timers cancelled",
            result.match_id, reason, result.final_score, result.obstacles_dodged, cancelled
        );
        self.last_result = Some(result.clone());
        self.events.push(GameLoopEvent::MatchEnded {
            result: result.clone(),
        });
        Some(result)
    }

    /// Move virtual time forward by `elapsed_ms`, running every timer that comes due
    ///
    /// Returns the number of timer callbacks that ran.
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        let until = self.scheduler.now_ms() + elapsed_ms;
        let mut ran = 0;

        while let Some(fired) = self.scheduler.pop_due(until) {
            if fired.generation != self.generation || !self.is_playing() {
                debug!("Dropping stale {:?} timer from generation {}", fired.kind, fired.generation);
                self.scheduler.cancel(fired.handle);
                continue;
            }

            match fired.kind {
                TimerKind::ScoreTick => {
                    self.score_tick();
                }
                TimerKind::UpdateTick => {
                    self.update_tick();
                }
                TimerKind::ObstacleSpawn => {
                    if self.timers.spawn == Some(fired.handle) {
                        self.timers.spawn = None;
                    }
                    self.state.obstacle.pending_spawn_ms = None;
                    self.spawn_obstacle();
                }
            }
            ran += 1;
        }

        self.scheduler.advance_to(until);
        ran
    }

    /// Take all events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameLoopEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from_game_state(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObstaclePolicy;
    use crate::game::constants::{character, physics::GROUND_LEVEL};
    use crate::util::vec2::Vec2;
    use rand::Rng;

    fn create_loop(policy: ObstaclePolicy) -> GameLoop {
        GameLoop::new(GameConfig {
            obstacle_policy: policy,
            rng_seed: Some(1234),
            ..GameConfig::default()
        })
    }

    /// Put the active obstacle right on top of the character
    fn force_overlap(game: &mut GameLoop) {
        if !game.state().obstacle.active {
            assert!(game.spawn_obstacle());
        }
        let state = game.state_mut();
        state.obstacle.motion = None;
        state.obstacle.position = state.character.position + Vec2::new(10.0, 0.0);
    }

    #[test]
    fn test_new_loop_is_idle() {
        let mut game = create_loop(ObstaclePolicy::Waypoint);
        assert_eq!(game.phase(), MatchPhase::Idle);
        assert_eq!(game.score(), 0);
        assert!(game.scheduler().is_empty());

        // Nothing runs before the first start
        assert!(!game.update_tick());
        assert!(!game.score_tick());
        assert!(!game.spawn_obstacle());
        assert_eq!(game.advance(5000), 0);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_start_arms_three_timers() {
        let mut game = create_loop(ObstaclePolicy::Waypoint);
        let match_id = game.start();

        assert!(game.is_playing());
        assert_eq!(game.state().match_state.match_id, Some(match_id));
        assert_eq!(game.scheduler().armed_count(TimerKind::ScoreTick), 1);
        assert_eq!(game.scheduler().armed_count(TimerKind::UpdateTick), 1);
        assert_eq!(game.scheduler().armed_count(TimerKind::ObstacleSpawn), 1);

        let delay = game.state().obstacle.pending_spawn_ms.unwrap();
        assert!((1000..3000).contains(&delay));
        assert_eq!(
            game.drain_events(),
            vec![GameLoopEvent::MatchStarted { match_id }]
        );
    }

    #[test]
    fn test_score_counts_seconds() {
        let mut game = create_loop(ObstaclePolicy::Waypoint);
        game.start();

        // No obstacle can appear before the first second
        game.advance(999);
        assert_eq!(game.score(), 0);
        assert_eq!(game.state().match_state.ticks, 49);

        game.advance(1);
        assert_eq!(game.score(), 1);
        assert_eq!(game.state().match_state.ticks, 50);
    }

    #[test]
    fn test_first_spawn_after_delay() {
        let mut game = create_loop(ObstaclePolicy::Waypoint);
        game.start();
        let delay = game.state().obstacle.pending_spawn_ms.unwrap();
        game.drain_events();

        game.advance(delay - 1);
        assert!(!game.state().obstacle.active);

        game.advance(1);
        assert!(game.state().obstacle.active);
        assert!(game.state().obstacle.pending_spawn_ms.is_none());
        assert_eq!(game.scheduler().armed_count(TimerKind::ObstacleSpawn), 0);
        assert!(game
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameLoopEvent::ObstacleSpawned { .. })));
    }

    #[test]
    fn test_spawn_while_active_is_noop() {
        let mut game = create_loop(ObstaclePolicy::Sweep);
        game.start();
        assert!(game.spawn_obstacle());
        let position = game.state().obstacle.position;

        assert!(!game.spawn_obstacle());
        assert_eq!(game.state().obstacle.position, position);
        // The manual spawn replaced the pending one
        assert_eq!(game.scheduler().armed_count(TimerKind::ObstacleSpawn), 0);
    }

    #[test]
    fn test_collision_ends_match() {
        let mut game = create_loop(ObstaclePolicy::Waypoint);
        game.start();
        for _ in 0..3 {
            game.score_tick();
        }
        let score_before = game.score();
        force_overlap(&mut game);
        game.drain_events();

        assert!(game.update_tick());

        assert_eq!(game.phase(), MatchPhase::GameOver);
        assert!(game.scheduler().is_empty());
        let result = game.last_result().cloned().expect("result recorded");
        assert_eq!(result.reason, MatchEndReason::Collision);
        assert_eq!(result.final_score, score_before);
        assert_eq!(
            game.drain_events().last(),
            Some(&GameLoopEvent::MatchEnded { result })
        );
    }

    /// Running match with 50x50 boxes on the ground and a frozen active obstacle
    fn place_boxes(character_x: f32, obstacle_x: f32) -> GameLoop {
        let mut game = GameLoop::new(GameConfig {
            character_size: Vec2::new(50.0, 50.0),
            obstacle_size: Vec2::new(50.0, 50.0),
            rng_seed: Some(5),
            ..GameConfig::default()
        });
        game.start();
        assert!(game.spawn_obstacle());
        let state = game.state_mut();
        state.obstacle.motion = None;
        state.obstacle.position = Vec2::new(obstacle_x, GROUND_LEVEL);
        state.character.position = Vec2::new(character_x, GROUND_LEVEL);
        game
    }

    #[test]
    fn test_separated_boxes_keep_match_running() {
        // (0,0,50,50) against (60,0,110,50)
        let mut game = place_boxes(0.0, 60.0);

        assert!(game.update_tick());

        assert_eq!(game.phase(), MatchPhase::Playing);
        assert!(game.last_result().is_none());
        assert_eq!(game.scheduler().len(), 2);
    }

    #[test]
    fn test_touching_boxes_keep_match_running() {
        let mut game = place_boxes(0.0, 50.0);
        assert!(game.update_tick());
        assert_eq!(game.phase(), MatchPhase::Playing);
    }

    #[test]
    fn test_overlapping_boxes_end_match() {
        // (10,0,60,50) against (40,0,90,50)
        let mut game = place_boxes(10.0, 40.0);
        assert!(game.update_tick());
        assert_eq!(game.phase(), MatchPhase::GameOver);
    }

    #[test]
    fn test_try_new_rejects_bad_config() {
        let empty_transit = GameConfig {
            transit_min_ms: 1500,
            transit_max_ms: 1500,
            ..GameConfig::default()
        };
        assert!(matches!(
            GameLoop::try_new(empty_transit),
            Err(ConfigError::EmptyRange { name: "transit duration", .. })
        ));

        let nan_height = GameConfig {
            arena_height: f32::NAN,
            ..GameConfig::default()
        };
        assert!(matches!(
            GameLoop::try_new(nan_height),
            Err(ConfigError::NotFinite("arena_height"))
        ));

        let infinite_gravity = GameConfig {
            gravity: f32::INFINITY,
            ..GameConfig::default()
        };
        assert!(GameLoop::try_new(infinite_gravity).is_err());
    }

    #[test]
    fn test_try_new_accepts_defaults() {
        let mut game = GameLoop::try_new(GameConfig {
            rng_seed: Some(3),
            ..GameConfig::default()
        })
        .expect("default config is valid");
        game.start();
        game.advance(3000);
        assert!(game.state().character.position.y >= GROUND_LEVEL);
    }

    #[test]
    fn test_forced_ticks_after_end_are_noops() {
        let mut game = create_loop(ObstaclePolicy::Sweep);
        game.start();
        force_overlap(&mut game);
        game.advance(20);
        assert_eq!(game.phase(), MatchPhase::GameOver);

        let frozen = game.snapshot();
        assert!(!game.update_tick());
        assert!(!game.score_tick());
        assert!(!game.spawn_obstacle());
        assert!(!game.jump());
        assert_eq!(game.advance(60_000), 0);
        assert_eq!(game.snapshot(), frozen);
    }

    #[test]
    fn test_collision_mid_drain_stops_remaining_timers() {
        let mut game = create_loop(ObstaclePolicy::Sweep);
        game.start();
        force_overlap(&mut game);

        // The first update tick collides; the rest of the window must not run
        let ran = game.advance(10_000);
        assert_eq!(ran, 1);
        assert_eq!(game.state().match_state.ticks, 1);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut game = create_loop(ObstaclePolicy::Waypoint);
        let first_id = game.start();
        game.set_move_intent(Direction::Right, true);
        game.advance(2500);
        game.jump();
        game.advance(60);
        force_overlap(&mut game);
        game.advance(20);
        assert_eq!(game.phase(), MatchPhase::GameOver);
        assert!(game.score() > 0);

        assert!(game.restart());

        let state = game.state();
        assert_eq!(state.match_state.phase, MatchPhase::Playing);
        assert_eq!(state.match_state.score, 0);
        assert_eq!(state.match_state.ticks, 0);
        assert_ne!(state.match_state.match_id, Some(first_id));
        assert_eq!(state.character.position, Vec2::new(character::START_X, GROUND_LEVEL));
        assert_eq!(state.character.velocity_y, 0.0);
        assert_eq!(state.character.intent, MoveIntent::default());
        assert!(!state.obstacle.active);
        assert_eq!(game.scheduler().len(), 3);
    }

    #[test]
    fn test_restart_ignored_while_playing() {
        let mut game = create_loop(ObstaclePolicy::Waypoint);
        let match_id = game.start();
        game.advance(1000);

        assert!(!game.restart());
        assert_eq!(game.state().match_state.match_id, Some(match_id));
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn test_action_input_restarts_or_jumps() {
        let mut game = create_loop(ObstaclePolicy::Waypoint);

        // Idle: action starts a match
        assert!(game.apply_input(InputCommand::Action));
        assert!(game.is_playing());

        // Playing on the ground: action jumps
        assert!(game.apply_input(InputCommand::Action));
        assert_eq!(game.state().character.velocity_y, game.config().jump_velocity);

        // Mid-air: action does nothing
        game.advance(40);
        let velocity = game.state().character.velocity_y;
        assert!(!game.apply_input(InputCommand::Action));
        assert_eq!(game.state().character.velocity_y, velocity);
    }

    #[test]
    fn test_stale_generation_timer_is_dropped() {
        let mut game = create_loop(ObstaclePolicy::Sweep);
        game.start();
        force_overlap(&mut game);
        game.advance(20);
        assert_eq!(game.phase(), MatchPhase::GameOver);
        let stale_generation = game.generation;

        game.restart();
        // A spawn timer left over from the previous match
        game.scheduler
            .schedule_once(TimerKind::ObstacleSpawn, 5, stale_generation);

        game.advance(5);
        assert!(!game.state().obstacle.active);
        assert_eq!(game.scheduler().armed_count(TimerKind::ObstacleSpawn), 1);
    }

    #[test]
    fn test_end_match_cancelled() {
        // A sweep cannot reach the character within the first two seconds
        let mut game = create_loop(ObstaclePolicy::Sweep);
        assert!(game.end_match(MatchEndReason::Cancelled).is_none());

        game.start();
        game.advance(2000);
        let result = game.end_match(MatchEndReason::Cancelled).unwrap();
        assert_eq!(result.reason, MatchEndReason::Cancelled);
        assert_eq!(result.final_score, 2);
        assert!(game.scheduler().is_empty());
        assert!(game.end_match(MatchEndReason::Cancelled).is_none());
    }

    #[test]
    fn test_sweep_obstacle_can_be_jumped() {
        let mut game = create_loop(ObstaclePolicy::Sweep);
        game.start();
        assert!(game.spawn_obstacle());

        // Jump when the obstacle is about to reach the character
        let mut jumped = false;
        while game.is_playing() && game.state().obstacle.pending_spawn_ms.is_none() {
            let gap = game.state().obstacle.position.x - game.state().character.bounds().right;
            if !jumped && gap < 60.0 {
                jumped = game.jump();
            }
            game.advance(20);
        }

        assert!(game.is_playing(), "Character should clear the obstacle");
        assert_eq!(game.state().match_state.obstacles_dodged, 1);
    }

    #[test]
    fn test_random_play_holds_invariants() {
        for policy in [ObstaclePolicy::Sweep, ObstaclePolicy::Waypoint] {
            let mut game = create_loop(policy);
            let mut rng = StdRng::seed_from_u64(99);
            game.start();
            let max_x = game.config().character_max_x();

            for _ in 0..3000 {
                let command = match rng.gen_range(0..6) {
                    0 => InputCommand::Jump,
                    1 => InputCommand::MoveStart(Direction::Left),
                    2 => InputCommand::MoveStart(Direction::Right),
                    3 => InputCommand::MoveStop(Direction::Left),
                    4 => InputCommand::MoveStop(Direction::Right),
                    _ => InputCommand::Action,
                };
                game.apply_input(command);
                game.advance(rng.gen_range(1..80));

                let state = game.state();
                assert!(state.character.position.y >= GROUND_LEVEL);
                assert!((0.0..=max_x).contains(&state.character.position.x));

                let pending = game.scheduler().armed_count(TimerKind::ObstacleSpawn);
                if game.is_playing() {
                    // Either the obstacle is out, or exactly one spawn is pending
                    assert!(pending <= 1);
                    assert_eq!(state.obstacle.active, pending == 0);
                } else {
                    assert!(game.scheduler().is_empty());
                    game.restart();
                }
            }
        }
    }
}
