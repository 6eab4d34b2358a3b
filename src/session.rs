//! Game session and its driver task
//!
//! A `GameSession` couples one `GameLoop` with its input buffer, presentation
//! sink, metrics and match history. `start_game_loop` drives it from a tokio
//! interval, feeding the real elapsed time to the engine's virtual clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::{ConfigError, GameConfig};
use crate::game::constants::physics;
use crate::game::game_loop::{GameLoop, GameLoopEvent};
use crate::game::input_buffer::{InputBuffer, InputSender};
use crate::game::match_result::{MatchEndReason, MatchHistory, MatchResult};
use crate::game::state::MatchPhase;
use crate::metrics::Metrics;
use crate::sink::GameSink;

pub type BoxedSink = Box<dyn GameSink + Send + Sync>;

pub struct GameSession {
    pub game_loop: GameLoop,
    input: InputBuffer,
    sink: BoxedSink,
    metrics: Arc<Metrics>,
    history: MatchHistory,
    snapshot_every_ticks: u64,
    /// Update tick and phase of the last rendered snapshot
    last_render: Option<(u64, MatchPhase)>,
}

impl GameSession {
    /// Fails if `config` does not validate
    pub fn new(config: GameConfig, sink: BoxedSink, metrics: Arc<Metrics>) -> Result<Self, ConfigError> {
        let snapshot_every_ticks = config.snapshot_every_ticks.max(1);
        Ok(Self {
            game_loop: GameLoop::try_new(config)?,
            input: InputBuffer::default(),
            sink,
            metrics,
            history: MatchHistory::default(),
            snapshot_every_ticks,
            last_render: None,
        })
    }

    /// Handle for input sources; inputs are applied at the next tick
    pub fn input_sender(&self) -> InputSender {
        self.input.sender()
    }

    pub fn history(&self) -> &MatchHistory {
        &self.history
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Start a match right away instead of waiting for an input
    pub fn start_match(&mut self) {
        self.game_loop.start();
        self.flush_events();
        self.render_if_due();
    }

    /// Run one session tick covering `elapsed_ms` of real time
    ///
    /// Pending inputs are applied first, then the engine catches up on every
    /// fixed step due in the window.
    pub fn tick(&mut self, elapsed_ms: u64) -> usize {
        let started = std::time::Instant::now();

        for command in self.input.drain() {
            let counter = if self.game_loop.apply_input(command) {
                &self.metrics.inputs_applied
            } else {
                &self.metrics.inputs_ignored
            };
            counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }

        self.game_loop.advance(elapsed_ms);
        let event_count = self.flush_events();
        self.render_if_due();

        self.metrics.record_tick_time(started.elapsed());
        event_count
    }

    /// End the running match, if any
    pub fn shutdown(&mut self) -> Option<MatchResult> {
        let result = self.game_loop.end_match(MatchEndReason::Cancelled);
        self.flush_events();
        self.render_if_due();
        result
    }

    /// Forward engine events to metrics, history and the sink
    fn flush_events(&mut self) -> usize {
        use std::sync::atomic::Ordering;

        let events = self.game_loop.drain_events();
        for event in &events {
            match event {
                GameLoopEvent::MatchStarted { .. } => {
                    self.metrics.matches_started.fetch_add(1, Ordering::Relaxed);
                    self.metrics.record_score(0);
                }
                GameLoopEvent::ScoreChanged { score } => self.metrics.record_score(*score),
                GameLoopEvent::ObstacleSpawned { .. } => {
                    self.metrics.obstacles_spawned.fetch_add(1, Ordering::Relaxed);
                }
                GameLoopEvent::ObstacleRetired { .. } => {
                    self.metrics.obstacles_dodged.fetch_add(1, Ordering::Relaxed);
                }
                GameLoopEvent::MatchEnded { result } => {
                    self.metrics.matches_ended.fetch_add(1, Ordering::Relaxed);
                    if self.history.record(result.clone()) {
                        info!("New best score: {}", result.final_score);
                    }
                }
                GameLoopEvent::Jumped => {}
            }

            if let Err(e) = self.sink.on_event(event) {
                warn!("Failed to deliver {:?} to sink: {}", event, e);
            }
        }
        events.len()
    }

    fn should_render(&self) -> bool {
        let match_state = &self.game_loop.state().match_state;
        match self.last_render {
            None => true,
            Some((ticks, phase)) => {
                phase != match_state.phase
                    || match_state.ticks < ticks
                    || match_state.ticks - ticks >= self.snapshot_every_ticks
            }
        }
    }

    fn render_if_due(&mut self) {
        if !self.should_render() {
            return;
        }
        let snapshot = self.game_loop.snapshot();
        self.last_render = Some((snapshot.tick, snapshot.phase));
        if let Err(e) = self.sink.render(&snapshot) {
            warn!("Failed to render tick {}: {}", snapshot.tick, e);
        }
    }
}

/// Spawn the background task that drives the session at the fixed tick rate
pub fn start_game_loop(session: Arc<RwLock<GameSession>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(physics::TICK_DURATION_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Game loop started at {} Hz", physics::TICK_RATE);
        let start = Instant::now();
        let mut last = start;
        let mut tick_count: u64 = 0;

        loop {
            ticker.tick().await;
            tick_count += 1;

            // Whole milliseconds only; the remainder carries into the next tick
            let elapsed_ms = last.elapsed().as_millis() as u64;
            last += Duration::from_millis(elapsed_ms);

            session.write().await.tick(elapsed_ms);

            if tick_count % (physics::TICK_RATE as u64 * 30) == 0 {
                let guard = session.read().await;
                let match_state = &guard.game_loop.state().match_state;
                let recent: Vec<u32> = guard.history.iter().map(|r| r.final_score).collect();
                let recent_avg = if recent.is_empty() {
                    0.0
                } else {
                    recent.iter().sum::<u32>() as f32 / recent.len() as f32
                };
                info!(
                    "Session: {}s, {:?} score {} | best {}, recent avg {:.1} over {} matches | tick p95 {}us",
                    start.elapsed().as_secs(),
                    match_state.phase,
                    match_state.score,
                    guard.history.best_score(),
                    recent_avg,
                    recent.len(),
                    guard.metrics.tick_time_p95_us.load(std::sync::atomic::Ordering::Relaxed),
                );
            }
        }
    })
}
