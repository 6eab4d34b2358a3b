//! Presentation and status sinks
//!
//! The engine only produces numbers. A `GameSink` turns events and snapshots
//! into something visible: JSON lines for a frontend, or log output.

use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};

use crate::game::game_loop::GameLoopEvent;
use crate::game::snapshot::GameSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Sink write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sink serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives engine output
pub trait GameSink {
    /// Called for every engine event, in order
    fn on_event(&mut self, event: &GameLoopEvent) -> Result<(), SinkError>;

    /// Called with a fresh snapshot at the render cadence
    fn render(&mut self, snapshot: &GameSnapshot) -> Result<(), SinkError>;
}

#[derive(Serialize)]
struct SnapshotLine<'a> {
    snapshot: &'a GameSnapshot,
}

/// One JSON object per line
///
/// Events are written as `{"event": "...", ...}`, snapshots as `{"snapshot": {...}}`.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> GameSink for JsonLinesSink<W> {
    fn on_event(&mut self, event: &GameLoopEvent) -> Result<(), SinkError> {
        self.write_line(event)
    }

    fn render(&mut self, snapshot: &GameSnapshot) -> Result<(), SinkError> {
        self.write_line(&SnapshotLine { snapshot })
    }
}

/// Status output through `tracing`
#[derive(Debug, Default)]
pub struct LogSink;

impl GameSink for LogSink {
    fn on_event(&mut self, event: &GameLoopEvent) -> Result<(), SinkError> {
        match event {
            GameLoopEvent::MatchStarted { match_id } => info!("Match {} started", match_id),
            GameLoopEvent::ScoreChanged { score } => info!("Score: {}", score),
            GameLoopEvent::MatchEnded { result } => info!(
                "Game over! Final score: {} ({} obstacles dodged, {}ms survived)",
                result.final_score,
                result.obstacles_dodged,
                result.survived_ms()
            ),
            other => debug!("{:?}", other),
        }
        Ok(())
    }

    fn render(&mut self, snapshot: &GameSnapshot) -> Result<(), SinkError> {
        debug!(
            "tick {} character=({:.1}, {:.1}) obstacle={:?}",
            snapshot.tick,
            snapshot.character.position.x,
            snapshot.character.position.y,
            snapshot.obstacle.as_ref().map(|o| o.position),
        );
        Ok(())
    }
}
