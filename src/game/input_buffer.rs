//! Lock-free input buffer between the input layer and the game loop
//!
//! Uses crossbeam-channel so input sources (stdin reader, tests, bots) can
//! submit commands without touching engine state; the session drains the
//! queue at the start of each tick.

use std::str::FromStr;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::game::state::Direction;

/// Discrete input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputCommand {
    /// Jump (ignored mid-air or when not playing)
    Jump,
    /// Direction key pressed
    MoveStart(Direction),
    /// Direction key released
    MoveStop(Direction),
    /// Start a new match (ignored while playing)
    Restart,
    /// Single-key control: restart when not playing, jump otherwise
    Action,
}

/// Error for unrecognized input tokens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown input '{0}'")]
pub struct ParseInputError(String);

impl FromStr for InputCommand {
    type Err = ParseInputError;

    /// Text tokens: `jump`, `left`, `right`, `-left`, `-right`, `restart`, `space`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        let (released, key) = match token.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, token.as_str()),
        };

        let direction = match key {
            "left" | "a" => Some(Direction::Left),
            "right" | "d" => Some(Direction::Right),
            _ => None,
        };

        match (direction, released, key) {
            (Some(dir), false, _) => Ok(Self::MoveStart(dir)),
            (Some(dir), true, _) => Ok(Self::MoveStop(dir)),
            (None, false, "jump" | "up" | "w") => Ok(Self::Jump),
            (None, false, "restart" | "r") => Ok(Self::Restart),
            (None, false, "space" | "action" | "") => Ok(Self::Action),
            _ => Err(ParseInputError(s.trim().to_string())),
        }
    }
}

/// Lock-free input buffer using bounded channel
pub struct InputBuffer {
    sender: Sender<InputCommand>,
    receiver: Receiver<InputCommand>,
    capacity: usize,
}

impl InputBuffer {
    /// Create a new input buffer with given capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Create a new sender handle for an input source
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Drain all pending commands for this tick, oldest first
    pub fn drain(&self) -> Vec<InputCommand> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        // A human produces a few events per tick at most
        Self::new(256)
    }
}

/// Clonable sender handle for input sources
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputCommand>,
}

impl InputSender {
    /// Submit a command (non-blocking)
    #[inline]
    pub fn try_send(&self, command: InputCommand) -> Result<(), InputBufferError> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => InputBufferError::Full,
            TrySendError::Disconnected(_) => InputBufferError::Disconnected,
        })
    }
}

/// Input buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputBufferError {
    #[error("Input buffer full")]
    Full,
    #[error("Input buffer disconnected (game loop stopped)")]
    Disconnected,
}
