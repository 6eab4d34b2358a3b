//! Match result and history
//!
//! Computes the final result of a match and keeps a short history for the status sink.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::game::constants::physics::TICK_DURATION_MS;
use crate::game::state::{GameState, MatchId, MatchPhase};
use crate::game::systems::collision;

/// Match result information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: Option<MatchId>,
    /// Whole seconds survived
    pub final_score: u32,
    /// Update ticks processed before the end
    pub ticks: u64,
    pub obstacles_dodged: u32,
    pub reason: MatchEndReason,
}

impl MatchResult {
    /// Simulated time survived in milliseconds
    pub fn survived_ms(&self) -> u64 {
        self.ticks * TICK_DURATION_MS
    }
}

/// Reason why match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEndReason {
    /// Character touched the obstacle
    Collision,
    /// Match was stopped from outside (shutdown)
    Cancelled,
}

/// Determine match result from game state
pub fn determine_result(state: &GameState, reason: MatchEndReason) -> MatchResult {
    MatchResult {
        match_id: state.match_state.match_id,
        final_score: state.match_state.score,
        ticks: state.match_state.ticks,
        obstacles_dodged: state.match_state.obstacles_dodged,
        reason,
    }
}

/// Check if match should end
pub fn check_match_end(state: &GameState) -> Option<MatchEndReason> {
    if state.match_state.phase != MatchPhase::Playing {
        return None;
    }
    collision::check(state).then_some(MatchEndReason::Collision)
}

/// Most recent results, newest last
#[derive(Debug, Clone)]
pub struct MatchHistory {
    results: VecDeque<MatchResult>,
    capacity: usize,
    best_score: u32,
}

impl MatchHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            results: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            best_score: 0,
        }
    }

    /// Record a finished match. Returns true if it set a new best score.
    pub fn record(&mut self, result: MatchResult) -> bool {
        let new_best = result.final_score > self.best_score;
        if new_best {
            self.best_score = result.final_score;
        }
        if self.results.len() == self.capacity {
            self.results.pop_front();
        }
        self.results.push_back(result);
        new_best
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn last(&self) -> Option<&MatchResult> {
        self.results.back()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter()
    }
}

impl Default for MatchHistory {
    fn default() -> Self {
        Self::new(20)
    }
}
