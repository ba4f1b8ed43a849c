//! Running match tallies
//!
//! Win/loss/tie counts for the session plus the most recent results.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::sim::lifecycle::{MatchResult, Winner};

/// Maximum number of finished matches kept in the history
pub const MAX_HISTORY: usize = 10;

/// One finished match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub winner: Winner,
    pub duration_ms: f64,
    /// Final center HP (left, right)
    pub center_hp: (f32, f32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub left_wins: u32,
    pub right_wins: u32,
    pub ties: u32,
    /// Newest first
    pub history: VecDeque<HistoryEntry>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally a result and push it onto the history, dropping the oldest past the limit
    pub fn record(&mut self, result: &MatchResult) {
        match result.winner {
            Winner::Left => self.left_wins += 1,
            Winner::Right => self.right_wins += 1,
            Winner::Tie => self.ties += 1,
        }
        self.history.push_front(HistoryEntry {
            winner: result.winner,
            duration_ms: result.duration_ms,
            center_hp: (result.center_hp.left, result.center_hp.right),
        });
        self.history.truncate(MAX_HISTORY);
    }

    pub fn matches_played(&self) -> u32 {
        self.left_wins + self.right_wins + self.ties
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.history.front()
    }
}
