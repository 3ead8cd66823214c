// src/models/winner.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use std::fmt;

use crate::models::score::Score;

/// Text stored as the winning score of a manually added winner.
pub const MANUAL_WINNING_SCORE: &str = "manual";

#[derive(Debug, FromRow, Serialize, Deserialize, Clone, PartialEq)]
pub struct Winner {
    pub id: Uuid,
    pub match_id: Uuid,
    /// Manually added winners may not be tied to a chat user
    pub user_id: Option<i64>,
    pub username: String,
    pub winning_score: String,
    pub status: DrawStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DrawStatus {
    Pending,
    Automatic,
    Won,
    Lost,
    Manual,
}

impl DrawStatus {
    pub const ELIGIBLE: [DrawStatus; 2] = [DrawStatus::Automatic, DrawStatus::Pending];

    pub fn is_eligible(&self) -> bool {
        Self::ELIGIBLE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrawStatus::Pending => "pending",
            DrawStatus::Automatic => "automatic",
            DrawStatus::Won => "won",
            DrawStatus::Lost => "lost",
            DrawStatus::Manual => "manual",
        }
    }

    /// Ordering used when listing the winners of a single match
    pub fn display_rank(&self) -> u8 {
        match self {
            DrawStatus::Won => 1,
            DrawStatus::Automatic => 2,
            DrawStatus::Pending => 3,
            DrawStatus::Manual | DrawStatus::Lost => 4,
        }
    }
}

impl fmt::Display for DrawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewWinner {
    pub match_id: Uuid,
    pub user_id: Option<i64>,
    pub username: String,
    pub winning_score: String,
    pub status: DrawStatus,
}

/// Which winners a draw picks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPool {
    /// Eligible winners of one match
    Match(Uuid),
    /// Eligible winners across every match. Like a match draw this skips
    /// winners that are already `won`, `lost` or `manual` instead of sampling
    /// every winner row, so a finished global draw is not repeated.
    Global,
}

#[derive(Debug, Deserialize)]
pub struct DrawRequest {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DrawResult {
    pub pool_size: usize,
    pub selected: Vec<Winner>,
    pub not_selected: usize,
}

#[derive(Debug, Deserialize)]
pub struct ManualWinnerRequest {
    pub user_id: Option<i64>,
    pub username: String,
}

/// A winner with the match it was won on.
#[derive(Debug, FromRow, Serialize, Clone)]
pub struct WinnerEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub winner: Winner,
    pub match_name: String,
    pub true_score: Option<Score>,
}
