// src/models/prediction.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::matches::MatchStatus;
use crate::models::score::Score;

pub const MAX_USERNAME_LEN: usize = 100;

#[derive(Debug, FromRow, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prediction {
    pub id: Uuid,
    pub user_id: i64,
    pub username: String,
    /// `None` only for legacy rows recorded before matches had ids
    pub match_id: Option<Uuid>,
    /// Match display name at submission time, kept for history
    pub match_name: String,
    pub score: Score,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_id: i64,
    pub username: String,
    pub match_id: Option<Uuid>,
    pub match_name: String,
    pub score: Score,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPredictionRequest {
    pub user_id: i64,
    pub username: String,
    pub match_id: Uuid,
    pub score: String,
}

/// Result of a submission that did not fail.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Created(Prediction),
    /// The user already predicted this match; the stored prediction is untouched
    AlreadyExists(Prediction),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PredictionOutcome {
    Pending,
    Correct,
    Wrong,
}

impl PredictionOutcome {
    pub fn judge(predicted: &Score, true_score: Option<&Score>) -> Self {
        match true_score {
            None => PredictionOutcome::Pending,
            Some(actual) if actual == predicted => PredictionOutcome::Correct,
            Some(_) => PredictionOutcome::Wrong,
        }
    }
}

/// A prediction joined with the current state of its match.
#[derive(Debug, Serialize, Clone)]
pub struct PredictionView {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub true_score: Option<Score>,
    pub match_status: Option<MatchStatus>,
    pub outcome: PredictionOutcome,
}

impl PredictionView {
    pub fn new(prediction: Prediction, true_score: Option<Score>, match_status: Option<MatchStatus>) -> Self {
        let outcome = PredictionOutcome::judge(&prediction.score, true_score.as_ref());
        Self { prediction, true_score, match_status, outcome }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PredictionFilter {
    pub user_id: Option<i64>,
    /// Case-insensitive substring of the stored match name
    pub match_name: Option<String>,
    /// Case-insensitive substring of the username
    pub username: Option<String>,
    pub outcome: Option<PredictionOutcome>,
    pub limit: i64,
    pub offset: i64,
}

/// Query string of the admin prediction browser.
#[derive(Debug, Deserialize, Default)]
pub struct PredictionQuery {
    pub page: Option<i64>,
    #[serde(rename = "match")]
    pub match_name: Option<String>,
    pub username: Option<String>,
    pub outcome: Option<PredictionOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Clone)]
pub struct PredictionPage {
    pub items: Vec<PredictionView>,
    pub total: i64,
}

#[derive(Debug, FromRow, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PredictionStats {
    pub total: i64,
    pub correct: i64,
    pub wrong: i64,
    pub pending: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judging_uses_exact_text() {
        let predicted = Score::parse("2-1").unwrap();
        assert_eq!(PredictionOutcome::judge(&predicted, None), PredictionOutcome::Pending);
        assert_eq!(
            PredictionOutcome::judge(&predicted, Some(&Score::parse("2-1").unwrap())),
            PredictionOutcome::Correct
        );
        assert_eq!(
            PredictionOutcome::judge(&predicted, Some(&Score::parse("02-1").unwrap())),
            PredictionOutcome::Wrong
        );
    }
}
