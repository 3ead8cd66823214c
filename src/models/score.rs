// src/models/score.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A scoreline in `home-away` form, e.g. `2-1`.
///
/// The original text is kept verbatim (after trimming surrounding whitespace)
/// because winners are decided by exact string equality: `02-1` and `2-1` are
/// different predictions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct Score(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid score '{0}': expected <home>-<away> with whole numbers, e.g. 2-1")]
pub struct ScoreFormatError(pub String);

/// Longest score text that fits the `score` columns
pub const MAX_SCORE_LEN: usize = 20;

impl Score {
    pub fn parse(raw: &str) -> Result<Self, ScoreFormatError> {
        let candidate = raw.trim();
        let (home, away) = candidate
            .split_once('-')
            .ok_or_else(|| ScoreFormatError(raw.to_string()))?;

        if candidate.len() <= MAX_SCORE_LEN && is_goal_count(home) && is_goal_count(away) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(ScoreFormatError(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_goal_count(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Score {
    type Error = ScoreFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Score::parse(&value)
    }
}

impl From<Score> for String {
    fn from(score: Score) -> Self {
        score.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_scorelines() {
        assert_eq!(Score::parse("0-0").unwrap().as_str(), "0-0");
        assert_eq!(Score::parse("12-7").unwrap().as_str(), "12-7");
        assert_eq!(Score::parse(" 3-1 ").unwrap().as_str(), "3-1");
    }

    #[test]
    fn keeps_leading_zeros_verbatim() {
        let padded = Score::parse("02-1").unwrap();
        assert_ne!(padded, Score::parse("2-1").unwrap());
    }

    #[test]
    fn rejects_malformed_scorelines() {
        for raw in ["2:1", "two-one", "2-1-0", "-1", "1-", "", "2 - 1", "-2-1", "+2-1", "٣-1"] {
            assert!(Score::parse(raw).is_err(), "'{}' should be rejected", raw);
        }
    }

    #[test]
    fn rejects_scorelines_longer_than_the_column() {
        assert!(Score::parse("1234567890-123456789").is_ok());
        assert!(Score::parse("12345678901234567890-1").is_err());
    }

    #[test]
    fn deserializing_validates() {
        let ok: Result<Score, _> = serde_json::from_str("\"4-2\"");
        assert!(ok.is_ok());
        let bad: Result<Score, _> = serde_json::from_str("\"4:2\"");
        assert!(bad.is_err());
    }
}
