// src/models/matches.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use std::fmt;

use crate::models::score::Score;

pub const MAX_TEAM_NAME_LEN: usize = 100;
/// Length limit of the `home-away` display name
pub const MAX_MATCH_NAME_LEN: usize = 200;

#[derive(Debug, FromRow, Serialize, Deserialize, Clone, PartialEq)]
pub struct Match {
    pub id: Uuid,
    /// Display name, always `"{home_team}-{away_team}"`
    pub name: String,
    pub home_team: String,
    pub away_team: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: MatchStatus,
    pub true_score: Option<Score>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn display_name(home_team: &str, away_team: &str) -> String {
        format!("{}-{}", home_team, away_team)
    }

    pub fn is_active(&self) -> bool {
        self.status == MatchStatus::Active
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Closed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Active => "active",
            MatchStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row to insert when an admin creates a match.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub name: String,
    pub home_team: String,
    pub away_team: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// An admin edit of a match.
///
/// Teams are always sent. Every other field keeps its stored value when it is
/// left out of the request; an explicit `null` clears it.
#[derive(Debug, Deserialize, Clone)]
pub struct MatchUpdate {
    pub home_team: String,
    pub away_team: String,
    #[serde(default, deserialize_with = "present")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    /// An empty string clears the true score like `null` does
    #[serde(default, deserialize_with = "present")]
    pub true_score: Option<Option<String>>,
    pub status: Option<MatchStatus>,
}

// Tells a missing field (outer `None`) apart from an explicit `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Clone)]
pub struct CreateMatchRequest {
    pub home_team: String,
    pub away_team: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// A match together with how many predictions reference it.
#[derive(Debug, FromRow, Serialize, Clone)]
pub struct MatchOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fixture: Match,
    pub prediction_count: i64,
}

/// Identifies the predictions that belong to a match.
///
/// Rows carrying a `match_id` are linked by id only. Legacy rows without one
/// fall back to their stored match name, which may be the current or any
/// previous display name of the match.
#[derive(Debug, Clone)]
pub struct MatchLink {
    pub match_id: Uuid,
    pub legacy_names: Vec<String>,
}

impl MatchLink {
    pub fn for_match(fixture: &Match) -> Self {
        Self {
            match_id: fixture.id,
            legacy_names: vec![fixture.name.clone()],
        }
    }

    pub fn with_previous_name(mut self, previous: &str) -> Self {
        if !self.legacy_names.iter().any(|name| name == previous) {
            self.legacy_names.push(previous.to_string());
        }
        self
    }

    pub fn covers(&self, match_id: Option<Uuid>, match_name: &str) -> bool {
        match match_id {
            Some(id) => id == self.match_id,
            None => self.legacy_names.iter().any(|name| name == match_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_prefers_id_over_name() {
        let link = MatchLink {
            match_id: Uuid::new_v4(),
            legacy_names: vec!["Ajax-PSV".to_string()],
        };

        assert!(link.covers(Some(link.match_id), "Renamed-Fixture"));
        // Same name but linked to another match must not cross over
        assert!(!link.covers(Some(Uuid::new_v4()), "Ajax-PSV"));
        assert!(link.covers(None, "Ajax-PSV"));
        assert!(!link.covers(None, "Ajax-Feyenoord"));
    }

    #[test]
    fn previous_name_is_added_once() {
        let link = MatchLink {
            match_id: Uuid::new_v4(),
            legacy_names: vec!["A-B".to_string()],
        }
        .with_previous_name("A-B")
        .with_previous_name("A-C");

        assert_eq!(link.legacy_names, vec!["A-B".to_string(), "A-C".to_string()]);
    }

    #[test]
    fn omitted_edit_fields_are_told_apart_from_null() {
        let update: MatchUpdate = serde_json::from_value(serde_json::json!({
            "home_team": "Ajax",
            "away_team": "PSV",
            "true_score": null,
        }))
        .unwrap();

        assert_eq!(update.scheduled_at, None);
        assert_eq!(update.true_score, Some(None));
        assert_eq!(update.status, None);
    }
}
