use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::settings::ResolutionSettings;
use crate::db::store::{PredictionStore, StoreTx};
use crate::models::matches::{Match, MatchLink};
use crate::models::prediction::Prediction;
use crate::models::score::Score;
use crate::models::winner::{DrawStatus, NewWinner};
use crate::services::error::ServiceError;

/// Turns a match's true score into its winner set.
pub struct OutcomeResolver {
    store: Arc<dyn PredictionStore>,
    settings: ResolutionSettings,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ResolutionReport {
    pub match_id: Uuid,
    pub true_score: Score,
    pub winners_created: usize,
    pub winners_removed: u64,
    pub manual_winners_kept: usize,
    /// Legacy name-only predictions that were linked to the match id
    pub legacy_links: usize,
}

impl OutcomeResolver {
    pub fn new(store: Arc<dyn PredictionStore>, settings: ResolutionSettings) -> Self {
        Self { store, settings }
    }

    /// Recompute the winners of a match from its current true score.
    #[tracing::instrument(name = "Resolve match winners", skip(self))]
    pub async fn resolve_match(&self, match_id: Uuid) -> Result<ResolutionReport, ServiceError> {
        let mut tx = self.store.begin().await?;
        let fixture = tx
            .fetch_match(match_id)
            .await?
            .ok_or(ServiceError::NotFound("Match"))?;

        let report = self.resolve_in(tx.as_mut(), &fixture, None).await?;
        tx.commit().await?;

        Ok(report)
    }

    /// Runs inside the caller's transaction so that a match update and its
    /// winner recomputation commit or roll back together.
    pub(crate) async fn resolve_in(
        &self,
        tx: &mut dyn StoreTx,
        fixture: &Match,
        previous_name: Option<&str>,
    ) -> Result<ResolutionReport, ServiceError> {
        let true_score = fixture
            .true_score
            .clone()
            .ok_or_else(|| ServiceError::validation("Set the true score of the match before determining winners"))?;

        let mut link = MatchLink::for_match(fixture);
        if let Some(previous) = previous_name {
            link = link.with_previous_name(previous);
        }

        let candidates = tx.predictions_for_match(link).await?;
        let correct = select_winners(&candidates, &true_score);

        let keep_manual = self.settings.preserve_manual_winners;
        let winners_removed = tx.delete_winners(fixture.id, keep_manual).await?;

        let kept_users: HashSet<i64> = if keep_manual {
            tx.winners_for_match(fixture.id)
                .await?
                .iter()
                .filter_map(|w| w.user_id)
                .collect()
        } else {
            HashSet::new()
        };

        let mut winners_created = 0;
        for prediction in correct.iter().filter(|p| !kept_users.contains(&p.user_id)) {
            tx.insert_winner(NewWinner {
                match_id: fixture.id,
                user_id: Some(prediction.user_id),
                username: prediction.username.clone(),
                winning_score: prediction.score.to_string(),
                status: DrawStatus::Automatic,
            })
            .await?;
            winners_created += 1;
            tracing::debug!("Winner added: @{} - {}", prediction.username, prediction.score);
        }

        let to_link = legacy_rows_to_link(&candidates);
        for prediction_id in &to_link {
            tx.link_prediction(*prediction_id, fixture.id).await?;
        }

        if winners_created == 0 {
            tracing::info!("ℹ️ No correct predictions for {} ({})", fixture.name, true_score);
        } else {
            tracing::info!("🎉 {} winners determined for {} ({})", winners_created, fixture.name, true_score);
        }

        Ok(ResolutionReport {
            match_id: fixture.id,
            true_score,
            winners_created,
            winners_removed,
            manual_winners_kept: kept_users.len(),
            legacy_links: to_link.len(),
        })
    }
}

/// Predictions whose text equals the true score exactly, one per user.
///
/// `candidates` must be ordered oldest first; the oldest matching row of a
/// user is kept.
pub fn select_winners<'a>(candidates: &'a [Prediction], true_score: &Score) -> Vec<&'a Prediction> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|p| &p.score == true_score)
        .filter(|p| seen.insert(p.user_id))
        .collect()
}

/// Legacy rows that can take the match id without breaking the one
/// prediction per user and match rule: the oldest legacy row of every user
/// that has no id-linked row yet.
pub fn legacy_rows_to_link(candidates: &[Prediction]) -> Vec<Uuid> {
    let mut linked_users: HashSet<i64> = candidates
        .iter()
        .filter(|p| p.match_id.is_some())
        .map(|p| p.user_id)
        .collect();

    candidates
        .iter()
        .filter(|p| p.match_id.is_none())
        .filter(|p| linked_users.insert(p.user_id))
        .map(|p| p.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn prediction(user_id: i64, score: &str, match_id: Option<Uuid>, minutes_ago: i64) -> Prediction {
        Prediction {
            id: Uuid::new_v4(),
            user_id,
            username: format!("user{}", user_id),
            match_id,
            match_name: "Galatasaray-Fenerbahce".to_string(),
            score: Score::parse(score).unwrap(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn only_exact_scores_win() {
        let match_id = Some(Uuid::new_v4());
        let candidates = vec![
            prediction(1, "2-1", match_id, 30),
            prediction(2, "02-1", match_id, 20),
            prediction(3, "1-2", match_id, 10),
            prediction(4, "2-1", match_id, 5),
        ];

        let winners = select_winners(&candidates, &Score::parse("2-1").unwrap());
        let users: Vec<i64> = winners.iter().map(|p| p.user_id).collect();
        assert_eq!(users, vec![1, 4]);
    }

    #[test]
    fn a_user_wins_once_even_with_legacy_duplicates() {
        let match_id = Some(Uuid::new_v4());
        let candidates = vec![
            prediction(1, "2-1", None, 30),
            prediction(1, "2-1", match_id, 20),
        ];

        let winners = select_winners(&candidates, &Score::parse("2-1").unwrap());
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].match_id, None);
    }

    #[test]
    fn no_match_means_no_winners() {
        let candidates = vec![prediction(1, "0-0", Some(Uuid::new_v4()), 1)];
        assert!(select_winners(&candidates, &Score::parse("3-1").unwrap()).is_empty());
    }

    #[test]
    fn legacy_rows_are_linked_once_per_unlinked_user() {
        let match_id = Some(Uuid::new_v4());
        let linked = prediction(1, "1-0", match_id, 40);
        let legacy_of_linked_user = prediction(1, "2-0", None, 30);
        let first_legacy = prediction(2, "3-0", None, 20);
        let second_legacy = prediction(2, "4-0", None, 10);

        let to_link = legacy_rows_to_link(&[linked, legacy_of_linked_user, first_legacy.clone(), second_legacy]);
        assert_eq!(to_link, vec![first_legacy.id]);
    }
}
