use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::settings::ResolutionSettings;
use crate::db::store::PredictionStore;
use crate::models::matches::{
    Match, MatchLink, MatchOverview, MatchStatus, MatchUpdate, NewMatch, MAX_MATCH_NAME_LEN, MAX_TEAM_NAME_LEN,
};
use crate::models::score::Score;
use crate::services::error::ServiceError;
use crate::services::outcome_resolver::{OutcomeResolver, ResolutionReport};

pub struct MatchRegistry {
    store: Arc<dyn PredictionStore>,
    resolver: OutcomeResolver,
}

#[derive(Debug, Serialize)]
pub struct MatchUpdateReport {
    #[serde(rename = "match")]
    pub fixture: Match,
    /// Present when the true score was set or changed by this update
    pub resolution: Option<ResolutionReport>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DeletionReport {
    pub match_id: Uuid,
    pub match_name: String,
    pub predictions_deleted: u64,
    pub winners_deleted: u64,
}

fn team_name(raw: &str, side: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::validation(format!("{} team name cannot be empty", side)));
    }
    if name.chars().count() > MAX_TEAM_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "{} team name cannot exceed {} characters",
            side, MAX_TEAM_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn display_name(home_team: &str, away_team: &str) -> Result<String, ServiceError> {
    let name = Match::display_name(home_team, away_team);
    if name.chars().count() > MAX_MATCH_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "Match name '{}' cannot exceed {} characters",
            name, MAX_MATCH_NAME_LEN
        )));
    }
    Ok(name)
}

fn optional_score(raw: Option<&str>) -> Result<Option<Score>, ServiceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => Ok(Some(Score::parse(text)?)),
        None => Ok(None),
    }
}

impl MatchRegistry {
    pub fn new(store: Arc<dyn PredictionStore>, settings: ResolutionSettings) -> Self {
        Self {
            resolver: OutcomeResolver::new(store.clone(), settings),
            store,
        }
    }

    #[tracing::instrument(name = "Create match", skip(self))]
    pub async fn create_match(
        &self,
        home_team: &str,
        away_team: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Match, ServiceError> {
        let home_team = team_name(home_team, "Home")?;
        let away_team = team_name(away_team, "Away")?;
        let name = display_name(&home_team, &away_team)?;

        let mut tx = self.store.begin().await?;
        let fixture = tx
            .insert_match(NewMatch {
                name,
                home_team,
                away_team,
                scheduled_at,
            })
            .await?;
        tx.commit().await?;

        tracing::info!("✅ New match added: {}", fixture.name);
        Ok(fixture)
    }

    pub async fn get_match(&self, id: Uuid) -> Result<Match, ServiceError> {
        let mut tx = self.store.begin().await?;
        tx.fetch_match(id).await?.ok_or(ServiceError::NotFound("Match"))
    }

    /// Apply an admin edit. Fields left out of `update` keep their stored
    /// values. A new or changed true score recomputes the winners
    /// in the same transaction; if that fails the edit is not saved either.
    #[tracing::instrument(name = "Update match", skip(self, update), fields(true_score = ?update.true_score))]
    pub async fn update_match(&self, id: Uuid, update: MatchUpdate) -> Result<MatchUpdateReport, ServiceError> {
        let home_team = team_name(&update.home_team, "Home")?;
        let away_team = team_name(&update.away_team, "Away")?;
        let name = display_name(&home_team, &away_team)?;
        let true_score = update
            .true_score
            .map(|raw| optional_score(raw.as_deref()))
            .transpose()?;

        let mut tx = self.store.begin().await?;
        let previous = tx
            .fetch_match(id)
            .await?
            .ok_or(ServiceError::NotFound("Match"))?;

        let fixture = Match {
            name,
            home_team,
            away_team,
            scheduled_at: update.scheduled_at.unwrap_or(previous.scheduled_at),
            status: update.status.unwrap_or(previous.status),
            true_score: true_score.unwrap_or_else(|| previous.true_score.clone()),
            updated_at: Utc::now(),
            ..previous.clone()
        };
        tx.save_match(fixture.clone()).await?;

        let score_changed = fixture.true_score.is_some() && fixture.true_score != previous.true_score;
        let resolution = if score_changed {
            tracing::info!(
                "🎯 True score updated: {} - {}",
                fixture.name,
                fixture.true_score.as_ref().map(Score::as_str).unwrap_or_default()
            );
            match self.resolver.resolve_in(tx.as_mut(), &fixture, Some(&previous.name)).await {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::error!("❌ Winner recomputation failed, match {} was not updated: {}", id, e);
                    return Err(e);
                }
            }
        } else {
            None
        };

        tx.commit().await?;

        Ok(MatchUpdateReport { fixture, resolution })
    }

    /// Active matches in the order users see them numbered.
    pub async fn list_active_matches(&self) -> Result<Vec<Match>, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.fetch_matches(Some(MatchStatus::Active)).await?)
    }

    pub async fn list_overview(&self) -> Result<Vec<MatchOverview>, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.match_overview().await?)
    }

    /// Delete a match together with its predictions and winners.
    #[tracing::instrument(name = "Delete match", skip(self))]
    pub async fn delete_match(&self, id: Uuid) -> Result<DeletionReport, ServiceError> {
        let mut tx = self.store.begin().await?;
        let fixture = tx
            .fetch_match(id)
            .await?
            .ok_or(ServiceError::NotFound("Match"))?;

        let predictions_deleted = tx.delete_predictions(MatchLink::for_match(&fixture)).await?;
        let winners_deleted = tx.delete_winners(id, false).await?;
        tx.delete_match(id).await?;
        tx.commit().await?;

        tracing::info!(
            "🗑️ Match deleted: {} (predictions: {}, winners: {})",
            fixture.name,
            predictions_deleted,
            winners_deleted
        );

        Ok(DeletionReport {
            match_id: id,
            match_name: fixture.name,
            predictions_deleted,
            winners_deleted,
        })
    }
}
