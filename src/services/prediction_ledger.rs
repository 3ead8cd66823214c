use std::sync::Arc;
use uuid::Uuid;

use crate::db::store::{PredictionStore, StoreError};
use crate::models::matches::MatchLink;
use crate::models::prediction::{
    NewPrediction, PredictionFilter, PredictionView, SubmissionOutcome, MAX_USERNAME_LEN,
};
use crate::models::score::Score;
use crate::services::error::ServiceError;

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
const MAX_HISTORY_LIMIT: i64 = 50;

/// Records predictions and enforces one prediction per user and match.
pub struct PredictionLedger {
    store: Arc<dyn PredictionStore>,
}

impl PredictionLedger {
    pub fn new(store: Arc<dyn PredictionStore>) -> Self {
        Self { store }
    }

    pub async fn has_prediction(&self, user_id: i64, match_id: Uuid) -> Result<bool, ServiceError> {
        let mut tx = self.store.begin().await?;
        let link = match tx.fetch_match(match_id).await? {
            Some(fixture) => MatchLink::for_match(&fixture),
            None => return Ok(false),
        };
        Ok(tx.find_prediction(user_id, link).await?.is_some())
    }

    /// Store a user's prediction unless they already made one for the match.
    ///
    /// The lookup before the insert only saves a round trip; the unique
    /// `(user_id, match_id)` constraint decides races between concurrent
    /// submissions.
    #[tracing::instrument(name = "Submit prediction", skip(self, display_name))]
    pub async fn submit_prediction(
        &self,
        user_id: i64,
        display_name: &str,
        match_id: Uuid,
        raw_score: &str,
    ) -> Result<SubmissionOutcome, ServiceError> {
        let score = Score::parse(raw_score)?;
        let username = display_name.trim();
        if username.is_empty() {
            return Err(ServiceError::validation("Display name cannot be empty"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ServiceError::validation(format!(
                "Display name cannot exceed {} characters",
                MAX_USERNAME_LEN
            )));
        }

        let mut tx = self.store.begin().await?;
        let fixture = tx
            .fetch_match(match_id)
            .await?
            .ok_or(ServiceError::NotFound("Match"))?;
        if !fixture.is_active() {
            return Err(ServiceError::validation(format!(
                "{} is closed and no longer accepts predictions",
                fixture.name
            )));
        }

        let link = MatchLink::for_match(&fixture);
        if let Some(existing) = tx.find_prediction(user_id, link.clone()).await? {
            tracing::info!("Duplicate prediction from @{} for {} rejected", username, fixture.name);
            return Ok(SubmissionOutcome::AlreadyExists(existing));
        }

        let inserted = tx
            .insert_prediction(NewPrediction {
                user_id,
                username: username.to_string(),
                match_id: Some(fixture.id),
                match_name: fixture.name.clone(),
                score,
            })
            .await;

        match inserted {
            Ok(prediction) => {
                tx.commit().await?;
                tracing::info!(
                    "✅ New prediction saved: @{} - {} - {}",
                    prediction.username,
                    prediction.match_name,
                    prediction.score
                );
                Ok(SubmissionOutcome::Created(prediction))
            }
            Err(StoreError::UniqueViolation(constraint)) => {
                // Lost the race; the failed statement poisons this transaction
                drop(tx);
                tracing::info!("Concurrent duplicate prediction from @{} caught by {}", username, constraint);
                let mut tx = self.store.begin().await?;
                let existing = tx
                    .find_prediction(user_id, link)
                    .await?
                    .ok_or(ServiceError::Storage(StoreError::UniqueViolation(constraint)))?;
                Ok(SubmissionOutcome::AlreadyExists(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A user's latest predictions with the current state of their matches.
    pub async fn list_user_predictions(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<PredictionView>, ServiceError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
        let mut tx = self.store.begin().await?;
        let page = tx
            .browse_predictions(PredictionFilter {
                user_id: Some(user_id),
                limit,
                ..Default::default()
            })
            .await?;
        Ok(page.items)
    }
}
