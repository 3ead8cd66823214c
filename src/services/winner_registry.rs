use std::sync::Arc;
use uuid::Uuid;

use crate::db::store::PredictionStore;
use crate::models::prediction::MAX_USERNAME_LEN;
use crate::models::winner::{DrawStatus, NewWinner, Winner, WinnerEntry, MANUAL_WINNING_SCORE};
use crate::services::error::ServiceError;

/// Admin-side winner management outside of resolution and draws.
pub struct WinnerRegistry {
    store: Arc<dyn PredictionStore>,
}

impl WinnerRegistry {
    pub fn new(store: Arc<dyn PredictionStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "Add manual winner", skip(self))]
    pub async fn add_manual_winner(
        &self,
        match_id: Uuid,
        user_id: Option<i64>,
        username: &str,
    ) -> Result<Winner, ServiceError> {
        let username = username.trim().trim_start_matches('@');
        if username.is_empty() {
            return Err(ServiceError::validation("Username cannot be empty"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ServiceError::validation(format!(
                "Username cannot exceed {} characters",
                MAX_USERNAME_LEN
            )));
        }

        let mut tx = self.store.begin().await?;
        let fixture = tx
            .fetch_match(match_id)
            .await?
            .ok_or(ServiceError::NotFound("Match"))?;

        let winner = tx
            .insert_winner(NewWinner {
                match_id,
                user_id,
                username: username.to_string(),
                winning_score: MANUAL_WINNING_SCORE.to_string(),
                status: DrawStatus::Manual,
            })
            .await?;
        tx.commit().await?;

        tracing::info!("✅ Manual winner added: @{} - {}", winner.username, fixture.name);
        Ok(winner)
    }

    #[tracing::instrument(name = "Remove winner", skip(self))]
    pub async fn remove_winner(&self, winner_id: Uuid) -> Result<Winner, ServiceError> {
        let mut tx = self.store.begin().await?;
        let winner = tx
            .fetch_winner(winner_id)
            .await?
            .ok_or(ServiceError::NotFound("Winner"))?;
        tx.delete_winner(winner_id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Winner removed: @{} ({})", winner.username, winner.status);
        Ok(winner)
    }

    /// Winners of one match: draw winners first, then undrawn, then the rest.
    pub async fn winners_for_match(&self, match_id: Uuid) -> Result<Vec<Winner>, ServiceError> {
        let mut tx = self.store.begin().await?;
        tx.fetch_match(match_id)
            .await?
            .ok_or(ServiceError::NotFound("Match"))?;

        let mut winners = tx.winners_for_match(match_id).await?;
        sort_for_display(&mut winners);
        Ok(winners)
    }

    pub async fn winner_board(&self) -> Result<Vec<WinnerEntry>, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.winner_board().await?)
    }
}

pub fn sort_for_display(winners: &mut [Winner]) {
    winners.sort_by(|a, b| {
        a.status
            .display_rank()
            .cmp(&b.status.display_rank())
            .then(a.created_at.cmp(&b.created_at))
    });
}
