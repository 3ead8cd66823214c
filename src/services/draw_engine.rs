use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::store::PredictionStore;
use crate::models::winner::{DrawPool, DrawResult, DrawStatus, Winner};
use crate::services::error::ServiceError;

/// Random prize draw among winners.
///
/// A draw is final: every eligible winner ends up either `won` or `lost`, so
/// running the same draw again finds an empty pool.
pub struct DrawEngine {
    store: Arc<dyn PredictionStore>,
}

impl DrawEngine {
    pub fn new(store: Arc<dyn PredictionStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "Run draw", skip(self))]
    pub async fn draw(&self, pool: DrawPool, count: usize) -> Result<DrawResult, ServiceError> {
        if count == 0 {
            return Err(ServiceError::validation("Draw count must be at least 1"));
        }

        let mut tx = self.store.begin().await?;
        if let DrawPool::Match(match_id) = pool {
            tx.fetch_match(match_id)
                .await?
                .ok_or(ServiceError::NotFound("Match"))?;
        }

        let eligible = tx.draw_pool(pool).await?;
        if eligible.len() < count {
            tracing::warn!(
                "❌ Not enough winners for the draw. Available: {}, requested: {}",
                eligible.len(),
                count
            );
            return Err(ServiceError::InsufficientPool {
                available: eligible.len(),
                requested: count,
            });
        }

        let chosen = pick_winners(&eligible, count, &mut rand::thread_rng());
        let (mut selected, not_selected): (Vec<Winner>, Vec<Winner>) =
            eligible.into_iter().partition(|w| chosen.contains(&w.id));

        tx.set_draw_status(not_selected.iter().map(|w| w.id).collect(), DrawStatus::Lost)
            .await?;
        tx.set_draw_status(selected.iter().map(|w| w.id).collect(), DrawStatus::Won)
            .await?;
        tx.commit().await?;

        for winner in selected.iter_mut() {
            winner.status = DrawStatus::Won;
        }

        tracing::info!(
            "🎉 Draw completed: {} of {} selected: {}",
            selected.len(),
            selected.len() + not_selected.len(),
            selected
                .iter()
                .map(|w| format!("@{}", w.username))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(DrawResult {
            pool_size: selected.len() + not_selected.len(),
            not_selected: not_selected.len(),
            selected,
        })
    }
}

/// Uniform sample of `count` distinct winner ids, without replacement.
pub fn pick_winners<R: Rng + ?Sized>(pool: &[Winner], count: usize, rng: &mut R) -> HashSet<Uuid> {
    pool.choose_multiple(rng, count).map(|w| w.id).collect()
}
