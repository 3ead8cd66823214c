use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::store::PredictionStore;
use crate::models::common::PaginationInfo;
use crate::models::matches::{Match, MatchLink};
use crate::models::prediction::{Prediction, PredictionFilter, PredictionQuery, PredictionStats, PredictionView};
use crate::models::stats::DashboardStats;
use crate::services::error::ServiceError;

pub const PREDICTIONS_PER_PAGE: i64 = 50;

/// Read-only views backing the admin panel.
pub struct AdminOverview {
    store: Arc<dyn PredictionStore>,
}

#[derive(Debug, Serialize)]
pub struct MatchPredictions {
    #[serde(rename = "match")]
    pub fixture: Match,
    pub predictions: Vec<Prediction>,
    /// Predictions equal to the true score; empty while the match is unresolved
    pub correct: Vec<Prediction>,
}

#[derive(Debug, Serialize)]
pub struct PredictionBrowserPage {
    pub predictions: Vec<PredictionView>,
    pub pagination: PaginationInfo,
    pub stats: PredictionStats,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AdminOverview {
    pub fn new(store: Arc<dyn PredictionStore>) -> Self {
        Self { store }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.dashboard_stats().await?)
    }

    pub async fn match_predictions(&self, match_id: Uuid) -> Result<MatchPredictions, ServiceError> {
        let mut tx = self.store.begin().await?;
        let fixture = tx
            .fetch_match(match_id)
            .await?
            .ok_or(ServiceError::NotFound("Match"))?;

        let predictions = tx.predictions_for_match(MatchLink::for_match(&fixture)).await?;
        let correct = match &fixture.true_score {
            Some(true_score) => predictions
                .iter()
                .filter(|p| &p.score == true_score)
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        Ok(MatchPredictions {
            fixture,
            predictions,
            correct,
        })
    }

    pub async fn browse_predictions(&self, query: PredictionQuery) -> Result<PredictionBrowserPage, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let offset = PaginationInfo::offset(page, PREDICTIONS_PER_PAGE)
            .ok_or_else(|| ServiceError::validation(format!("Page {} is out of range", page)))?;
        let filter = PredictionFilter {
            user_id: None,
            match_name: non_blank(query.match_name),
            username: non_blank(query.username),
            outcome: query.outcome,
            limit: PREDICTIONS_PER_PAGE,
            offset,
        };

        let mut tx = self.store.begin().await?;
        let results = tx.browse_predictions(filter).await?;
        let stats = tx.prediction_stats().await?;

        Ok(PredictionBrowserPage {
            predictions: results.items,
            pagination: PaginationInfo::new(page, PREDICTIONS_PER_PAGE, results.total),
            stats,
        })
    }
}
