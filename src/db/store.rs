//! Storage abstraction shared by every service.
//!
//! A backend is picked once at startup (see `main.rs`) and handed to the
//! services as `Arc<dyn PredictionStore>`. All reads and writes go through a
//! [`StoreTx`] unit of work: nothing is visible to other requests until
//! [`StoreTx::commit`] succeeds, and dropping a transaction rolls it back.
//!
//! Both backends enforce the same constraints:
//! - at most one prediction per `(user_id, match_id)`; legacy rows with no
//!   `match_id` never collide with each other
//! - predictions and winners may only reference existing matches

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::models::matches::{Match, MatchLink, MatchOverview, MatchStatus, NewMatch};
use crate::models::prediction::{NewPrediction, Prediction, PredictionFilter, PredictionPage, PredictionStats};
use crate::models::stats::DashboardStats;
use crate::models::winner::{DrawPool, DrawStatus, NewWinner, Winner, WinnerEntry};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &e {
            let constraint = db_error.constraint().unwrap_or("unknown").to_string();
            if db_error.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }
            if db_error.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(constraint);
            }
        }
        StoreError::Database(e)
    }
}

pub trait PredictionStore: Send + Sync {
    /// Short name of the backend, used in logs and the health check
    fn backend(&self) -> &'static str;

    fn begin(&self) -> BoxFuture<'_, StoreResult<Box<dyn StoreTx>>>;
}

pub trait StoreTx: Send {
    // --- matches ---

    fn insert_match(&mut self, new: NewMatch) -> BoxFuture<'_, StoreResult<Match>>;

    fn fetch_match(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<Option<Match>>>;

    /// Ordered by scheduled time ascending (unscheduled last), then creation time.
    fn fetch_matches(&mut self, status: Option<MatchStatus>) -> BoxFuture<'_, StoreResult<Vec<Match>>>;

    /// Writes every editable column of `fixture` back to its row.
    fn save_match(&mut self, fixture: Match) -> BoxFuture<'_, StoreResult<()>>;

    fn delete_match(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<bool>>;

    /// Every match with its prediction count, newest first.
    fn match_overview(&mut self) -> BoxFuture<'_, StoreResult<Vec<MatchOverview>>>;

    // --- predictions ---

    fn find_prediction(&mut self, user_id: i64, link: MatchLink) -> BoxFuture<'_, StoreResult<Option<Prediction>>>;

    /// Fails with [`StoreError::UniqueViolation`] when the user already has a
    /// prediction for the same match id.
    fn insert_prediction(&mut self, new: NewPrediction) -> BoxFuture<'_, StoreResult<Prediction>>;

    /// Oldest first.
    fn predictions_for_match(&mut self, link: MatchLink) -> BoxFuture<'_, StoreResult<Vec<Prediction>>>;

    fn link_prediction(&mut self, prediction_id: Uuid, match_id: Uuid) -> BoxFuture<'_, StoreResult<()>>;

    fn delete_predictions(&mut self, link: MatchLink) -> BoxFuture<'_, StoreResult<u64>>;

    /// Newest first, filtered and paginated.
    fn browse_predictions(&mut self, filter: PredictionFilter) -> BoxFuture<'_, StoreResult<PredictionPage>>;

    fn prediction_stats(&mut self) -> BoxFuture<'_, StoreResult<PredictionStats>>;

    // --- winners ---

    fn insert_winner(&mut self, new: NewWinner) -> BoxFuture<'_, StoreResult<Winner>>;

    fn fetch_winner(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<Option<Winner>>>;

    /// Oldest first.
    fn winners_for_match(&mut self, match_id: Uuid) -> BoxFuture<'_, StoreResult<Vec<Winner>>>;

    /// Removes the winners of a match, leaving `manual` rows alone when `keep_manual` is set.
    fn delete_winners(&mut self, match_id: Uuid, keep_manual: bool) -> BoxFuture<'_, StoreResult<u64>>;

    fn delete_winner(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<bool>>;

    /// Winners in the pool whose status is still eligible for a draw, oldest first.
    fn draw_pool(&mut self, pool: DrawPool) -> BoxFuture<'_, StoreResult<Vec<Winner>>>;

    fn set_draw_status(&mut self, ids: Vec<Uuid>, status: DrawStatus) -> BoxFuture<'_, StoreResult<u64>>;

    /// Every winner with its match, newest first.
    fn winner_board(&mut self) -> BoxFuture<'_, StoreResult<Vec<WinnerEntry>>>;

    fn dashboard_stats(&mut self) -> BoxFuture<'_, StoreResult<DashboardStats>>;

    fn commit(self: Box<Self>) -> BoxFuture<'static, StoreResult<()>>;
}
