use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, FromRow, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub active_matches: i64,
    pub total_predictions: i64,
    pub distinct_users: i64,
    pub total_winners: i64,
}
