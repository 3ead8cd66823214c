use chrono::Utc;
use futures::future::BoxFuture;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::db::store::{PredictionStore, StoreResult, StoreTx};
use crate::models::matches::{Match, MatchLink, MatchOverview, MatchStatus, NewMatch};
use crate::models::prediction::{
    NewPrediction, Prediction, PredictionFilter, PredictionOutcome, PredictionPage, PredictionStats, PredictionView,
};
use crate::models::score::Score;
use crate::models::stats::DashboardStats;
use crate::models::winner::{DrawPool, DrawStatus, NewWinner, Winner, WinnerEntry};

/// Postgres backed store. Schema lives in `migrations/`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

impl PredictionStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn begin(&self) -> BoxFuture<'_, StoreResult<Box<dyn StoreTx>>> {
        Box::pin(async move {
            let tx = self.pool.begin().await?;
            Ok(Box::new(PgTx { tx }) as Box<dyn StoreTx>)
        })
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[derive(FromRow)]
struct PredictionViewRow {
    #[sqlx(flatten)]
    prediction: Prediction,
    true_score: Option<Score>,
    match_status: Option<MatchStatus>,
}

// Joins each prediction to at most one match: by id when linked, otherwise by
// stored name (newest match with that name wins).
const PREDICTION_VIEW_FROM: &str = r#"
    FROM predictions p
    LEFT JOIN LATERAL (
        SELECT m.true_score, m.status
        FROM matches m
        WHERE m.id = p.match_id OR (p.match_id IS NULL AND m.name = p.match_name)
        ORDER BY m.created_at DESC
        LIMIT 1
    ) m ON TRUE
    WHERE 1=1
"#;

fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_prediction_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PredictionFilter) {
    if let Some(user_id) = filter.user_id {
        builder.push(" AND p.user_id = ").push_bind(user_id);
    }
    if let Some(match_name) = filter.match_name.as_deref().filter(|s| !s.is_empty()) {
        builder.push(" AND p.match_name ILIKE ").push_bind(like_pattern(match_name));
    }
    if let Some(username) = filter.username.as_deref().filter(|s| !s.is_empty()) {
        builder.push(" AND p.username ILIKE ").push_bind(like_pattern(username));
    }
    match filter.outcome {
        Some(PredictionOutcome::Pending) => {
            builder.push(" AND m.true_score IS NULL");
        }
        Some(PredictionOutcome::Correct) => {
            builder.push(" AND m.true_score IS NOT NULL AND p.score = m.true_score");
        }
        Some(PredictionOutcome::Wrong) => {
            builder.push(" AND m.true_score IS NOT NULL AND p.score <> m.true_score");
        }
        None => {}
    }
}

impl StoreTx for PgTx {
    fn insert_match(&mut self, new: NewMatch) -> BoxFuture<'_, StoreResult<Match>> {
        Box::pin(async move {
            let now = Utc::now();
            let fixture = sqlx::query_as::<_, Match>(
                r#"
                INSERT INTO matches (id, name, home_team, away_team, scheduled_at, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
                RETURNING id, name, home_team, away_team, scheduled_at, status, true_score, created_at, updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(new.name)
            .bind(new.home_team)
            .bind(new.away_team)
            .bind(new.scheduled_at)
            .bind(MatchStatus::Active)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;

            Ok(fixture)
        })
    }

    fn fetch_match(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<Option<Match>>> {
        Box::pin(async move {
            let fixture = sqlx::query_as::<_, Match>(
                r#"
                SELECT id, name, home_team, away_team, scheduled_at, status, true_score, created_at, updated_at
                FROM matches
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

            Ok(fixture)
        })
    }

    fn fetch_matches(&mut self, status: Option<MatchStatus>) -> BoxFuture<'_, StoreResult<Vec<Match>>> {
        Box::pin(async move {
            let matches = sqlx::query_as::<_, Match>(
                r#"
                SELECT id, name, home_team, away_team, scheduled_at, status, true_score, created_at, updated_at
                FROM matches
                WHERE $1::varchar IS NULL OR status = $1
                ORDER BY scheduled_at ASC NULLS LAST, created_at ASC
                "#,
            )
            .bind(status)
            .fetch_all(&mut *self.tx)
            .await?;

            Ok(matches)
        })
    }

    fn save_match(&mut self, fixture: Match) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            sqlx::query(
                r#"
                UPDATE matches
                SET
                    name = $2,
                    home_team = $3,
                    away_team = $4,
                    scheduled_at = $5,
                    status = $6,
                    true_score = $7,
                    updated_at = $8
                WHERE id = $1
                "#,
            )
            .bind(fixture.id)
            .bind(fixture.name)
            .bind(fixture.home_team)
            .bind(fixture.away_team)
            .bind(fixture.scheduled_at)
            .bind(fixture.status)
            .bind(fixture.true_score)
            .bind(fixture.updated_at)
            .execute(&mut *self.tx)
            .await?;

            Ok(())
        })
    }

    fn delete_match(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM matches WHERE id = $1")
                .bind(id)
                .execute(&mut *self.tx)
                .await?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn match_overview(&mut self) -> BoxFuture<'_, StoreResult<Vec<MatchOverview>>> {
        Box::pin(async move {
            let overview = sqlx::query_as::<_, MatchOverview>(
                r#"
                SELECT
                    m.id, m.name, m.home_team, m.away_team, m.scheduled_at,
                    m.status, m.true_score, m.created_at, m.updated_at,
                    (
                        SELECT COUNT(*)
                        FROM predictions p
                        WHERE p.match_id = m.id OR (p.match_id IS NULL AND p.match_name = m.name)
                    ) AS prediction_count
                FROM matches m
                ORDER BY m.created_at DESC
                "#,
            )
            .fetch_all(&mut *self.tx)
            .await?;

            Ok(overview)
        })
    }

    fn find_prediction(&mut self, user_id: i64, link: MatchLink) -> BoxFuture<'_, StoreResult<Option<Prediction>>> {
        Box::pin(async move {
            let prediction = sqlx::query_as::<_, Prediction>(
                r#"
                SELECT id, user_id, username, match_id, match_name, score, created_at
                FROM predictions
                WHERE user_id = $1
                AND (match_id = $2 OR (match_id IS NULL AND match_name = ANY($3)))
                ORDER BY (match_id IS NULL) ASC, created_at ASC
                LIMIT 1
                "#,
            )
            .bind(user_id)
            .bind(link.match_id)
            .bind(link.legacy_names)
            .fetch_optional(&mut *self.tx)
            .await?;

            Ok(prediction)
        })
    }

    fn insert_prediction(&mut self, new: NewPrediction) -> BoxFuture<'_, StoreResult<Prediction>> {
        Box::pin(async move {
            let prediction = sqlx::query_as::<_, Prediction>(
                r#"
                INSERT INTO predictions (id, user_id, username, match_id, match_name, score, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, user_id, username, match_id, match_name, score, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(new.user_id)
            .bind(new.username)
            .bind(new.match_id)
            .bind(new.match_name)
            .bind(new.score)
            .bind(Utc::now())
            .fetch_one(&mut *self.tx)
            .await?;

            Ok(prediction)
        })
    }

    fn predictions_for_match(&mut self, link: MatchLink) -> BoxFuture<'_, StoreResult<Vec<Prediction>>> {
        Box::pin(async move {
            let predictions = sqlx::query_as::<_, Prediction>(
                r#"
                SELECT id, user_id, username, match_id, match_name, score, created_at
                FROM predictions
                WHERE match_id = $1 OR (match_id IS NULL AND match_name = ANY($2))
                ORDER BY created_at ASC
                "#,
            )
            .bind(link.match_id)
            .bind(link.legacy_names)
            .fetch_all(&mut *self.tx)
            .await?;

            Ok(predictions)
        })
    }

    fn link_prediction(&mut self, prediction_id: Uuid, match_id: Uuid) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            sqlx::query("UPDATE predictions SET match_id = $2 WHERE id = $1")
                .bind(prediction_id)
                .bind(match_id)
                .execute(&mut *self.tx)
                .await?;

            Ok(())
        })
    }

    fn delete_predictions(&mut self, link: MatchLink) -> BoxFuture<'_, StoreResult<u64>> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                DELETE FROM predictions
                WHERE match_id = $1 OR (match_id IS NULL AND match_name = ANY($2))
                "#,
            )
            .bind(link.match_id)
            .bind(link.legacy_names)
            .execute(&mut *self.tx)
            .await?;

            Ok(result.rows_affected())
        })
    }

    fn browse_predictions(&mut self, filter: PredictionFilter) -> BoxFuture<'_, StoreResult<PredictionPage>> {
        Box::pin(async move {
            let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
            count_query.push(PREDICTION_VIEW_FROM);
            push_prediction_filters(&mut count_query, &filter);
            let total = count_query
                .build_query_scalar::<i64>()
                .fetch_one(&mut *self.tx)
                .await?;

            let mut query = QueryBuilder::<Postgres>::new(
                r#"
                SELECT
                    p.id, p.user_id, p.username, p.match_id, p.match_name, p.score, p.created_at,
                    m.true_score, m.status AS match_status
                "#,
            );
            query.push(PREDICTION_VIEW_FROM);
            push_prediction_filters(&mut query, &filter);
            query
                .push(" ORDER BY p.created_at DESC LIMIT ")
                .push_bind(filter.limit)
                .push(" OFFSET ")
                .push_bind(filter.offset);

            let rows = query
                .build_query_as::<PredictionViewRow>()
                .fetch_all(&mut *self.tx)
                .await?;

            let items = rows
                .into_iter()
                .map(|row| PredictionView::new(row.prediction, row.true_score, row.match_status))
                .collect();

            Ok(PredictionPage { items, total })
        })
    }

    fn prediction_stats(&mut self) -> BoxFuture<'_, StoreResult<PredictionStats>> {
        Box::pin(async move {
            let sql = format!(
                r#"
                SELECT
                    COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE m.true_score IS NOT NULL AND p.score = m.true_score) AS correct,
                    COUNT(*) FILTER (WHERE m.true_score IS NOT NULL AND p.score <> m.true_score) AS wrong,
                    COUNT(*) FILTER (WHERE m.true_score IS NULL) AS pending
                {}
                "#,
                PREDICTION_VIEW_FROM
            );
            let stats = sqlx::query_as::<_, PredictionStats>(&sql)
                .fetch_one(&mut *self.tx)
                .await?;

            Ok(stats)
        })
    }

    fn insert_winner(&mut self, new: NewWinner) -> BoxFuture<'_, StoreResult<Winner>> {
        Box::pin(async move {
            let winner = sqlx::query_as::<_, Winner>(
                r#"
                INSERT INTO winners (id, match_id, user_id, username, winning_score, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, match_id, user_id, username, winning_score, status, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(new.match_id)
            .bind(new.user_id)
            .bind(new.username)
            .bind(new.winning_score)
            .bind(new.status)
            .bind(Utc::now())
            .fetch_one(&mut *self.tx)
            .await?;

            Ok(winner)
        })
    }

    fn fetch_winner(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<Option<Winner>>> {
        Box::pin(async move {
            let winner = sqlx::query_as::<_, Winner>(
                r#"
                SELECT id, match_id, user_id, username, winning_score, status, created_at
                FROM winners
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

            Ok(winner)
        })
    }

    fn winners_for_match(&mut self, match_id: Uuid) -> BoxFuture<'_, StoreResult<Vec<Winner>>> {
        Box::pin(async move {
            let winners = sqlx::query_as::<_, Winner>(
                r#"
                SELECT id, match_id, user_id, username, winning_score, status, created_at
                FROM winners
                WHERE match_id = $1
                ORDER BY created_at ASC
                "#,
            )
            .bind(match_id)
            .fetch_all(&mut *self.tx)
            .await?;

            Ok(winners)
        })
    }

    fn delete_winners(&mut self, match_id: Uuid, keep_manual: bool) -> BoxFuture<'_, StoreResult<u64>> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                DELETE FROM winners
                WHERE match_id = $1
                AND (NOT $2 OR status <> $3)
                "#,
            )
            .bind(match_id)
            .bind(keep_manual)
            .bind(DrawStatus::Manual)
            .execute(&mut *self.tx)
            .await?;

            Ok(result.rows_affected())
        })
    }

    fn delete_winner(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM winners WHERE id = $1")
                .bind(id)
                .execute(&mut *self.tx)
                .await?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn draw_pool(&mut self, pool: DrawPool) -> BoxFuture<'_, StoreResult<Vec<Winner>>> {
        Box::pin(async move {
            let eligible: Vec<&'static str> = DrawStatus::ELIGIBLE.iter().map(DrawStatus::as_str).collect();
            let match_id = match pool {
                DrawPool::Match(match_id) => Some(match_id),
                DrawPool::Global => None,
            };

            let winners = sqlx::query_as::<_, Winner>(
                r#"
                SELECT id, match_id, user_id, username, winning_score, status, created_at
                FROM winners
                WHERE ($1::uuid IS NULL OR match_id = $1)
                AND status = ANY($2)
                ORDER BY created_at ASC
                "#,
            )
            .bind(match_id)
            .bind(eligible)
            .fetch_all(&mut *self.tx)
            .await?;

            Ok(winners)
        })
    }

    fn set_draw_status(&mut self, ids: Vec<Uuid>, status: DrawStatus) -> BoxFuture<'_, StoreResult<u64>> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(0);
            }

            let result = sqlx::query("UPDATE winners SET status = $1 WHERE id = ANY($2)")
                .bind(status)
                .bind(ids)
                .execute(&mut *self.tx)
                .await?;

            Ok(result.rows_affected())
        })
    }

    fn winner_board(&mut self) -> BoxFuture<'_, StoreResult<Vec<WinnerEntry>>> {
        Box::pin(async move {
            let entries = sqlx::query_as::<_, WinnerEntry>(
                r#"
                SELECT
                    w.id, w.match_id, w.user_id, w.username, w.winning_score, w.status, w.created_at,
                    m.name AS match_name, m.true_score
                FROM winners w
                JOIN matches m ON m.id = w.match_id
                ORDER BY w.created_at DESC
                "#,
            )
            .fetch_all(&mut *self.tx)
            .await?;

            Ok(entries)
        })
    }

    fn dashboard_stats(&mut self) -> BoxFuture<'_, StoreResult<DashboardStats>> {
        Box::pin(async move {
            let stats = sqlx::query_as::<_, DashboardStats>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM matches WHERE status = 'active') AS active_matches,
                    (SELECT COUNT(*) FROM predictions) AS total_predictions,
                    (SELECT COUNT(DISTINCT user_id) FROM predictions) AS distinct_users,
                    (SELECT COUNT(*) FROM winners) AS total_winners
                "#,
            )
            .fetch_one(&mut *self.tx)
            .await?;

            Ok(stats)
        })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StoreResult<()>> {
        let PgTx { tx } = *self;
        Box::pin(async move {
            tx.commit().await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Ajax"), "%Ajax%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
