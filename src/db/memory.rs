use chrono::Utc;
use futures::future::{ready, BoxFuture};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::db::store::{PredictionStore, StoreError, StoreResult, StoreTx};
use crate::models::matches::{Match, MatchLink, MatchOverview, MatchStatus, NewMatch};
use crate::models::prediction::{
    NewPrediction, Prediction, PredictionFilter, PredictionOutcome, PredictionPage, PredictionStats, PredictionView,
};
use crate::models::stats::DashboardStats;
use crate::models::winner::{DrawPool, DrawStatus, NewWinner, Winner, WinnerEntry};

/// In-process store for local development and tests.
///
/// Transactions are serialized behind one async mutex and work on a private
/// copy of the state, which replaces the shared state on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    matches: Vec<Match>,
    predictions: Vec<Prediction>,
    winners: Vec<Winner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PredictionStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn begin(&self) -> BoxFuture<'_, StoreResult<Box<dyn StoreTx>>> {
        Box::pin(async move {
            let guard = self.state.clone().lock_owned().await;
            let working = (*guard).clone();
            Ok(Box::new(MemoryTx { guard, working }) as Box<dyn StoreTx>)
        })
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn done<'a, T: Send + 'a>(result: StoreResult<T>) -> BoxFuture<'a, StoreResult<T>> {
    Box::pin(ready(result))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl MemoryState {
    fn match_exists(&self, id: Uuid) -> bool {
        self.matches.iter().any(|m| m.id == id)
    }

    /// Mirrors the lateral join of the Postgres store: id first, otherwise the
    /// newest match carrying the stored name.
    fn match_of(&self, prediction: &Prediction) -> Option<&Match> {
        match prediction.match_id {
            Some(id) => self.matches.iter().find(|m| m.id == id),
            None => self
                .matches
                .iter()
                .filter(|m| m.name == prediction.match_name)
                .max_by_key(|m| m.created_at),
        }
    }

    fn view_of(&self, prediction: &Prediction) -> PredictionView {
        let fixture = self.match_of(prediction);
        PredictionView::new(
            prediction.clone(),
            fixture.and_then(|m| m.true_score.clone()),
            fixture.map(|m| m.status),
        )
    }

    fn sorted_matches(&self, status: Option<MatchStatus>) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .matches
            .iter()
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.scheduled_at.is_none(), m.scheduled_at, m.created_at));
        matches
    }
}

impl StoreTx for MemoryTx {
    fn insert_match(&mut self, new: NewMatch) -> BoxFuture<'_, StoreResult<Match>> {
        let now = Utc::now();
        let fixture = Match {
            id: Uuid::new_v4(),
            name: new.name,
            home_team: new.home_team,
            away_team: new.away_team,
            scheduled_at: new.scheduled_at,
            status: MatchStatus::Active,
            true_score: None,
            created_at: now,
            updated_at: now,
        };
        self.working.matches.push(fixture.clone());
        done(Ok(fixture))
    }

    fn fetch_match(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<Option<Match>>> {
        let fixture = self.working.matches.iter().find(|m| m.id == id).cloned();
        done(Ok(fixture))
    }

    fn fetch_matches(&mut self, status: Option<MatchStatus>) -> BoxFuture<'_, StoreResult<Vec<Match>>> {
        done(Ok(self.working.sorted_matches(status)))
    }

    fn save_match(&mut self, fixture: Match) -> BoxFuture<'_, StoreResult<()>> {
        if let Some(existing) = self.working.matches.iter_mut().find(|m| m.id == fixture.id) {
            *existing = fixture;
        }
        done(Ok(()))
    }

    fn delete_match(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<bool>> {
        let referenced = self.working.predictions.iter().any(|p| p.match_id == Some(id))
            || self.working.winners.iter().any(|w| w.match_id == id);
        if referenced {
            return done(Err(StoreError::ForeignKeyViolation("matches_referenced".to_string())));
        }

        let before = self.working.matches.len();
        self.working.matches.retain(|m| m.id != id);
        done(Ok(self.working.matches.len() < before))
    }

    fn match_overview(&mut self) -> BoxFuture<'_, StoreResult<Vec<MatchOverview>>> {
        let mut overview: Vec<MatchOverview> = self
            .working
            .matches
            .iter()
            .map(|m| {
                let link = MatchLink::for_match(m);
                let prediction_count = self
                    .working
                    .predictions
                    .iter()
                    .filter(|p| link.covers(p.match_id, &p.match_name))
                    .count() as i64;
                MatchOverview { fixture: m.clone(), prediction_count }
            })
            .collect();
        overview.sort_by(|a, b| b.fixture.created_at.cmp(&a.fixture.created_at));
        done(Ok(overview))
    }

    fn find_prediction(&mut self, user_id: i64, link: MatchLink) -> BoxFuture<'_, StoreResult<Option<Prediction>>> {
        let mut candidates: Vec<&Prediction> = self
            .working
            .predictions
            .iter()
            .filter(|p| p.user_id == user_id && link.covers(p.match_id, &p.match_name))
            .collect();
        candidates.sort_by_key(|p| (p.match_id.is_none(), p.created_at));
        done(Ok(candidates.first().map(|p| (*p).clone())))
    }

    fn insert_prediction(&mut self, new: NewPrediction) -> BoxFuture<'_, StoreResult<Prediction>> {
        if let Some(match_id) = new.match_id {
            if !self.working.match_exists(match_id) {
                return done(Err(StoreError::ForeignKeyViolation("predictions_match_id_fkey".to_string())));
            }
            let duplicate = self
                .working
                .predictions
                .iter()
                .any(|p| p.user_id == new.user_id && p.match_id == Some(match_id));
            if duplicate {
                return done(Err(StoreError::UniqueViolation("predictions_user_match_key".to_string())));
            }
        }

        let prediction = Prediction {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            username: new.username,
            match_id: new.match_id,
            match_name: new.match_name,
            score: new.score,
            created_at: Utc::now(),
        };
        self.working.predictions.push(prediction.clone());
        done(Ok(prediction))
    }

    fn predictions_for_match(&mut self, link: MatchLink) -> BoxFuture<'_, StoreResult<Vec<Prediction>>> {
        let mut predictions: Vec<Prediction> = self
            .working
            .predictions
            .iter()
            .filter(|p| link.covers(p.match_id, &p.match_name))
            .cloned()
            .collect();
        predictions.sort_by_key(|p| p.created_at);
        done(Ok(predictions))
    }

    fn link_prediction(&mut self, prediction_id: Uuid, match_id: Uuid) -> BoxFuture<'_, StoreResult<()>> {
        if !self.working.match_exists(match_id) {
            return done(Err(StoreError::ForeignKeyViolation("predictions_match_id_fkey".to_string())));
        }
        let Some(index) = self.working.predictions.iter().position(|p| p.id == prediction_id) else {
            return done(Ok(()));
        };
        let user_id = self.working.predictions[index].user_id;
        let duplicate = self
            .working
            .predictions
            .iter()
            .any(|p| p.id != prediction_id && p.user_id == user_id && p.match_id == Some(match_id));
        if duplicate {
            return done(Err(StoreError::UniqueViolation("predictions_user_match_key".to_string())));
        }
        self.working.predictions[index].match_id = Some(match_id);
        done(Ok(()))
    }

    fn delete_predictions(&mut self, link: MatchLink) -> BoxFuture<'_, StoreResult<u64>> {
        let before = self.working.predictions.len();
        self.working.predictions.retain(|p| !link.covers(p.match_id, &p.match_name));
        done(Ok((before - self.working.predictions.len()) as u64))
    }

    fn browse_predictions(&mut self, filter: PredictionFilter) -> BoxFuture<'_, StoreResult<PredictionPage>> {
        let state = &self.working;
        let mut views: Vec<PredictionView> = state
            .predictions
            .iter()
            .filter(|p| filter.user_id.map_or(true, |user_id| p.user_id == user_id))
            .filter(|p| {
                filter
                    .match_name
                    .as_deref()
                    .map_or(true, |needle| contains_ignore_case(&p.match_name, needle))
            })
            .filter(|p| {
                filter
                    .username
                    .as_deref()
                    .map_or(true, |needle| contains_ignore_case(&p.username, needle))
            })
            .map(|p| state.view_of(p))
            .filter(|view| filter.outcome.map_or(true, |outcome| view.outcome == outcome))
            .collect();
        views.sort_by(|a, b| b.prediction.created_at.cmp(&a.prediction.created_at));

        let total = views.len() as i64;
        let items = views
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        done(Ok(PredictionPage { items, total }))
    }

    fn prediction_stats(&mut self) -> BoxFuture<'_, StoreResult<PredictionStats>> {
        let state = &self.working;
        let stats = state
            .predictions
            .iter()
            .map(|p| state.view_of(p).outcome)
            .fold(PredictionStats::default(), |mut stats, outcome| {
                stats.total += 1;
                match outcome {
                    PredictionOutcome::Correct => stats.correct += 1,
                    PredictionOutcome::Wrong => stats.wrong += 1,
                    PredictionOutcome::Pending => stats.pending += 1,
                }
                stats
            });
        done(Ok(stats))
    }

    fn insert_winner(&mut self, new: NewWinner) -> BoxFuture<'_, StoreResult<Winner>> {
        if !self.working.match_exists(new.match_id) {
            return done(Err(StoreError::ForeignKeyViolation("winners_match_id_fkey".to_string())));
        }
        let winner = Winner {
            id: Uuid::new_v4(),
            match_id: new.match_id,
            user_id: new.user_id,
            username: new.username,
            winning_score: new.winning_score,
            status: new.status,
            created_at: Utc::now(),
        };
        self.working.winners.push(winner.clone());
        done(Ok(winner))
    }

    fn fetch_winner(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<Option<Winner>>> {
        done(Ok(self.working.winners.iter().find(|w| w.id == id).cloned()))
    }

    fn winners_for_match(&mut self, match_id: Uuid) -> BoxFuture<'_, StoreResult<Vec<Winner>>> {
        let mut winners: Vec<Winner> = self
            .working
            .winners
            .iter()
            .filter(|w| w.match_id == match_id)
            .cloned()
            .collect();
        winners.sort_by_key(|w| w.created_at);
        done(Ok(winners))
    }

    fn delete_winners(&mut self, match_id: Uuid, keep_manual: bool) -> BoxFuture<'_, StoreResult<u64>> {
        let before = self.working.winners.len();
        self.working
            .winners
            .retain(|w| w.match_id != match_id || (keep_manual && w.status == DrawStatus::Manual));
        done(Ok((before - self.working.winners.len()) as u64))
    }

    fn delete_winner(&mut self, id: Uuid) -> BoxFuture<'_, StoreResult<bool>> {
        let before = self.working.winners.len();
        self.working.winners.retain(|w| w.id != id);
        done(Ok(self.working.winners.len() < before))
    }

    fn draw_pool(&mut self, pool: DrawPool) -> BoxFuture<'_, StoreResult<Vec<Winner>>> {
        let mut winners: Vec<Winner> = self
            .working
            .winners
            .iter()
            .filter(|w| match pool {
                DrawPool::Match(match_id) => w.match_id == match_id,
                DrawPool::Global => true,
            })
            .filter(|w| w.status.is_eligible())
            .cloned()
            .collect();
        winners.sort_by_key(|w| w.created_at);
        done(Ok(winners))
    }

    fn set_draw_status(&mut self, ids: Vec<Uuid>, status: DrawStatus) -> BoxFuture<'_, StoreResult<u64>> {
        let ids: HashSet<Uuid> = ids.into_iter().collect();
        let mut updated = 0;
        for winner in self.working.winners.iter_mut().filter(|w| ids.contains(&w.id)) {
            winner.status = status;
            updated += 1;
        }
        done(Ok(updated))
    }

    fn winner_board(&mut self) -> BoxFuture<'_, StoreResult<Vec<WinnerEntry>>> {
        let state = &self.working;
        let mut entries: Vec<WinnerEntry> = state
            .winners
            .iter()
            .filter_map(|w| {
                let fixture = state.matches.iter().find(|m| m.id == w.match_id)?;
                Some(WinnerEntry {
                    winner: w.clone(),
                    match_name: fixture.name.clone(),
                    true_score: fixture.true_score.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| b.winner.created_at.cmp(&a.winner.created_at));
        done(Ok(entries))
    }

    fn dashboard_stats(&mut self) -> BoxFuture<'_, StoreResult<DashboardStats>> {
        let state = &self.working;
        let distinct_users: HashSet<i64> = state.predictions.iter().map(|p| p.user_id).collect();
        done(Ok(DashboardStats {
            active_matches: state.matches.iter().filter(|m| m.is_active()).count() as i64,
            total_predictions: state.predictions.len() as i64,
            distinct_users: distinct_users.len() as i64,
            total_winners: state.winners.len() as i64,
        }))
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StoreResult<()>> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        done(Ok(()))
    }
}
