use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use crate::models::common::ApiResponse;
use crate::models::matches::Match;
use crate::models::prediction::{HistoryQuery, SubmissionOutcome, SubmitPredictionRequest};
use crate::services::{MatchRegistry, PredictionLedger};

/// An active match with the number users pick it by.
#[derive(Serialize)]
pub struct NumberedMatch {
    pub number: usize,
    #[serde(flatten)]
    pub fixture: Match,
}

// GET /bot/matches
pub async fn list_matches(registry: web::Data<MatchRegistry>) -> Result<HttpResponse> {
    let matches: Vec<NumberedMatch> = registry
        .list_active_matches()
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, fixture)| NumberedMatch { number: i + 1, fixture })
        .collect();

    let message = if matches.is_empty() {
        "No active matches right now"
    } else {
        "Active matches"
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(message, matches)))
}

// POST /bot/predictions
pub async fn submit_prediction(
    ledger: web::Data<PredictionLedger>,
    body: web::Json<SubmitPredictionRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    let outcome = ledger
        .submit_prediction(request.user_id, &request.username, request.match_id, &request.score)
        .await?;

    match outcome {
        SubmissionOutcome::Created(prediction) => Ok(HttpResponse::Created().json(ApiResponse::success(
            format!("Prediction saved: {} {}", prediction.match_name, prediction.score),
            prediction,
        ))),
        SubmissionOutcome::AlreadyExists(existing) => Ok(HttpResponse::Conflict().json(ApiResponse::rejected_with(
            format!(
                "You already predicted {} for {}",
                existing.score, existing.match_name
            ),
            "already_exists",
            existing,
        ))),
    }
}

// GET /bot/users/{user_id}/predictions?limit=
pub async fn user_predictions(
    ledger: web::Data<PredictionLedger>,
    path: web::Path<i64>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let predictions = ledger.list_user_predictions(user_id, query.limit).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Your predictions", predictions)))
}
