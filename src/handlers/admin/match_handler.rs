use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::models::common::ApiResponse;
use crate::models::matches::{CreateMatchRequest, MatchUpdate};
use crate::services::{AdminOverview, MatchRegistry, OutcomeResolver};

// GET /admin/matches - Every match with its prediction count
pub async fn get_matches(registry: web::Data<MatchRegistry>) -> Result<HttpResponse> {
    let matches = registry.list_overview().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Matches retrieved", matches)))
}

// POST /admin/matches - Create a match
pub async fn create_match(
    registry: web::Data<MatchRegistry>,
    body: web::Json<CreateMatchRequest>,
) -> Result<HttpResponse> {
    let fixture = registry
        .create_match(&body.home_team, &body.away_team, body.scheduled_at)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        format!("Match {} created", fixture.name),
        fixture,
    )))
}

// GET /admin/matches/{id}
pub async fn get_match(
    registry: web::Data<MatchRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let fixture = registry.get_match(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match retrieved", fixture)))
}

// PUT /admin/matches/{id} - Edit a match, a new true score recomputes winners
pub async fn update_match(
    registry: web::Data<MatchRegistry>,
    path: web::Path<Uuid>,
    body: web::Json<MatchUpdate>,
) -> Result<HttpResponse> {
    let report = registry.update_match(path.into_inner(), body.into_inner()).await?;

    let message = match &report.resolution {
        Some(resolution) => format!(
            "Match {} updated, {} winners determined",
            report.fixture.name, resolution.winners_created
        ),
        None => format!("Match {} updated", report.fixture.name),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(message, report)))
}

// DELETE /admin/matches/{id} - Delete a match with its predictions and winners
pub async fn delete_match(
    registry: web::Data<MatchRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let report = registry.delete_match(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!(
            "Match {} deleted ({} predictions, {} winners)",
            report.match_name, report.predictions_deleted, report.winners_deleted
        ),
        report,
    )))
}

// GET /admin/matches/{id}/predictions
pub async fn get_match_predictions(
    overview: web::Data<AdminOverview>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let predictions = overview.match_predictions(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match predictions retrieved", predictions)))
}

// POST /admin/matches/{id}/resolve - Recompute winners from the current true score
pub async fn resolve_match(
    resolver: web::Data<OutcomeResolver>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let report = resolver.resolve_match(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("{} winners determined", report.winners_created),
        report,
    )))
}
