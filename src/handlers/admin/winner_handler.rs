use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::models::common::ApiResponse;
use crate::models::winner::ManualWinnerRequest;
use crate::services::WinnerRegistry;

// GET /admin/winners - Every winner with its match, newest first
pub async fn get_winners(registry: web::Data<WinnerRegistry>) -> Result<HttpResponse> {
    let winners = registry.winner_board().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Winners retrieved", winners)))
}

// GET /admin/matches/{id}/winners
pub async fn get_match_winners(
    registry: web::Data<WinnerRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let winners = registry.winners_for_match(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match winners retrieved", winners)))
}

// POST /admin/matches/{id}/winners - Add a winner by hand
pub async fn add_manual_winner(
    registry: web::Data<WinnerRegistry>,
    path: web::Path<Uuid>,
    body: web::Json<ManualWinnerRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    let winner = registry
        .add_manual_winner(path.into_inner(), request.user_id, &request.username)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        format!("@{} added as a winner", winner.username),
        winner,
    )))
}

// DELETE /admin/winners/{id}
pub async fn remove_winner(
    registry: web::Data<WinnerRegistry>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let winner = registry.remove_winner(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("@{} removed from the winners", winner.username),
        winner,
    )))
}
