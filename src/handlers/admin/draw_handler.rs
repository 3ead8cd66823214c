use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::models::common::ApiResponse;
use crate::models::winner::{DrawPool, DrawRequest, DrawResult};
use crate::services::DrawEngine;

fn draw_response(result: DrawResult) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(
        format!("{} of {} winners selected", result.selected.len(), result.pool_size),
        result,
    ))
}

// POST /admin/matches/{id}/draw - Draw among the winners of one match
pub async fn draw_match(
    engine: web::Data<DrawEngine>,
    path: web::Path<Uuid>,
    body: web::Json<DrawRequest>,
) -> Result<HttpResponse> {
    let result = engine.draw(DrawPool::Match(path.into_inner()), body.count).await?;
    Ok(draw_response(result))
}

// POST /admin/draw - Draw among all undrawn winners
pub async fn draw_global(
    engine: web::Data<DrawEngine>,
    body: web::Json<DrawRequest>,
) -> Result<HttpResponse> {
    let result = engine.draw(DrawPool::Global, body.count).await?;
    Ok(draw_response(result))
}
