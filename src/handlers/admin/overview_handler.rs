use actix_web::{web, HttpResponse, Result};

use crate::models::common::ApiResponse;
use crate::models::prediction::PredictionQuery;
use crate::services::AdminOverview;

// GET /admin/stats
pub async fn get_stats(overview: web::Data<AdminOverview>) -> Result<HttpResponse> {
    let stats = overview.dashboard_stats().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Stats retrieved", stats)))
}

// GET /admin/predictions?page=&match=&username=&outcome=
pub async fn browse_predictions(
    overview: web::Data<AdminOverview>,
    query: web::Query<PredictionQuery>,
) -> Result<HttpResponse> {
    let page = overview.browse_predictions(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Predictions retrieved", page)))
}
