use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::db::store::PredictionStore;

pub async fn backend_health_check(store: web::Data<dyn PredictionStore>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "UP",
        "storage": store.backend()
    }))
}
