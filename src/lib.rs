use actix_web::{http, web, App, HttpServer};
use actix_web::dev::Server;
use tracing_actix_web::TracingLogger;
use std::net::TcpListener;
use std::sync::Arc;
use actix_cors::Cors;

pub mod config;
mod routes;
mod handlers;
pub mod models;
mod middleware;
pub mod db;
pub mod services;
pub mod telemetry;
use crate::routes::init_routes;
use crate::config::settings::{AdminSettings, ChatSettings, ResolutionSettings};
use crate::db::store::PredictionStore;
use crate::services::{AdminOverview, DrawEngine, MatchRegistry, OutcomeResolver, PredictionLedger, WinnerRegistry};

pub fn run(
    listener: TcpListener,
    store: Arc<dyn PredictionStore>,
    admin_settings: AdminSettings,
    chat_settings: ChatSettings,
    resolution_settings: ResolutionSettings,
) -> Result<Server, std::io::Error> {
    tracing::info!("Starting server with {} storage", store.backend());

    // Wrap using web::Data, which boils down to an Arc smart pointer
    let match_registry = web::Data::new(MatchRegistry::new(store.clone(), resolution_settings));
    let outcome_resolver = web::Data::new(OutcomeResolver::new(store.clone(), resolution_settings));
    let prediction_ledger = web::Data::new(PredictionLedger::new(store.clone()));
    let draw_engine = web::Data::new(DrawEngine::new(store.clone()));
    let winner_registry = web::Data::new(WinnerRegistry::new(store.clone()));
    let admin_overview = web::Data::new(AdminOverview::new(store.clone()));
    let store_data: web::Data<dyn PredictionStore> = web::Data::from(store);
    let admin_settings = web::Data::new(admin_settings);
    let chat_settings = web::Data::new(chat_settings);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:3001")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .allowed_header("X-Chat-Id")
            .allowed_header("X-Chat-Type")
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(store_data.clone())
            .app_data(admin_settings.clone())
            .app_data(chat_settings.clone())
            .app_data(match_registry.clone())
            .app_data(outcome_resolver.clone())
            .app_data(prediction_ledger.clone())
            .app_data(draw_engine.clone())
            .app_data(winner_registry.clone())
            .app_data(admin_overview.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
