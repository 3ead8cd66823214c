use actix_web::web;

use crate::handlers::admin::{
    draw_handler,
    match_handler,
    overview_handler,
    winner_handler,
};
use crate::middleware::admin::AdminMiddleware;

pub fn init_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(AdminMiddleware)
            .service(
                web::resource("/stats")
                    .route(web::get().to(overview_handler::get_stats))
            )

            // Match management routes
            .service(
                web::resource("/matches")
                    .route(web::get().to(match_handler::get_matches))
                    .route(web::post().to(match_handler::create_match))
            )
            .service(
                web::resource("/matches/{id}")
                    .route(web::get().to(match_handler::get_match))
                    .route(web::put().to(match_handler::update_match))
                    .route(web::delete().to(match_handler::delete_match))
            )
            .service(
                web::resource("/matches/{id}/predictions")
                    .route(web::get().to(match_handler::get_match_predictions))
            )
            .service(
                web::resource("/matches/{id}/resolve")
                    .route(web::post().to(match_handler::resolve_match))
            )

            // Winner and draw routes
            .service(
                web::resource("/matches/{id}/winners")
                    .route(web::get().to(winner_handler::get_match_winners))
                    .route(web::post().to(winner_handler::add_manual_winner))
            )
            .service(
                web::resource("/matches/{id}/draw")
                    .route(web::post().to(draw_handler::draw_match))
            )
            .service(
                web::resource("/draw")
                    .route(web::post().to(draw_handler::draw_global))
            )
            .service(
                web::resource("/winners")
                    .route(web::get().to(winner_handler::get_winners))
            )
            .service(
                web::resource("/winners/{id}")
                    .route(web::delete().to(winner_handler::remove_winner))
            )

            // Prediction browser
            .service(
                web::resource("/predictions")
                    .route(web::get().to(overview_handler::browse_predictions))
            )
    );
}
