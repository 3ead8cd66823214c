use actix_web::web;

use crate::handlers::bot::prediction_handler;
use crate::middleware::chat_group::ChatGroupMiddleware;

pub fn init_bot_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bot")
            .wrap(ChatGroupMiddleware)
            .service(
                web::resource("/matches")
                    .route(web::get().to(prediction_handler::list_matches))
            )
            .service(
                web::resource("/predictions")
                    .route(web::post().to(prediction_handler::submit_prediction))
            )
            .service(
                web::resource("/users/{user_id}/predictions")
                    .route(web::get().to(prediction_handler::user_predictions))
            )
    );
}
