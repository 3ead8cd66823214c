use actix_web::web;

pub mod admin;
pub mod backend_health;
pub mod bot;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    bot::init_bot_routes(cfg);
    admin::init_admin_routes(cfg);
}
