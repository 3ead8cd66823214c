pub mod draw_handler;
pub mod match_handler;
pub mod overview_handler;
pub mod winner_handler;
