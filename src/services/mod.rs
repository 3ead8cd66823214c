pub mod admin_overview;
pub mod draw_engine;
pub mod error;
pub mod match_registry;
pub mod outcome_resolver;
pub mod prediction_ledger;
pub mod winner_registry;

pub use admin_overview::AdminOverview;
pub use draw_engine::DrawEngine;
pub use error::ServiceError;
pub use match_registry::MatchRegistry;
pub use outcome_resolver::OutcomeResolver;
pub use prediction_ledger::PredictionLedger;
pub use winner_registry::WinnerRegistry;
