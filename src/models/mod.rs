pub mod common;
pub mod matches;
pub mod prediction;
pub mod score;
pub mod stats;
pub mod winner;
