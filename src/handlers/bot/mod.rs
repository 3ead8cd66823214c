pub mod prediction_handler;
