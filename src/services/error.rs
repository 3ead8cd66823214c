use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::db::store::StoreError;
use crate::models::common::ApiResponse;
use crate::models::score::ScoreFormatError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidScore(#[from] ScoreFormatError),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not enough eligible winners: requested {requested}, available {available}")]
    InsufficientPool { available: usize, requested: usize },

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Stable identifier returned in the `error` field of API responses
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidScore(_) => "invalid_score",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InsufficientPool { .. } => "insufficient_pool",
            ServiceError::Storage(_) => "storage_error",
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidScore(_) | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InsufficientPool { .. } => StatusCode::CONFLICT,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::Storage(e) => {
                tracing::error!("Storage failure while handling request: {}", e);
                "Something went wrong, please try again".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code())
            .json(ApiResponse::<()>::error_with_message(message, self.code()))
    }
}
