use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use async_graphql::ErrorExtensions;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired: {0}")]
    Expired(String),

    #[error("Token already used: {0}")]
    AlreadyUsed(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidToken(_) => "InvalidToken",
            AppError::Expired(_) => "Expired",
            AppError::AlreadyUsed(_) => "AlreadyUsed",
            AppError::EncodingFailed(_) => "EncodingFailed",
            AppError::StoreUnavailable(_) => "StoreUnavailable",
            AppError::InternalError(_) => "InternalError",
        }
    }

    /// Failure body for the redeem endpoints, which always carry `redeemed`.
    pub fn redemption_failure(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            redeemed: Some(false),
            code: self.error_code(),
            message: self.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed: Option<bool>,
    pub code: &'static str,
    pub message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            AppError::Expired(_) => StatusCode::GONE,
            AppError::AlreadyUsed(_) => StatusCode::CONFLICT,
            AppError::EncodingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            redeemed: None,
            code: self.error_code(),
            message: self.to_string(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}
impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidToken(err.to_string())
    }
}
impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_err, e| {
            e.set("code", self.error_code());
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;
