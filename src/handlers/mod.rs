pub mod graphql_handler;
pub mod health_handler;
pub mod token_handler;

use actix_web::{error::InternalError, web, ResponseError};

use crate::errors::AppError;

pub use graphql_handler::{graphql, graphiql};
pub use health_handler::{health_check, health_check_live, health_check_ready};
pub use token_handler::{get_current_token, redeem_token, scan_validate, SCAN_VALIDATE_PATH};

/// Registers the token and health routes. Malformed input is an `InvalidToken`;
/// the redeem endpoints answer it in the redemption failure shape.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = AppError::InvalidToken(err.to_string()).redemption_failure();
        InternalError::from_response(err, response).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, req| {
        let error = AppError::InvalidToken(err.to_string());
        let response = if req.path() == SCAN_VALIDATE_PATH {
            error.redemption_failure()
        } else {
            error.error_response()
        };
        InternalError::from_response(err, response).into()
    }))
    .service(get_current_token)
    .service(redeem_token)
    .service(scan_validate)
    .service(health_check)
    .service(health_check_live)
    .service(health_check_ready);
}
