use actix_web::{http::header::LOCATION, HttpResponse};

use crate::{errors::AppResult, models::dto::response::RedeemResponse};

/// Creates a success JSON response
pub fn success_json<T: serde::Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(data)
}

/// Creates a 303 redirect to `location`
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// Renders a redemption result; failures always carry `redeemed: false`.
pub fn redemption_result(result: AppResult<RedeemResponse>) -> HttpResponse {
    match result {
        Ok(response) => success_json(response),
        Err(err) => err.redemption_failure(),
    }
}
