use actix_web::{get, post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::get_request_id,
    models::dto::request::{CurrentTokenQuery, RedeemRequest, ScanQuery},
    services::http_helpers::{redemption_result, see_other, success_json},
};

#[get("/api/tokens/current")]
async fn get_current_token(
    state: web::Data<AppState>,
    query: web::Query<CurrentTokenQuery>,
) -> Result<HttpResponse, AppError> {
    let token = state.current_token(query.subject.as_deref()).await?;
    Ok(success_json(token))
}

#[post("/api/tokens/redeem")]
async fn redeem_token(
    state: web::Data<AppState>,
    request: web::Json<RedeemRequest>,
) -> HttpResponse {
    redemption_result(state.redeem(request.into_inner()).await)
}

pub const SCAN_VALIDATE_PATH: &str = "/scan/validate";

/// Target of the redemption URL inside the QR image. A successful scan is
/// sent on to the quiz session.
#[get("/scan/validate")]
async fn scan_validate(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ScanQuery>,
) -> HttpResponse {
    let query = query.into_inner();
    if let Err(e) = query.validate() {
        return AppError::from(e).redemption_failure();
    }

    match state.redeem(query.into()).await {
        Ok(_) => see_other(&state.config.session_gate_url),
        Err(e) => {
            log::info!(
                "Scan rejected [{}]: {}",
                get_request_id(&req).unwrap_or_default(),
                e
            );
            e.redemption_failure()
        }
    }
}
