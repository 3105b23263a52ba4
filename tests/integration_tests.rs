use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use quizgate_server::{
    app_state::AppState,
    config::Config,
    errors::AppResult,
    graphql::create_schema,
    handlers::{configure, graphql},
    middleware::{RequestIdMiddleware, REQUEST_ID_HEADER},
    repositories::InMemoryTokenRepository,
    services::{ImageEncoder, ManualClock},
};

struct UrlEchoEncoder;

impl ImageEncoder for UrlEchoEncoder {
    fn encode(&self, url: &str) -> AppResult<String> {
        Ok(format!("qr:{}", url))
    }
}

fn test_state(clock: &ManualClock) -> AppState {
    AppState::from_parts(
        Config::test_config(),
        Arc::new(InMemoryTokenRepository::new()),
        Arc::new(UrlEchoEncoder),
        Arc::new(clock.clone()),
    )
    .unwrap()
}

macro_rules! init_app {
    ($state:expr) => {{
        let state = $state;
        let schema = create_schema(state.clone());
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(schema))
                .wrap(RequestIdMiddleware)
                .configure(configure)
                .service(graphql),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_expired_token_is_gone_over_http() {
    let clock = ManualClock::new(0);
    let app = init_app!(test_state(&clock));

    let req = test::TestRequest::get().uri("/api/tokens/current").to_request();
    let current: Value = test::call_and_read_body_json(&app, req).await;

    clock.set(300_000);
    let req = test::TestRequest::post()
        .uri("/api/tokens/redeem")
        .set_json(json!({ "identifier": current["identifier"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["redeemed"], false);
    assert_eq!(body["code"], "Expired");
}

#[actix_web::test]
async fn test_scanned_url_redirects_once() {
    let clock = ManualClock::new(5_000);
    let app = init_app!(test_state(&clock));

    let req = test::TestRequest::get().uri("/api/tokens/current").to_request();
    let current: Value = test::call_and_read_body_json(&app, req).await;
    let redemption_url = current["redemptionUrl"].as_str().unwrap();
    let path = redemption_url
        .strip_prefix("https://quiz.example.com")
        .expect("redemption url uses configured base");

    let first = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    assert_eq!(first.headers().get("location").unwrap(), "/quiz");

    let second = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(second).await;
    assert_eq!(body["code"], "AlreadyUsed");
}

#[actix_web::test]
async fn test_tampered_timestamp_is_rejected() {
    let clock = ManualClock::new(5_000);
    let app = init_app!(test_state(&clock));

    let req = test::TestRequest::get().uri("/api/tokens/current").to_request();
    let current: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/tokens/redeem")
        .set_json(json!({
            "identifier": current["identifier"],
            "timestamp": current["issuedAt"].as_i64().unwrap() + 1,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/tokens/redeem")
        .set_json(json!({
            "identifier": current["identifier"],
            "timestamp": current["issuedAt"],
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["redeemed"], true);
    assert!(body["nextToken"]["identifier"].is_string());
}

#[actix_web::test]
async fn test_responses_carry_request_id() {
    let clock = ManualClock::new(0);
    let app = init_app!(test_state(&clock));

    let req = test::TestRequest::get()
        .uri("/health/live")
        .insert_header((REQUEST_ID_HEADER, "scan-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "scan-123");
}

#[actix_web::test]
async fn test_graphql_and_rest_share_one_store() {
    let clock = ManualClock::new(0);
    let app = init_app!(test_state(&clock));

    let req = test::TestRequest::post()
        .uri("/graphql")
        .set_json(json!({ "query": "{ currentToken { identifier issuedAt } }" }))
        .to_request();
    let gql: Value = test::call_and_read_body_json(&app, req).await;
    let identifier = gql["data"]["currentToken"]["identifier"].as_str().unwrap();

    let req = test::TestRequest::get().uri("/api/tokens/current").to_request();
    let rest: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rest["identifier"], identifier);
}
