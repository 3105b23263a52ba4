use async_graphql::SimpleObject;
use serde::Serialize;

use crate::{models::domain::AccessToken, services::RedemptionOutcome};

#[derive(Debug, Clone, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub identifier: String,
    pub payload: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub redemption_url: String,
}

impl TokenDto {
    pub fn from_token(token: AccessToken, validity_window_ms: i64) -> Self {
        TokenDto {
            expires_at: token.issued_at.saturating_add(validity_window_ms),
            identifier: token.identifier,
            payload: token.payload,
            issued_at: token.issued_at,
            redemption_url: token.redemption_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub redeemed: bool,
    pub next_token: Option<TokenDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_error: Option<String>,
}

impl RedeemResponse {
    pub fn from_outcome(outcome: RedemptionOutcome, validity_window_ms: i64) -> Self {
        RedeemResponse {
            redeemed: true,
            next_token: outcome
                .next_token
                .map(|token| TokenDto::from_token(token, validity_window_ms)),
            rotation_error: outcome.rotation_error.map(|e| e.to_string()),
        }
    }
}
