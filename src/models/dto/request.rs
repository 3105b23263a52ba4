use async_graphql::InputObject;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CurrentTokenQuery {
    #[validate(length(min = 1, max = 128))]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct RedeemRequest {
    #[validate(length(min = 1, max = 128))]
    pub identifier: String,

    #[validate(length(min = 1, max = 128))]
    pub subject: Option<String>,

    /// Issuance time echoed back from the redemption URL, in epoch milliseconds.
    #[validate(range(min = 0))]
    pub timestamp: Option<i64>,
}

/// Query string of the redemption URL encoded into the QR image.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScanQuery {
    #[validate(length(min = 1, max = 128))]
    pub identifier: String,

    #[validate(range(min = 0))]
    pub timestamp: Option<i64>,

    #[validate(length(min = 1, max = 128))]
    pub subject: Option<String>,
}

impl From<ScanQuery> for RedeemRequest {
    fn from(query: ScanQuery) -> Self {
        RedeemRequest {
            identifier: query.identifier,
            subject: query.subject,
            timestamp: query.timestamp,
        }
    }
}
