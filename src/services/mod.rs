pub mod clock;
pub mod db_helpers;
pub mod expiration_policy;
pub mod expiration_sweeper;
pub mod http_helpers;
pub mod qr_encoder;
pub mod redemption_service;
pub mod token_issuer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use expiration_policy::ExpirationPolicy;
pub use expiration_sweeper::ExpirationSweeper;
pub use qr_encoder::{ImageEncoder, QrImageEncoder};
pub use redemption_service::{RedemptionOutcome, RedemptionService};
pub use token_issuer::TokenIssuer;
