use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{AccessToken, TokenScope},
    repositories::{MarkUsedOutcome, TokenRepository},
    services::{
        clock::Clock, db_helpers::bounded, expiration_policy::ExpirationPolicy,
        token_issuer::TokenIssuer,
    },
};

/// A consumed token and whatever rotation produced.
///
/// `rotation_error` is set when the replacement could not be minted. The
/// redemption itself stands; the next `current()` call mints the replacement.
#[derive(Debug)]
pub struct RedemptionOutcome {
    pub redeemed: AccessToken,
    pub next_token: Option<AccessToken>,
    pub rotation_error: Option<AppError>,
}

pub struct RedemptionService {
    repository: Arc<dyn TokenRepository>,
    issuer: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
    policy: ExpirationPolicy,
    subject_partitioning: bool,
    store_timeout: Duration,
}

// Unknown identifiers and foreign-scope identifiers must be indistinguishable.
fn invalid_token() -> AppError {
    AppError::InvalidToken("Token is not valid".to_string())
}

impl RedemptionService {
    pub fn new(
        config: &Config,
        repository: Arc<dyn TokenRepository>,
        issuer: Arc<TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            issuer,
            clock,
            policy: ExpirationPolicy::new(config.validity_window_ms),
            subject_partitioning: config.subject_partitioning,
            store_timeout: config.store_timeout(),
        }
    }

    pub async fn redeem(
        &self,
        identifier: &str,
        subject: Option<&str>,
        presented_timestamp: Option<i64>,
    ) -> AppResult<RedemptionOutcome> {
        let scope = TokenScope::resolve(self.subject_partitioning, subject)?;

        let record = bounded(self.store_timeout, "get", self.repository.get(identifier))
            .await?
            .ok_or_else(invalid_token)?;

        if !record.belongs_to(&scope) {
            log::debug!("Token {} presented under foreign scope {}", identifier, scope);
            return Err(invalid_token());
        }

        if presented_timestamp.is_some_and(|ts| ts != record.issued_at) {
            log::debug!("Token {} presented with mismatched timestamp", identifier);
            return Err(invalid_token());
        }

        if record.used {
            return Err(AppError::AlreadyUsed(format!(
                "Token {} has already been redeemed",
                identifier
            )));
        }

        let now = self.clock.now_ms();
        if self.policy.is_expired(record.issued_at, now) {
            log::info!(
                "Rejected expired token {} ({}ms old)",
                identifier,
                now.saturating_sub(record.issued_at)
            );
            return Err(AppError::Expired(format!(
                "Token {} expired at {}",
                identifier,
                self.policy.expires_at(record.issued_at)
            )));
        }

        // Never retried: a timeout here is ambiguous and a retry could rotate twice.
        let outcome = bounded(
            self.store_timeout,
            "compare_and_mark_used",
            self.repository.compare_and_mark_used(identifier, now),
        )
        .await?;

        let redeemed = match outcome {
            MarkUsedOutcome::Marked(token) => token,
            MarkUsedOutcome::AlreadyUsed => {
                return Err(AppError::AlreadyUsed(format!(
                    "Token {} has already been redeemed",
                    identifier
                )))
            }
            MarkUsedOutcome::NotFound => return Err(invalid_token()),
        };

        log::info!("Redeemed token {} for scope {}", identifier, scope);

        let (next_token, rotation_error) = match self.issuer.current(&scope).await {
            Ok(next) => (Some(next), None),
            Err(e) => {
                log::warn!(
                    "Rotation after redeeming {} failed for scope {}: {}",
                    identifier,
                    scope,
                    e
                );
                (None, Some(e))
            }
        };

        Ok(RedemptionOutcome {
            redeemed,
            next_token,
            rotation_error,
        })
    }
}
