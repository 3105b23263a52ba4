use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use url::Url;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{access_token::new_identifier, AccessToken, TokenScope},
    repositories::TokenRepository,
    services::{
        clock::Clock,
        db_helpers::{bounded, bounded_read},
        expiration_policy::ExpirationPolicy,
        qr_encoder::ImageEncoder,
    },
};

pub struct TokenIssuer {
    repository: Arc<dyn TokenRepository>,
    encoder: Arc<dyn ImageEncoder>,
    clock: Arc<dyn Clock>,
    policy: ExpirationPolicy,
    base_url: Url,
    store_timeout: Duration,
    retry_backoff: Duration,
    scope_locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive hold on one scope's issuance lock. Dropping it releases the lock
/// and forgets the scope once no other caller holds or awaits it.
struct ScopeLease<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    lock: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ScopeLease<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.lock.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl TokenIssuer {
    pub fn new(
        config: &Config,
        repository: Arc<dyn TokenRepository>,
        encoder: Arc<dyn ImageEncoder>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_redemption_url).map_err(|e| {
            AppError::InternalError(format!(
                "Invalid base redemption URL '{}': {}",
                config.base_redemption_url, e
            ))
        })?;

        Ok(Self {
            repository,
            encoder,
            clock,
            policy: ExpirationPolicy::new(config.validity_window_ms),
            base_url,
            store_timeout: config.store_timeout(),
            retry_backoff: config.store_retry_backoff(),
            scope_locks: DashMap::new(),
        })
    }

    /// Absolute URL carrying the identifier and issuance time as query parameters.
    pub fn redemption_url(&self, identifier: &str, issued_at: i64) -> String {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("identifier", identifier)
            .append_pair("timestamp", &issued_at.to_string());
        url.to_string()
    }

    /// Mints a new token for the scope unconditionally.
    pub async fn issue(&self, scope: &TokenScope) -> AppResult<AccessToken> {
        let _lease = self.lock_scope(scope).await;
        self.mint(scope).await
    }

    /// The live token of the scope, minting one if none is unused and unexpired.
    /// Calls for the same scope are serialized; different scopes never contend.
    pub async fn current(&self, scope: &TokenScope) -> AppResult<AccessToken> {
        let _lease = self.lock_scope(scope).await;

        let scope_key = scope.key();
        let floor = self.policy.freshness_floor(self.clock.now_ms());
        let existing = bounded_read(self.store_timeout, self.retry_backoff, "find_current", || {
            self.repository.find_current(&scope_key, floor)
        })
        .await?;

        match existing {
            Some(token) => Ok(token),
            None => self.mint(scope).await,
        }
    }

    // Caller holds the scope lock.
    async fn mint(&self, scope: &TokenScope) -> AppResult<AccessToken> {
        let identifier = new_identifier();
        let issued_at = self.clock.now_ms();
        let redemption_url = self.redemption_url(&identifier, issued_at);

        let payload = self.encoder.encode(&redemption_url).map_err(|e| {
            log::error!("Failed to encode token for scope {}: {}", scope, e);
            match e {
                AppError::EncodingFailed(_) => e,
                other => AppError::EncodingFailed(other.to_string()),
            }
        })?;

        let token =
            AccessToken::with_identifier(identifier, scope, issued_at, redemption_url, payload);
        let token = bounded(self.store_timeout, "put", self.repository.put(token)).await?;

        log::info!(
            "Issued token {} for scope {} at {}",
            token.identifier,
            scope,
            token.issued_at
        );
        Ok(token)
    }

    /// Number of scopes with an in-flight `issue` or `current` call.
    pub fn tracked_scopes(&self) -> usize {
        self.scope_locks.len()
    }

    async fn lock_scope(&self, scope: &TokenScope) -> ScopeLease<'_> {
        let key = scope.key();
        let lock = self
            .scope_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        // The lease exists before the await so a cancelled caller still cleans up.
        let mut lease = ScopeLease {
            locks: &self.scope_locks,
            key,
            lock: Some(lock.clone()),
            guard: None,
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }
}
