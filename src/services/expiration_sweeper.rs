use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{
    config::Config,
    errors::AppResult,
    repositories::TokenRepository,
    services::{clock::Clock, db_helpers::bounded, expiration_policy::ExpirationPolicy},
};

/// Periodically deletes tokens issued before `now - window - grace`.
///
/// Runs outside request handling and takes no scope lock; anything a request
/// could still be validating is younger than the cutoff.
pub struct ExpirationSweeper {
    repository: Arc<dyn TokenRepository>,
    clock: Arc<dyn Clock>,
    policy: ExpirationPolicy,
    grace_ms: i64,
    store_timeout: Duration,
}

impl ExpirationSweeper {
    pub fn new(config: &Config, repository: Arc<dyn TokenRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            policy: ExpirationPolicy::new(config.validity_window_ms),
            grace_ms: config.sweep_grace_ms,
            store_timeout: config.store_timeout(),
        }
    }

    pub async fn sweep_once(&self) -> AppResult<u64> {
        let cutoff = self.policy.sweep_cutoff(self.clock.now_ms(), self.grace_ms);
        let deleted = bounded(
            self.store_timeout,
            "delete_issued_before",
            self.repository.delete_issued_before(cutoff),
        )
        .await?;

        if deleted > 0 {
            log::info!("Swept {} stale tokens issued before {}", deleted, cutoff);
        } else {
            log::debug!("Sweep found no tokens issued before {}", cutoff);
        }
        Ok(deleted)
    }

    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        log::info!("Starting token sweeper every {}s", interval.as_secs());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once().await {
                    log::error!("Token sweep failed, retrying next tick: {}", e);
                }
            }
        })
    }
}
