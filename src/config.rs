use std::{env, str::FromStr, time::Duration};

use secrecy::SecretString;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Mongo,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub mongo_conn_string: SecretString,
    pub mongo_db_name: String,
    pub tokens_collection: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub validity_window_ms: i64,
    pub base_redemption_url: String,
    pub session_gate_url: String,
    pub subject_partitioning: bool,
    pub store_timeout_ms: u64,
    pub store_retry_backoff_ms: u64,
    pub sweep_interval_secs: u64,
    pub sweep_grace_ms: i64,
    pub qr_image_size: u32,
    pub cors_allowed_origin: Option<String>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or_default(key, env::var(key).ok(), default, |v| v.trim().parse().ok())
}

/// Falls back to `default` when `raw` is unset or unparsable; the latter is
/// logged so a typo does not silently change behaviour.
fn parse_or_default<T>(
    key: &str,
    raw: Option<String>,
    default: T,
    parse: impl FnOnce(&str) -> Option<T>,
) -> T {
    let Some(raw) = raw else {
        return default;
    };

    match parse(&raw) {
        Some(value) => value,
        None => {
            log::warn!("Ignoring unparsable {}='{}', using the default", key, raw);
            default
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            store_backend: env_or("STORE_BACKEND", StoreBackend::Mongo),
            mongo_conn_string: SecretString::from(
                env::var("MONGO_CONN_STRING")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            ),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "quizgate-local".to_string()),
            tokens_collection: env::var("TOKENS_COLLECTION")
                .unwrap_or_else(|_| "access_tokens".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env_or("WEB_SERVER_PORT", 8080),
            validity_window_ms: env_or("VALIDITY_WINDOW_MS", 300_000),
            base_redemption_url: env::var("BASE_REDEMPTION_URL")
                .unwrap_or_else(|_| "http://localhost:8080/scan/validate".to_string()),
            session_gate_url: env::var("SESSION_GATE_URL").unwrap_or_else(|_| "/quiz".to_string()),
            subject_partitioning: parse_or_default(
                "SUBJECT_PARTITIONING",
                env::var("SUBJECT_PARTITIONING").ok(),
                false,
                parse_flag,
            ),
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", 5_000),
            store_retry_backoff_ms: env_or("STORE_RETRY_BACKOFF_MS", 100),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", 60),
            sweep_grace_ms: env_or("SWEEP_GRACE_MS", 60_000),
            qr_image_size: env_or("QR_IMAGE_SIZE", 256),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
        }
    }

    /// Rejects settings the token lifecycle cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.validity_window_ms <= 0 {
            return Err(format!(
                "VALIDITY_WINDOW_MS must be positive, got {}",
                self.validity_window_ms
            ));
        }

        if self.sweep_grace_ms < 0 {
            return Err(format!(
                "SWEEP_GRACE_MS must not be negative, got {}",
                self.sweep_grace_ms
            ));
        }

        if self.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be positive".to_string());
        }

        if self.qr_image_size == 0 {
            return Err("QR_IMAGE_SIZE must be positive".to_string());
        }

        Url::parse(&self.base_redemption_url).map_err(|e| {
            format!(
                "BASE_REDEMPTION_URL '{}' is not an absolute URL: {}",
                self.base_redemption_url, e
            )
        })?;

        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn store_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.store_retry_backoff_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.sweep_interval_secs))
        }
    }

    pub fn test_config() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            mongo_conn_string: SecretString::from("mongodb://localhost:27017".to_string()),
            mongo_db_name: "quizgate-test".to_string(),
            tokens_collection: "access_tokens".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            validity_window_ms: 300_000,
            base_redemption_url: "https://quiz.example.com/scan/validate".to_string(),
            session_gate_url: "/quiz".to_string(),
            subject_partitioning: false,
            store_timeout_ms: 1_000,
            store_retry_backoff_ms: 10,
            sweep_interval_secs: 0,
            sweep_grace_ms: 60_000,
            qr_image_size: 128,
            cors_allowed_origin: None,
        }
    }
}
