use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Partition within which a single current token is tracked.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenScope {
    Global,
    Subject(String),
}

impl TokenScope {
    /// Maps a presented subject onto a scope for the configured deployment mode.
    /// Kiosk mode ignores the subject entirely.
    pub fn resolve(subject_partitioning: bool, subject: Option<&str>) -> AppResult<Self> {
        if !subject_partitioning {
            return Ok(TokenScope::Global);
        }

        match subject.map(str::trim) {
            Some(s) if !s.is_empty() => Ok(TokenScope::Subject(s.to_string())),
            _ => Err(AppError::InvalidToken(
                "A subject is required when subject partitioning is enabled".to_string(),
            )),
        }
    }

    pub fn key(&self) -> String {
        match self {
            TokenScope::Global => "global".to_string(),
            TokenScope::Subject(subject) => format!("subject:{}", subject),
        }
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            TokenScope::Global => None,
            TokenScope::Subject(subject) => Some(subject),
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccessToken {
    pub identifier: String,
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub issued_at: i64,
    pub used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<i64>,
    pub redemption_url: String,
    pub payload: String,
}

impl AccessToken {
    pub fn new(
        scope: &TokenScope,
        issued_at: i64,
        redemption_url: String,
        payload: String,
    ) -> Self {
        Self::with_identifier(new_identifier(), scope, issued_at, redemption_url, payload)
    }

    pub fn with_identifier(
        identifier: String,
        scope: &TokenScope,
        issued_at: i64,
        redemption_url: String,
        payload: String,
    ) -> Self {
        Self {
            identifier,
            scope: scope.key(),
            subject: scope.subject().map(str::to_string),
            issued_at,
            used: false,
            used_at: None,
            redemption_url,
            payload,
        }
    }

    pub fn belongs_to(&self, scope: &TokenScope) -> bool {
        self.scope == scope.key()
    }
}

pub fn new_identifier() -> String {
    Uuid::new_v4().to_string()
}
