/// Validity window arithmetic. A token is live while
/// `now - issued_at < window_ms`; at exactly the window it has expired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpirationPolicy {
    window_ms: i64,
}

impl ExpirationPolicy {
    pub fn new(window_ms: i64) -> Self {
        Self { window_ms }
    }

    pub fn is_expired(&self, issued_at: i64, now: i64) -> bool {
        now.saturating_sub(issued_at) >= self.window_ms
    }

    pub fn expires_at(&self, issued_at: i64) -> i64 {
        issued_at.saturating_add(self.window_ms)
    }

    /// Tokens issued strictly after this instant are still live at `now`.
    pub fn freshness_floor(&self, now: i64) -> i64 {
        now.saturating_sub(self.window_ms)
    }

    /// Tokens issued before this instant are past the window plus `grace_ms`
    /// and may be deleted.
    pub fn sweep_cutoff(&self, now: i64, grace_ms: i64) -> i64 {
        now.saturating_sub(self.window_ms).saturating_sub(grace_ms)
    }
}
