use crate::models::domain::{AccessToken, TokenScope};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// Global-scope token issued at `issued_at` with a placeholder payload.
    pub fn token_issued_at(issued_at: i64) -> AccessToken {
        token_for(&TokenScope::Global, issued_at)
    }

    pub fn token_for(scope: &TokenScope, issued_at: i64) -> AccessToken {
        AccessToken::new(
            scope,
            issued_at,
            "https://quiz.example.com/scan/validate".to_string(),
            "data:image/png;base64,".to_string(),
        )
    }

    pub fn subject(name: &str) -> TokenScope {
        TokenScope::Subject(name.to_string())
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_token_issued_at() {
        let token = token_issued_at(42);
        assert_eq!(token.issued_at, 42);
        assert_eq!(token.scope, "global");
        assert!(!token.used);
    }

    #[test]
    fn test_fixtures_token_for_subject() {
        let token = token_for(&subject("alice"), 7);
        assert_eq!(token.subject.as_deref(), Some("alice"));
        assert_eq!(token.scope, "subject:alice");
    }
}
