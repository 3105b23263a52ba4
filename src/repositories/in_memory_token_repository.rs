use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::AccessToken,
    repositories::token_repository::{MarkUsedOutcome, TokenRepository},
};

/// Process-local store. The write lock serializes every compare-and-set, so it
/// only gives the exactly-once guarantee to callers sharing this instance.
#[derive(Clone, Default)]
pub struct InMemoryTokenRepository {
    tokens: Arc<RwLock<HashMap<String, AccessToken>>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn get(&self, identifier: &str) -> AppResult<Option<AccessToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(identifier).cloned())
    }

    async fn put(&self, token: AccessToken) -> AppResult<AccessToken> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.identifier) {
            return Err(AppError::InternalError(format!(
                "Token with identifier '{}' already exists",
                token.identifier
            )));
        }

        tokens.insert(token.identifier.clone(), token.clone());
        Ok(token)
    }

    async fn compare_and_mark_used(
        &self,
        identifier: &str,
        used_at: i64,
    ) -> AppResult<MarkUsedOutcome> {
        let mut tokens = self.tokens.write().await;
        let Some(token) = tokens.get_mut(identifier) else {
            return Ok(MarkUsedOutcome::NotFound);
        };

        if token.used {
            return Ok(MarkUsedOutcome::AlreadyUsed);
        }

        token.used = true;
        token.used_at = Some(used_at);
        Ok(MarkUsedOutcome::Marked(token.clone()))
    }

    async fn find_current(
        &self,
        scope_key: &str,
        issued_after: i64,
    ) -> AppResult<Option<AccessToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| t.scope == scope_key && !t.used && t.issued_at > issued_after)
            .max_by_key(|t| t.issued_at)
            .cloned())
    }

    async fn delete_issued_before(&self, cutoff: i64) -> AppResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.issued_at >= cutoff);
        Ok((before - tokens.len()) as u64)
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{subject, token_for, token_issued_at as token_at};

    #[tokio::test]
    async fn test_put_rejects_duplicate_identifier() {
        let repo = InMemoryTokenRepository::new();
        let token = token_at(0);

        repo.put(token.clone()).await.expect("first put");
        let duplicate = repo.put(token).await;
        assert!(matches!(duplicate, Err(AppError::InternalError(_))));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_mark_used_transitions_once() {
        let repo = InMemoryTokenRepository::new();
        let token = repo.put(token_at(0)).await.unwrap();

        let first = repo.compare_and_mark_used(&token.identifier, 10).await.unwrap();
        match first {
            MarkUsedOutcome::Marked(marked) => {
                assert!(marked.used);
                assert_eq!(marked.used_at, Some(10));
                assert_eq!(marked.issued_at, 0);
            }
            other => panic!("expected Marked, got {:?}", other),
        }

        let second = repo.compare_and_mark_used(&token.identifier, 11).await.unwrap();
        assert_eq!(second, MarkUsedOutcome::AlreadyUsed);

        let stored = repo.get(&token.identifier).await.unwrap().unwrap();
        assert_eq!(stored.used_at, Some(10));
    }

    #[tokio::test]
    async fn test_mark_used_unknown_identifier() {
        let repo = InMemoryTokenRepository::new();
        let outcome = repo.compare_and_mark_used("missing", 0).await.unwrap();
        assert_eq!(outcome, MarkUsedOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_find_current_picks_newest_fresh_unused() {
        let repo = InMemoryTokenRepository::new();
        let old = repo.put(token_at(100)).await.unwrap();
        let newest = repo.put(token_at(300)).await.unwrap();
        let used = repo.put(token_at(400)).await.unwrap();
        repo.compare_and_mark_used(&used.identifier, 401).await.unwrap();

        let current = repo.find_current("global", 50).await.unwrap().unwrap();
        assert_eq!(current.identifier, newest.identifier);

        let none_fresh = repo.find_current("global", 300).await.unwrap();
        assert!(none_fresh.is_none());

        let other_scope = repo.find_current("subject:alice", 0).await.unwrap();
        assert!(other_scope.is_none());

        let alice = repo.put(token_for(&subject("alice"), 500)).await.unwrap();
        let alice_current = repo.find_current("subject:alice", 0).await.unwrap().unwrap();
        assert_eq!(alice_current.identifier, alice.identifier);
        let global_current = repo.find_current("global", 50).await.unwrap().unwrap();
        assert_eq!(global_current.identifier, newest.identifier);
        assert!(repo.get(&old.identifier).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_issued_before() {
        let repo = InMemoryTokenRepository::new();
        repo.put(token_at(10)).await.unwrap();
        repo.put(token_at(20)).await.unwrap();
        let kept = repo.put(token_at(30)).await.unwrap();

        let deleted = repo.delete_issued_before(30).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(repo.len().await, 1);
        assert!(repo.get(&kept.identifier).await.unwrap().is_some());
    }
}
