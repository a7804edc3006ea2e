use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ticketdesk_auth::{ContinuationToken, TokenId};
use ticketdesk_core::UserId;

use super::r#trait::{ContinuationTokenStore, TokenStoreError};

/// In-memory token store.
///
/// Intended for tests/dev. Locks are held only for the duration of a single
/// synchronous map operation, never across an await.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<TokenId, ContinuationToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored tokens (test/debug helper).
    pub fn all(&self) -> Vec<ContinuationToken> {
        match self.tokens.read() {
            Ok(guard) => guard.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().values().cloned().collect(),
        }
    }

    fn poisoned() -> TokenStoreError {
        TokenStoreError::Storage("in-memory token store lock poisoned".to_string())
    }
}

#[async_trait]
impl ContinuationTokenStore for InMemoryTokenStore {
    async fn insert(&self, token: ContinuationToken) -> Result<(), TokenStoreError> {
        let mut guard = self.tokens.write().map_err(|_| Self::poisoned())?;
        if guard.contains_key(&token.id) {
            return Err(TokenStoreError::Duplicate(token.id));
        }
        guard.insert(token.id, token);
        Ok(())
    }

    async fn find_by_secret(&self, secret: &str) -> Result<Option<ContinuationToken>, TokenStoreError> {
        let guard = self.tokens.read().map_err(|_| Self::poisoned())?;
        Ok(guard.values().find(|t| t.secret == secret).cloned())
    }

    async fn revoke(&self, id: TokenId, at: DateTime<Utc>) -> Result<bool, TokenStoreError> {
        let mut guard = self.tokens.write().map_err(|_| Self::poisoned())?;
        let Some(token) = guard.get_mut(&id) else {
            return Ok(false);
        };
        if !token.revoked {
            token.revoked = true;
            token.revoked_at = Some(at);
        }
        Ok(true)
    }

    async fn revoke_all_for_user(&self, user_id: UserId, at: DateTime<Utc>) -> Result<u64, TokenStoreError> {
        let mut guard = self.tokens.write().map_err(|_| Self::poisoned())?;
        let mut changed = 0u64;
        for token in guard.values_mut().filter(|t| t.user_id == user_id && !t.revoked) {
            token.revoked = true;
            token.revoked_at = Some(at);
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, TokenStoreError> {
        let mut guard = self.tokens.write().map_err(|_| Self::poisoned())?;
        let before = guard.len();
        guard.retain(|_, t| t.expires_at >= cutoff);
        Ok((before - guard.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ticketdesk_auth::ClientMetadata;

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn token(user_id: UserId, secret: &str, issued_at: DateTime<Utc>) -> ContinuationToken {
        ContinuationToken::new(user_id, secret, issued_at, Duration::days(7), ClientMetadata::default())
    }

    #[tokio::test]
    async fn insert_and_find_by_secret() {
        let store = InMemoryTokenStore::new();
        let t = token(user(1), "abc", Utc::now());
        store.insert(t.clone()).await.unwrap();

        assert_eq!(store.find_by_secret("abc").await.unwrap(), Some(t.clone()));
        assert_eq!(store.find_by_secret("nope").await.unwrap(), None);
        assert_eq!(store.insert(t.clone()).await, Err(TokenStoreError::Duplicate(t.id)));
    }

    #[tokio::test]
    async fn revoke_is_idempotent_and_keeps_first_timestamp() {
        let store = InMemoryTokenStore::new();
        let now = Utc::now();
        let t = token(user(1), "abc", now);
        store.insert(t.clone()).await.unwrap();

        assert!(store.revoke(t.id, now).await.unwrap());
        assert!(store.revoke(t.id, now + Duration::minutes(5)).await.unwrap());

        let stored = store.find_by_secret("abc").await.unwrap().unwrap();
        assert!(stored.revoked);
        assert_eq!(stored.revoked_at, Some(now));

        assert!(!store.revoke(TokenId::new(), now).await.unwrap());
    }

    #[tokio::test]
    async fn revoke_all_only_touches_that_user() {
        let store = InMemoryTokenStore::new();
        let now = Utc::now();
        store.insert(token(user(1), "a", now)).await.unwrap();
        store.insert(token(user(1), "b", now)).await.unwrap();
        store.insert(token(user(2), "c", now)).await.unwrap();

        assert_eq!(store.revoke_all_for_user(user(1), now).await.unwrap(), 2);
        assert_eq!(store.revoke_all_for_user(user(1), now).await.unwrap(), 0);
        assert!(!store.find_by_secret("c").await.unwrap().unwrap().revoked);
    }

    #[tokio::test]
    async fn delete_expired_before_is_strict() {
        let store = InMemoryTokenStore::new();
        let now = Utc::now();
        let old = token(user(1), "old", now - Duration::days(60));
        let edge = token(user(1), "edge", now - Duration::days(7));
        store.insert(old).await.unwrap();
        store.insert(edge.clone()).await.unwrap();

        let removed = store.delete_expired_before(edge.expires_at).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.all(), vec![edge]);
    }
}
