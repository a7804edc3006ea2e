use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use ticketdesk_auth::{ContinuationToken, TokenId};
use ticketdesk_core::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenStoreError {
    /// The backing store could not be reached or refused the statement.
    #[error("token store unavailable: {0}")]
    Storage(String),

    #[error("token {0} already exists")]
    Duplicate(TokenId),

    /// A persisted row could not be mapped back into a token.
    #[error("corrupt token record: {0}")]
    Corrupt(String),
}

/// Concurrency-safe store of continuation tokens.
#[async_trait]
pub trait ContinuationTokenStore: Send + Sync {
    async fn insert(&self, token: ContinuationToken) -> Result<(), TokenStoreError>;

    async fn find_by_secret(&self, secret: &str) -> Result<Option<ContinuationToken>, TokenStoreError>;

    /// Mark a token revoked. Idempotent: the first revocation time is kept.
    /// Returns `false` when no such token exists.
    async fn revoke(&self, id: TokenId, at: DateTime<Utc>) -> Result<bool, TokenStoreError>;

    /// Revoke every still-unrevoked token of a user; returns how many changed.
    async fn revoke_all_for_user(&self, user_id: UserId, at: DateTime<Utc>) -> Result<u64, TokenStoreError>;

    /// Delete tokens whose expiry lies strictly before `cutoff`, revoked or
    /// not. Returns the number of rows removed.
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, TokenStoreError>;
}
