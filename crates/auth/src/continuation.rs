use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ticketdesk_core::UserId;

/// Identifier of a continuation (refresh) token record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(Uuid);

impl TokenId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TokenId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Where a token was issued from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Persisted long-lived credential that renews short-lived access tokens.
///
/// Created at login, revoked at logout or on refresh rotation, and deleted by
/// the reaper once it is past the retention horizon.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub secret: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub issued_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub client: ClientMetadata,
}

impl ContinuationToken {
    pub fn new(
        user_id: UserId,
        secret: impl Into<String>,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
        client: ClientMetadata,
    ) -> Self {
        Self {
            id: TokenId::new(),
            user_id,
            secret: secret.into(),
            expires_at: issued_at + lifetime,
            revoked: false,
            issued_at,
            revoked_at: None,
            client,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Usable for a refresh: neither revoked nor expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired(now)
    }

    /// Expired for longer than `retention`; only such rows may be reaped.
    pub fn is_past_retention(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        self.expires_at < now - retention
    }
}

impl core::fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContinuationToken")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("revoked", &self.revoked)
            .field("issued_at", &self.issued_at)
            .field("revoked_at", &self.revoked_at)
            .field("client", &self.client)
            .finish()
    }
}
