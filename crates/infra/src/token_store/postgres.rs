//! Postgres-backed continuation token store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | TokenStoreError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation) | `23505` | `Duplicate` (on insert) |
//! | Database (other) | Any other | `Storage` |
//! | ColumnDecode / Decode | N/A | `Corrupt` |
//! | PoolTimedOut / PoolClosed / Io / other | N/A | `Storage` |
//!
//! Every mutation is a single statement. `revoke` uses `COALESCE` so that a
//! repeated revocation keeps the first timestamp.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use async_trait::async_trait;
use ticketdesk_auth::{ClientMetadata, ContinuationToken, TokenId};
use ticketdesk_core::UserId;

use super::r#trait::{ContinuationTokenStore, TokenStoreError};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS continuation_tokens (
    id          UUID PRIMARY KEY,
    user_id     BIGINT NOT NULL CHECK (user_id > 0),
    secret      TEXT NOT NULL UNIQUE,
    expires_at  TIMESTAMPTZ NOT NULL,
    revoked     BOOLEAN NOT NULL DEFAULT FALSE,
    issued_at   TIMESTAMPTZ NOT NULL,
    revoked_at  TIMESTAMPTZ NULL,
    ip_address  TEXT NULL,
    user_agent  TEXT NULL
)
"#;

const CREATE_EXPIRY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS continuation_tokens_expires_at_idx ON continuation_tokens (expires_at)";

#[derive(Debug, Clone)]
pub struct PostgresTokenStore {
    pool: Arc<PgPool>,
}

impl PostgresTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect lazily; the first statement opens the connection.
    pub fn connect_lazy(database_url: &str) -> Result<Self, TokenStoreError> {
        let pool = PgPool::connect_lazy(database_url).map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the table and expiry index when missing.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), TokenStoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        sqlx::query(CREATE_EXPIRY_INDEX)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct TokenRow {
    id: Uuid,
    user_id: i64,
    secret: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
    issued_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl TryFrom<TokenRow> for ContinuationToken {
    type Error = TokenStoreError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id)
            .map_err(|e| TokenStoreError::Corrupt(format!("token {}: {e}", row.id)))?;
        Ok(ContinuationToken {
            id: TokenId::from_uuid(row.id),
            user_id,
            secret: row.secret,
            expires_at: row.expires_at,
            revoked: row.revoked,
            issued_at: row.issued_at,
            revoked_at: row.revoked_at,
            client: ClientMetadata {
                ip_address: row.ip_address,
                user_agent: row.user_agent,
            },
        })
    }
}

#[async_trait]
impl ContinuationTokenStore for PostgresTokenStore {
    #[instrument(skip(self, token), fields(token_id = %token.id, user_id = %token.user_id), err)]
    async fn insert(&self, token: ContinuationToken) -> Result<(), TokenStoreError> {
        let id = token.id;
        sqlx::query(
            r#"
            INSERT INTO continuation_tokens
                (id, user_id, secret, expires_at, revoked, issued_at, revoked_at, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*token.id.as_uuid())
        .bind(token.user_id.get())
        .bind(&token.secret)
        .bind(token.expires_at)
        .bind(token.revoked)
        .bind(token.issued_at)
        .bind(token.revoked_at)
        .bind(&token.client.ip_address)
        .bind(&token.client.user_agent)
        .execute(&*self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => TokenStoreError::Duplicate(id),
            _ => map_sqlx_error("insert", e),
        })?;
        Ok(())
    }

    #[instrument(skip(self, secret), err)]
    async fn find_by_secret(&self, secret: &str) -> Result<Option<ContinuationToken>, TokenStoreError> {
        let row: Option<TokenRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, secret, expires_at, revoked, issued_at, revoked_at, ip_address, user_agent
            FROM continuation_tokens
            WHERE secret = $1
            "#,
        )
        .bind(secret)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_secret", e))?;

        row.map(ContinuationToken::try_from).transpose()
    }

    #[instrument(skip(self), fields(token_id = %id), err)]
    async fn revoke(&self, id: TokenId, at: DateTime<Utc>) -> Result<bool, TokenStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE continuation_tokens
            SET revoked = TRUE, revoked_at = COALESCE(revoked_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .bind(at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("revoke", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn revoke_all_for_user(&self, user_id: UserId, at: DateTime<Utc>) -> Result<u64, TokenStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE continuation_tokens
            SET revoked = TRUE, revoked_at = $2
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id.get())
        .bind(at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("revoke_all_for_user", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, TokenStoreError> {
        let result = sqlx::query("DELETE FROM continuation_tokens WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_expired_before", e))?;
        Ok(result.rows_affected())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> TokenStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            TokenStoreError::Storage(format!("database error in {} ({}): {}", operation, code, db_err.message()))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            TokenStoreError::Corrupt(format!("{}: {}", operation, err))
        }
        other => TokenStoreError::Storage(format!("{} failed: {}", operation, other)),
    }
}
