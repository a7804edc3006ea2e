use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;

use crate::app::dto::{LogoutRequest, SessionView};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub async fn current(Extension(ctx): Extension<RequestContext>) -> Json<SessionView> {
    Json(SessionView::from(&ctx))
}

/// Revoke one of the caller's own continuation tokens.
///
/// Tokens owned by someone else are reported as not found.
pub async fn logout(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::invalid_argument(e.body_text()))?;
    let secret = body
        .refresh_token
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::invalid_argument("refreshToken is required"))?;

    let user_id = ctx
        .user_id()
        .ok_or_else(|| ApiError::unauthorized("credential does not identify a user"))?;

    let token = services
        .tokens
        .find_by_secret(secret)
        .await?
        .filter(|t| t.user_id == user_id)
        .ok_or_else(|| ApiError::not_found("refresh token not found"))?;

    if !services.tokens.revoke(token.id, Utc::now()).await? {
        return Err(ApiError::not_found("refresh token not found"));
    }

    info!(user_id = %user_id, token_id = %token.id, "continuation token revoked at logout");
    Ok(StatusCode::NO_CONTENT)
}
