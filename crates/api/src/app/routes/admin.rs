use axum::{
    Json,
    extract::{Extension, Path, rejection::PathRejection},
};
use chrono::Utc;
use tracing::info;

use ticketdesk_core::UserId;

use crate::app::dto::{ReapResponse, RevokeSessionsResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestContext;

/// Revoke every continuation token of a user (forced sign-out).
pub async fn revoke_sessions(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<RevokeSessionsResponse>, ApiError> {
    let Path(raw) = path.map_err(|e| ApiError::invalid_argument(e.body_text()))?;
    let user_id = UserId::new(raw).map_err(|e| ApiError::invalid_argument(e.to_string()))?;

    let revoked = services.tokens.revoke_all_for_user(user_id, Utc::now()).await?;
    info!(
        user_id = %user_id,
        revoked,
        by = ?ctx.user_id(),
        "sessions revoked by administrator"
    );

    Ok(Json(RevokeSessionsResponse { user_id, revoked }))
}

/// Run one reaper cycle now.
pub async fn reap_now(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ReapResponse>, ApiError> {
    let removed = services.reaper.run_cycle(Utc::now()).await?;
    info!(removed, by = ?ctx.user_id(), "manual reaper cycle completed");

    Ok(Json(ReapResponse {
        removed,
        retention_days: services.reaper.config().retention.num_days(),
    }))
}
