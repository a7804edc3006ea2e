use serde::{Deserialize, Serialize};

use ticketdesk_core::{TenantId, UserId};

use crate::context::RequestContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub tenant_id: Option<TenantId>,
    pub user_id: Option<UserId>,
    pub role: u8,
    pub role_name: &'static str,
    pub display_name: Option<String>,
}

impl From<&RequestContext> for SessionView {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            tenant_id: ctx.tenant_id(),
            user_id: ctx.user_id(),
            role: ctx.role().code(),
            role_name: ctx.role().as_str(),
            display_name: ctx.display_name().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeSessionsResponse {
    pub user_id: UserId,
    pub revoked: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReapResponse {
    pub removed: u64,
    pub retention_days: i64,
}
