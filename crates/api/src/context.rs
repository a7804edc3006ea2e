use serde::Serialize;

use ticketdesk_auth::Role;
use ticketdesk_core::{TenantId, UserId};

/// Role resolved by the authorization gate for the current request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuthorizedRole(pub Role);

/// Who is calling, for which tenant.
///
/// Assembled once both gates have passed and handed to handlers through the
/// request extensions. Identifiers are the reconciled values, so they agree
/// with the credential whenever one was presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    tenant_id: Option<TenantId>,
    user_id: Option<UserId>,
    role: Role,
    display_name: Option<String>,
}

impl RequestContext {
    pub fn new(
        tenant_id: Option<TenantId>,
        user_id: Option<UserId>,
        role: Role,
        display_name: Option<String>,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            role,
            display_name,
        }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}
