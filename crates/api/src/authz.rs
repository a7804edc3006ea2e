//! Role authorization gate.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use ticketdesk_auth::{AllowedRoles, Principal, RoleMapping, authorize_role};

use crate::app::errors::gate_rejection;
use crate::context::AuthorizedRole;

/// Per-route gate configuration: the statically declared allowed roles plus
/// the process-wide role mapping.
#[derive(Clone)]
pub struct RoleGate {
    pub allowed: AllowedRoles,
    pub mapping: Arc<RoleMapping>,
}

impl RoleGate {
    pub fn new(allowed: AllowedRoles, mapping: Arc<RoleMapping>) -> Self {
        Self { allowed, mapping }
    }
}

/// Reject callers whose role is missing, unrecognized, or not allowed.
///
/// Unauthenticated requests get 401, every other rejection 403. The allowed
/// set is never echoed back.
pub async fn require_role(State(gate): State<RoleGate>, mut req: Request, next: Next) -> Response {
    let principal = req.extensions().get::<Principal>();
    let subject = principal.and_then(Principal::subject).unwrap_or("-").to_string();
    let decision = authorize_role(principal, gate.allowed, &gate.mapping);
    let path = req.uri().path().to_string();

    match decision {
        Ok(role) => {
            info!(path = %path, subject = %subject, role = %role, "role gate allowed request");
            req.extensions_mut().insert(AuthorizedRole(role));
            next.run(req).await
        }
        Err(rejection) => {
            let status = if rejection.is_unauthenticated() {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::FORBIDDEN
            };
            warn!(path = %path, subject = %subject, reason = %rejection, "role gate denied request");
            gate_rejection(status, rejection.to_string())
        }
    }
}
