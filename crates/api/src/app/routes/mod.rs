use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use ticketdesk_auth::{AllowedRoles, RoleMapping};

use crate::authz::{RoleGate, require_role};
use crate::middleware::{TenantGateState, tenant_consistency};

pub mod admin;
pub mod session;
pub mod system;

/// Endpoints reachable without a credential.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
}

/// Endpoints behind both gates, grouped by allowed roles.
pub fn protected_router(mapping: Arc<RoleMapping>, tenant_gate: TenantGateState) -> Router {
    let any = Router::new()
        .route("/api/session", get(session::current))
        .route("/api/session/logout", post(session::logout));

    let staff = Router::new().route("/api/admin/maintenance/reap", post(admin::reap_now));

    let admin = Router::new().route(
        "/api/admin/users/:user_id/revoke-sessions",
        post(admin::revoke_sessions),
    );

    gated(any, AllowedRoles::ANY, &mapping, &tenant_gate)
        .merge(gated(staff, AllowedRoles::STAFF, &mapping, &tenant_gate))
        .merge(gated(admin, AllowedRoles::ADMIN, &mapping, &tenant_gate))
}

/// The role gate wraps the tenant gate, so it runs first.
fn gated(
    routes: Router,
    allowed: AllowedRoles,
    mapping: &Arc<RoleMapping>,
    tenant_gate: &TenantGateState,
) -> Router {
    routes
        .route_layer(from_fn_with_state(tenant_gate.clone(), tenant_consistency))
        .route_layer(from_fn_with_state(
            RoleGate::new(allowed, mapping.clone()),
            require_role,
        ))
}
