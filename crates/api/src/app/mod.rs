//! HTTP application wiring (Axum router + security pipeline).
//!
//! Layout:
//! - `routes/`: handlers, grouped by area, plus the per-route gate wiring
//! - `services.rs`: shared dependencies handed to handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: gate rejection bodies and the failure translator

use std::sync::Arc;

use axum::{Extension, Router, middleware::from_fn_with_state};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use ticketdesk_auth::{Hs256JwtValidator, PublicPaths, RoleMapping};
use ticketdesk_infra::Environment;

use crate::middleware::{self, TenantGateState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub jwt_secret: String,
    pub environment: Environment,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Request order, outermost first: failure translator, panic catcher,
/// bearer verifier, then per route the role gate and the tenant gate.
pub fn build_app(settings: AppSettings, services: AppServices) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(settings.jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };
    let mapping = Arc::new(RoleMapping::standard());
    let tenant_gate = TenantGateState {
        public_paths: Arc::new(PublicPaths::standard()),
    };

    let app = routes::public_router()
        .merge(routes::protected_router(mapping, tenant_gate))
        .layer(Extension(services))
        .layer(from_fn_with_state(auth_state, middleware::authenticate));

    with_failure_boundary(app, errors::FailureTranslator::new(settings.environment))
}

/// Wrap a router so that every fault and panic inside it is translated once.
pub fn with_failure_boundary(router: Router, translator: errors::FailureTranslator) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(translator, errors::translate_failures))
            .layer(CatchPanicLayer::custom(errors::panic_fault)),
    )
}
