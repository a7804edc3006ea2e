//! Bearer verification and the tenant consistency gate.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, warn};

use ticketdesk_auth::{
    ConsistencyRejection, IdentityHeaders, JwtValidator, Principal, PublicPaths, TENANT_HEADER,
    USER_HEADER, reconcile,
};

use crate::app::errors::gate_rejection;
use crate::context::{AuthorizedRole, RequestContext};

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Turn a valid bearer credential into a [`Principal`] in the request
/// extensions.
///
/// Never rejects: a missing or invalid credential simply leaves the request
/// unauthenticated and the gates decide.
pub async fn authenticate(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let principal = extract_bearer(req.headers()).and_then(|token| match state.jwt.validate(token, Utc::now()) {
        Ok(claims) => Some(Principal::from_claims(claims)),
        Err(err) => {
            debug!(error = %err, "bearer credential rejected; continuing unauthenticated");
            None
        }
    });

    if let Some(principal) = principal {
        req.extensions_mut().insert(principal);
    }

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct TenantGateState {
    pub public_paths: Arc<PublicPaths>,
}

/// Validate `X-Tenant-Id` / `X-User-Id` and cross-check them with the
/// credential.
///
/// Absent headers are backfilled from the credential; on success each header
/// is rewritten to its single validated value. A [`RequestContext`] is
/// inserted when the role gate ran before this one. Public paths pass through
/// untouched, although the router already mounts them outside this gate.
pub async fn tenant_consistency(
    State(state): State<TenantGateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if state.public_paths.is_public(&path) {
        return next.run(req).await;
    }

    let principal = req.extensions().get::<Principal>().cloned();
    let subject = principal.as_ref().and_then(Principal::subject).unwrap_or("-").to_string();

    let reconciled = identity_headers(req.headers())
        .and_then(|headers| reconcile(headers, principal.as_ref()));

    let identity = match reconciled {
        Ok(identity) => identity,
        Err(rejection) => {
            let status = match rejection {
                ConsistencyRejection::HeaderMalformed { .. } => StatusCode::BAD_REQUEST,
                ConsistencyRejection::IdentityMismatch { .. } => StatusCode::FORBIDDEN,
            };
            warn!(
                path = %path,
                subject = %subject,
                reason = %rejection,
                "tenant consistency gate rejected request"
            );
            return gate_rejection(status, rejection.to_string());
        }
    };

    for (name, _) in &identity.backfilled {
        debug!(header = *name, subject = %subject, "identity header backfilled from credential");
    }
    // Downstream consumers only ever see the single validated value.
    let tenant = identity.tenant_id.map(|id| id.to_string());
    let user = identity.user_id.map(|id| id.to_string());
    set_header(req.headers_mut(), TENANT_HEADER, tenant.as_deref());
    set_header(req.headers_mut(), USER_HEADER, user.as_deref());

    if let Some(AuthorizedRole(role)) = req.extensions().get::<AuthorizedRole>().copied() {
        let context = RequestContext::new(
            identity.tenant_id,
            identity.user_id,
            role,
            principal.as_ref().and_then(Principal::display_name).map(str::to_string),
        );
        req.extensions_mut().insert(context);
    }
    req.extensions_mut().insert(identity);

    next.run(req).await
}

fn identity_headers(headers: &HeaderMap) -> Result<IdentityHeaders, ConsistencyRejection> {
    Ok(IdentityHeaders {
        tenant: header_value(headers, TENANT_HEADER)?,
        user: header_value(headers, USER_HEADER)?,
    })
}

/// Blank values count as absent. More than one non-blank value is malformed:
/// only one identifier can be cross-checked against the credential.
fn header_value(headers: &HeaderMap, name: &'static str) -> Result<Option<String>, ConsistencyRejection> {
    let mut values = headers
        .get_all(name)
        .iter()
        .map(|raw| String::from_utf8_lossy(raw.as_bytes()).trim().to_string())
        .filter(|value| !value.is_empty());

    let first = values.next();
    if values.next().is_some() {
        return Err(ConsistencyRejection::HeaderMalformed { header: name });
    }
    Ok(first)
}

/// Replace every copy of `name` with `value`, or drop the header when `None`.
fn set_header(headers: &mut HeaderMap, name: &'static str, value: Option<&str>) {
    let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
        return;
    };
    match value.map(HeaderValue::from_str) {
        Some(Ok(value)) => {
            headers.insert(name, value);
        }
        Some(Err(_)) | None => {
            headers.remove(name);
        }
    }
}
