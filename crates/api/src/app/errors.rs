//! Error responses.
//!
//! Two shapes leave the API:
//! - gate rejections, written directly as `{ "message": ... }`;
//! - faults (`ApiError` and handler panics), rendered once by
//!   [`translate_failures`] as `application/problem+json`.
//!
//! Handlers never build problem bodies themselves. `ApiError::into_response`
//! only tags the response with a [`Fault`]; the outermost middleware turns
//! that tag into the final body, attaching the trace id and applying the
//! environment's disclosure rules.

use std::any::Any;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use ticketdesk_infra::{Environment, TokenStoreError};

pub const TRACE_ID_HEADER: &str = "x-trace-id";
const REQUEST_ID_HEADER: &str = "x-request-id";
const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Body for requests stopped by a gate.
pub fn gate_rejection(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

/// Faults raised by handlers, classified for translation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

impl From<TokenStoreError> for ApiError {
    fn from(err: TokenStoreError) -> Self {
        match err {
            TokenStoreError::Storage(_) | TokenStoreError::Corrupt(_) => ApiError::Storage(err.to_string()),
            TokenStoreError::Duplicate(_) => ApiError::Unclassified(anyhow::Error::new(err)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FaultClass {
    Storage,
    InvalidArgument,
    Unauthorized,
    NotFound,
    Unclassified,
}

impl FaultClass {
    pub fn status(self) -> StatusCode {
        match self {
            FaultClass::Storage | FaultClass::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
            FaultClass::InvalidArgument => StatusCode::BAD_REQUEST,
            FaultClass::Unauthorized => StatusCode::UNAUTHORIZED,
            FaultClass::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn type_uri(self) -> &'static str {
        match self {
            FaultClass::Storage | FaultClass::Unclassified => "https://tools.ietf.org/html/rfc9110#section-15.6.1",
            FaultClass::InvalidArgument => "https://tools.ietf.org/html/rfc9110#section-15.5.1",
            FaultClass::Unauthorized => "https://tools.ietf.org/html/rfc9110#section-15.5.2",
            FaultClass::NotFound => "https://tools.ietf.org/html/rfc9110#section-15.5.5",
        }
    }
}

/// Response tag carried from the fault site to [`translate_failures`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub class: FaultClass,
    pub message: String,
    /// Full diagnostic; only disclosed outside production.
    pub diagnostic: String,
}

impl Fault {
    pub fn into_response(self) -> Response {
        let mut response = self.class.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<&ApiError> for Fault {
    fn from(err: &ApiError) -> Self {
        let class = match err {
            ApiError::Storage(_) => FaultClass::Storage,
            ApiError::InvalidArgument(_) => FaultClass::InvalidArgument,
            ApiError::Unauthorized(_) => FaultClass::Unauthorized,
            ApiError::NotFound(_) => FaultClass::NotFound,
            ApiError::Unclassified(_) => FaultClass::Unclassified,
        };
        let diagnostic = match err {
            ApiError::Unclassified(inner) => format!("{inner:?}"),
            other => other.to_string(),
        };
        Fault {
            class,
            message: err.to_string(),
            diagnostic,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Fault::from(&self).into_response()
    }
}

/// Panic hook for `CatchPanicLayer::custom`.
pub fn panic_fault(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    Fault {
        class: FaultClass::Unclassified,
        diagnostic: format!("handler panicked: {message}"),
        message,
    }
    .into_response()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Correlation id for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(String);

impl TraceId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    /// Reuse a caller-provided request id when it looks like an opaque token.
    fn from_headers(headers: &axum::http::HeaderMap) -> Option<Self> {
        let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
        let valid = !raw.is_empty()
            && raw.len() <= 128
            && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Renders faults as problem responses.
#[derive(Debug, Clone, Copy)]
pub struct FailureTranslator {
    environment: Environment,
}

impl FailureTranslator {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn problem(&self, fault: &Fault, instance: &str, trace_id: &TraceId) -> ProblemResponse {
        let expose = !self.environment.is_production();
        let (title, detail) = match fault.class {
            FaultClass::Storage => ("Storage unavailable".to_string(), expose.then(|| fault.diagnostic.clone())),
            FaultClass::InvalidArgument => (fault.message.clone(), None),
            FaultClass::Unauthorized => ("Unauthorized".to_string(), expose.then(|| fault.message.clone())),
            FaultClass::NotFound => ("Resource not found".to_string(), expose.then(|| fault.message.clone())),
            FaultClass::Unclassified => (
                "An unexpected error occurred".to_string(),
                expose.then(|| fault.diagnostic.clone()),
            ),
        };

        ProblemResponse {
            type_uri: fault.class.type_uri().to_string(),
            title,
            status: fault.class.status().as_u16(),
            detail,
            instance: instance.to_string(),
            trace_id: Some(trace_id.as_str().to_string()),
        }
    }

    fn render(&self, fault: &Fault, instance: &str, trace_id: &TraceId) -> Response {
        let problem = self.problem(fault, instance, trace_id);
        let mut response = (fault.class.status(), Json(problem)).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE));
        response
    }
}

/// Outermost middleware: assigns the trace id and translates any [`Fault`]
/// produced further in.
pub async fn translate_failures(
    State(translator): State<FailureTranslator>,
    mut req: Request,
    next: Next,
) -> Response {
    let trace_id = TraceId::from_headers(req.headers()).unwrap_or_else(TraceId::generate);
    let instance = req.uri().path().to_string();
    req.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(req).await;

    if let Some(fault) = response.extensions_mut().remove::<Fault>() {
        let status = fault.class.status();
        if status.is_server_error() {
            error!(
                trace_id = trace_id.as_str(),
                path = %instance,
                class = ?fault.class,
                diagnostic = %fault.diagnostic,
                "request failed"
            );
        } else {
            warn!(
                trace_id = trace_id.as_str(),
                path = %instance,
                class = ?fault.class,
                message = %fault.message,
                "request rejected"
            );
        }
        response = translator.render(&fault, &instance, &trace_id);
    }

    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}
