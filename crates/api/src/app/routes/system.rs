use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
