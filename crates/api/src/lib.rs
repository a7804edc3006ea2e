//! HTTP API: router, request security pipeline, and failure translation.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
