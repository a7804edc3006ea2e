//! `ticketdesk-core`: shared primitives for the request security pipeline.
//!
//! This crate contains **pure** building blocks (no transport or storage concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{TenantId, UserId};
