//! Continuation-token persistence.
//!
//! Every mutation is a single idempotent statement ("mark row X revoked",
//! "delete rows older than cutoff"), so logout, refresh rotation, and the
//! reaper can run concurrently without read-modify-write races.

mod in_memory;
mod postgres;
mod r#trait;

pub use in_memory::InMemoryTokenStore;
pub use postgres::PostgresTokenStore;
pub use r#trait::{ContinuationTokenStore, TokenStoreError};
