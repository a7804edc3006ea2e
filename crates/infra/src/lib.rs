//! Infrastructure layer: configuration, continuation token storage, and the
//! background token reaper.

pub mod config;
pub mod token_store;
pub mod workers;

pub use config::{AppConfig, ConfigError, Environment};
pub use token_store::{ContinuationTokenStore, InMemoryTokenStore, PostgresTokenStore, TokenStoreError};
pub use workers::{ReaperConfig, ReaperHandle, TokenReaper};
