//! Shared handler dependencies.

use std::sync::Arc;

use ticketdesk_infra::{ContinuationTokenStore, InMemoryTokenStore, ReaperConfig, TokenReaper};

/// Everything handlers need besides the request itself.
#[derive(Clone)]
pub struct AppServices {
    pub tokens: Arc<dyn ContinuationTokenStore>,
    pub reaper: TokenReaper,
}

impl AppServices {
    pub fn new(tokens: Arc<dyn ContinuationTokenStore>, reaper: ReaperConfig) -> Self {
        Self {
            reaper: TokenReaper::new(tokens.clone(), reaper),
            tokens,
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTokenStore::new()), ReaperConfig::default())
    }
}
