//! Background workers.

mod token_reaper;

pub use token_reaper::{ReaperConfig, ReaperHandle, TokenReaper};
