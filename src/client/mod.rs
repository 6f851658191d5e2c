//! Client Module
//!
//! Logic that runs on an editing client, independent of any UI toolkit or
//! socket library. The transport is abstracted behind [`SaveTransport`].
//!
//! ```text
//! client/
//! ├── mod.rs            - Module exports
//! ├── config.rs         - SaveSchedulerConfig
//! ├── retry.rs          - BackoffPolicy
//! └── save_scheduler.rs - Debounced save task and its handle
//! ```

/// Scheduler configuration
pub mod config;

/// Exponential backoff
pub mod retry;

/// Debounced saving with conflict handling
pub mod save_scheduler;

pub use config::SaveSchedulerConfig;
pub use retry::BackoffPolicy;
pub use save_scheduler::{
    Resolution, SaveError, SaveRequest, SaveResponse, SaveScheduler, SaveState, SaveTransport,
    TransportError,
};
