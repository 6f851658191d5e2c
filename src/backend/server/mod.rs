//! Server Module
//!
//! Initializes and configures the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - ServerConfig, database and store loading
//! └── init.rs         - App creation and background tasks
//! ```
//!
//! # State Management
//!
//! `AppState` holds the presence registry, the admission controller, the
//! identity resolver, the collab service and the notebook store. All of them
//! are shared behind `Arc` and synchronize internally.
//!
//! # Example
//!
//! ```rust,no_run
//! use notecollab::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::builder().jwt_secret("dev-secret").build()?;
//! let app = create_app(config).await;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::{ConfigError, ServerConfig};
pub use init::{build_app, create_app};
pub use state::AppState;
