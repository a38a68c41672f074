//! # temp-file-registry - A Temporary In-Memory File Registry
//!
//! temp-file-registry keeps uploaded files in process memory for a limited
//! time and hands them back over an HTTP web API. Files are stored under a
//! caller-chosen key, expire after a configurable number of minutes, and can be
//! deleted on first read.
//!
//! ## Features
//!
//! - **Keyed Uploads**: `POST` a multipart form with `key`, `expiryTimeMinutes` and `file`
//! - **Downloads**: `GET` by key, optionally deleting the file once it has been sent
//! - **Expiry**: Expired files are never served and are reclaimed by a background sweeper
//! - **Async I/O**: Built on Tokio and axum, one task per request
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          temp-file-registry                             │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────────┐                                 │
//! │  │ HTTP Server │───>│ upload handler  │──┐                              │
//! │  │   (axum)    │───>│ download handler│──┤                              │
//! │  └─────────────┘    └─────────────────┘  │                              │
//! │                                          ▼                              │
//! │                     ┌──────────────────────────────────────────────┐    │
//! │                     │                  Registry                    │    │
//! │                     │        Mutex<HashMap<String, Entry>>         │    │
//! │                     └──────────────────────────────────────────────┘    │
//! │                                          ▲                              │
//! │                     ┌────────────────────┴────────────────────────┐     │
//! │                     │           ExpirySweeper                     │     │
//! │                     │      (Background Tokio Task)                │     │
//! │                     └─────────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use temp_file_registry::config::RegistryConfig;
//! use temp_file_registry::http::{router, AppState};
//! use temp_file_registry::storage::{start_expiry_sweeper, Registry};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Create the registry (shared by the handlers and the sweeper)
//!     let registry = Arc::new(Registry::new());
//!
//!     // Start the background expiry sweeper
//!     let _sweeper = start_expiry_sweeper(Arc::clone(&registry));
//!
//!     let app = router(AppState::new(registry, RegistryConfig::default()));
//!     let listener = TcpListener::bind("0.0.0.0:8888").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: Entries, the registry and the expiry sweeper
//! - [`http`]: Router, upload/download handlers and API errors
//! - [`config`]: Command-line flags and validated configuration
//!
//! ## Expiry
//!
//! Files expire in two ways:
//! 1. **On read**: A download checks the expiry and treats an expired file as absent
//! 2. **Active**: A background task sweeps expired files once a minute
//!
//! This ensures memory is reclaimed even for files that are never requested again.

pub mod config;
pub mod http;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::{Cli, Config, ConfigError, LogLevel, RegistryConfig};
pub use http::{router, ApiError, AppState};
pub use storage::{start_expiry_sweeper, Entry, ExpiryConfig, ExpirySweeper, Registry};

/// The default port the registry listens on
pub const DEFAULT_PORT: u16 = 8888;

/// The default host the registry binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Path prefix of every API route
pub const URL_PATH_PREFIX: &str = "/temp-file-registry/api/v1";

/// Version of temp-file-registry
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
