//! Storage Module
//!
//! This module provides the in-memory core of the file registry: the stored
//! [`Entry`] type, the [`Registry`] that owns every live entry, and the
//! background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Registry                             │
//! │            Mutex<HashMap<String, Entry>>                    │
//! └─────────────────────────────────────────────────────────────┘
//!            ▲                                   ▲
//!            │ put / get / delete                │ sweep_expired
//!  ┌─────────┴─────────┐             ┌───────────┴───────────────┐
//!  │   HTTP handlers   │             │      ExpirySweeper        │
//!  │ (task per request)│             │  (Background Tokio Task)  │
//!  └───────────────────┘             └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use temp_file_registry::storage::{expiry_after, Entry, Registry};
//! use bytes::Bytes;
//! use chrono::Utc;
//!
//! let registry = Registry::new();
//!
//! let uploaded_at = Utc::now();
//! registry.put(Entry::new("a", Bytes::from("data"), expiry_after(uploaded_at, 10)));
//! assert!(registry.get("a").is_some());
//!
//! // Nothing has expired yet
//! assert!(registry.sweep_expired(uploaded_at).is_empty());
//! ```

pub mod entry;
pub mod expiry;
pub mod registry;

// Re-export commonly used types
pub use entry::{expiry_after, resolve_expiry_minutes, Entry};
pub use expiry::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper};
pub use registry::{Evicted, Registry, RegistryStats};
