//! Stored File Entries
//!
//! An [`Entry`] is one uploaded file plus the metadata needed to serve it back:
//! the declared content type, the original file name, and the absolute time at
//! which it stops being downloadable.
//!
//! ## Expiry Model
//!
//! ```text
//!   uploaded_at                    expires_at
//!        │<──── resolved minutes ────>│
//!        ▼                            ▼
//! ───────●════════════════════════════●─────────────────>  time
//!              live (downloadable)      dead (absent)
//! ```
//!
//! The boundary is inclusive: at `now == expires_at` the entry is already dead.
//! A negative or zero offset produces an entry that is born expired.

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// One stored file.
///
/// The content is an immutable, reference-counted buffer, so cloning an entry
/// out of the registry never copies the file bytes.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Caller-chosen key (may be empty)
    pub key: String,
    /// The raw `expiryTimeMinutes` value sent by the client, kept even when unparseable
    pub requested_expiry_minutes: String,
    /// When this entry stops being downloadable
    pub expires_at: DateTime<Utc>,
    /// The file bytes
    pub content: Bytes,
    /// Declared content type of the uploaded part
    pub content_type: Option<String>,
    /// Declared file name of the uploaded part
    pub file_name: String,
    /// Stamp assigned by the registry on every put; 0 until stored
    generation: u64,
}

impl Entry {
    /// Creates a new entry with no metadata beyond its key and expiry.
    pub fn new(key: impl Into<String>, content: Bytes, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            requested_expiry_minutes: String::new(),
            expires_at,
            content,
            content_type: None,
            file_name: String::new(),
            generation: 0,
        }
    }

    /// Records the raw expiry value the client asked for.
    pub fn with_requested_expiry(mut self, requested: impl Into<String>) -> Self {
        self.requested_expiry_minutes = requested.into();
        self
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Identifies the put that stored this entry.
    ///
    /// Two entries under the same key compare equal here only if they come
    /// from the same upload.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Size of the stored file in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Checks if this entry has expired as of `now`.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key:{}, expiryTimeMinutes:{}, expiredAt:{}, contentType:{}, fileName:{}, size:{}",
            self.key,
            self.requested_expiry_minutes,
            self.expires_at.to_rfc3339(),
            self.content_type.as_deref().unwrap_or(""),
            self.file_name,
            self.content.len()
        )
    }
}

/// Resolves the expiry offset for an upload.
///
/// A value that parses as an integer is used as-is, with no clamping.
/// Anything else (missing, empty, non-numeric) falls back to `default_minutes`.
pub fn resolve_expiry_minutes(requested: Option<&str>, default_minutes: i64) -> i64 {
    requested
        .and_then(|raw| raw.parse::<i64>().ok())
        .unwrap_or(default_minutes)
}

/// Computes `uploaded_at + minutes`, saturating at the representable range.
pub fn expiry_after(uploaded_at: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    Duration::try_minutes(minutes)
        .and_then(|offset| uploaded_at.checked_add_signed(offset))
        .unwrap_or(if minutes < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}
