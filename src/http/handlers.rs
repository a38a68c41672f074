//! Upload and Download Handlers
//!
//! These handlers translate HTTP requests into registry operations.
//!
//! ## Upload
//!
//! ```text
//! multipart body ──> read form ──> resolve expiry ──> Entry ──> Registry::put
//!                                                                   │
//!                                            200 {"message": ...} <─┘
//! ```
//!
//! ## Download
//!
//! ```text
//! ?key=..&delete=.. ──> Registry::get (lock held only here)
//!                          │
//!                          ▼
//!               stream chunks to client (no lock)
//!                          │
//!                          ▼ body finished or dropped
//!               Registry::delete_if_same   (only when delete=true)
//! ```
//!
//! The download body owns a cheap clone of the stored bytes, so a slow
//! client never holds the registry lock. Delete-on-read is tied to the body's
//! lifetime: the entry is removed once the body has been fully sent or the
//! client has gone away, never earlier. A newer upload under the same key
//! that lands while the body is streaming is left in place.

use crate::http::{ApiError, AppState};
use crate::storage::{expiry_after, resolve_expiry_minutes, Entry, Registry};
use axum::body::Body;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, trace};

/// Size of each body chunk written to a downloading client.
const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Content type used when the uploader declared none.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Success body of an upload.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Human-readable description of the stored entry
    pub message: String,
    pub key: String,
    pub expiry_time_minutes: String,
    /// RFC 3339 expiry timestamp
    pub expires_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub file_name: String,
    pub size: usize,
}

impl From<&Entry> for UploadResponse {
    fn from(entry: &Entry) -> Self {
        Self {
            message: entry.to_string(),
            key: entry.key.clone(),
            expiry_time_minutes: entry.requested_expiry_minutes.clone(),
            expires_at: entry.expires_at.to_rfc3339(),
            content_type: entry.content_type.clone(),
            file_name: entry.file_name.clone(),
            size: entry.len(),
        }
    }
}

/// Query string of a download.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadParams {
    pub key: String,
    pub delete: Option<String>,
}

impl DownloadParams {
    /// Builds the parameters from decoded query pairs.
    ///
    /// The first occurrence of each parameter wins; unknown ones are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut key = None;
        let mut delete = None;

        for (name, value) in pairs {
            match name.as_str() {
                "key" if key.is_none() => key = Some(value),
                "delete" if delete.is_none() => delete = Some(value),
                _ => {}
            }
        }

        Self {
            key: key.unwrap_or_default(),
            delete,
        }
    }

    /// Only the exact string `"true"` enables delete-on-read.
    pub fn delete_after_read(&self) -> bool {
        self.delete.as_deref() == Some("true")
    }
}

/// The `file` part of an upload.
#[derive(Debug)]
struct UploadedFile {
    content: Bytes,
    content_type: Option<String>,
    file_name: String,
}

/// The fields of an upload form. The first occurrence of each field wins.
#[derive(Debug, Default)]
struct UploadForm {
    key: Option<String>,
    expiry_time_minutes: Option<String>,
    file: Option<UploadedFile>,
}

impl UploadForm {
    /// Reads the whole form, buffering the file completely.
    async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);

            match name.as_deref() {
                Some("key") if form.key.is_none() => {
                    form.key = Some(field.text().await?);
                }
                Some("expiryTimeMinutes") if form.expiry_time_minutes.is_none() => {
                    form.expiry_time_minutes = Some(field.text().await?);
                }
                Some("file") if form.file.is_none() => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let content_type = field.content_type().map(str::to_owned);
                    let content = field.bytes().await?;
                    trace!(%file_name, size = content.len(), "Buffered uploaded file");
                    form.file = Some(UploadedFile {
                        content,
                        content_type,
                        file_name,
                    });
                }
                other => {
                    trace!(field = ?other, "Skipping multipart field");
                }
            }
        }

        Ok(form)
    }
}

/// POST /upload - Store a file under a key
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let form = UploadForm::read(&mut multipart).await?;
    let file = form
        .file
        .ok_or_else(|| ApiError::BadRequest("missing multipart field: file".to_string()))?;

    let uploaded_at = Utc::now();
    let minutes = resolve_expiry_minutes(
        form.expiry_time_minutes.as_deref(),
        state.config.default_expiration_minutes,
    );

    let entry = Entry::new(
        form.key.unwrap_or_default(),
        file.content,
        expiry_after(uploaded_at, minutes),
    )
    .with_requested_expiry(form.expiry_time_minutes.unwrap_or_default())
    .with_content_type(file.content_type)
    .with_file_name(file.file_name);

    let response = UploadResponse::from(&entry);
    let replaced = !state.registry.put(entry);

    debug!(
        key = %response.key,
        minutes,
        replaced,
        entry = %response.message,
        "File stored"
    );

    Ok(Json(response))
}

/// GET /download - Stream a stored file back
pub async fn handle_download(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(pairs) = query?;
    let params = DownloadParams::from_pairs(pairs);

    let entry = state.registry.get(&params.key).ok_or_else(|| {
        debug!(key = %params.key, "Download of unknown or expired key");
        ApiError::FileNotFound
    })?;

    debug!(entry = %entry, delete = params.delete_after_read(), "Serving file");

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, content_type_header(entry.content_type.as_deref()));
    headers.insert(CONTENT_DISPOSITION, attachment_header(&entry.file_name));

    let delete_guard = params
        .delete_after_read()
        .then(|| DeleteOnRead::new(Arc::clone(&state.registry), entry.clone()));
    let body = Body::from_stream(DownloadStream::new(entry.content, delete_guard));

    Ok((StatusCode::OK, headers, body).into_response())
}

fn content_type_header(content_type: Option<&str>) -> HeaderValue {
    content_type
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE))
}

fn attachment_header(file_name: &str) -> HeaderValue {
    HeaderValue::from_bytes(format!("attachment; filename={}", file_name).as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Removes the downloaded entry from the registry when dropped.
///
/// Only the entry that was served is removed; a replacement stored under the
/// same key in the meantime survives.
struct DeleteOnRead {
    registry: Arc<Registry>,
    served: Entry,
}

impl DeleteOnRead {
    fn new(registry: Arc<Registry>, served: Entry) -> Self {
        Self { registry, served }
    }
}

impl Drop for DeleteOnRead {
    fn drop(&mut self) {
        let key = &self.served.key;
        if self.registry.delete_if_same(key, &self.served) {
            debug!(%key, "File deleted after download");
        } else {
            debug!(%key, "File already gone or replaced, nothing deleted");
        }
    }
}

/// Response body of a download: the stored bytes in fixed-size slices.
///
/// Slicing `Bytes` is zero-copy. The optional delete guard lives exactly as
/// long as the body.
struct DownloadStream {
    content: Bytes,
    _delete_guard: Option<DeleteOnRead>,
}

impl DownloadStream {
    fn new(content: Bytes, delete_guard: Option<DeleteOnRead>) -> Self {
        Self {
            content,
            _delete_guard: delete_guard,
        }
    }
}

impl Stream for DownloadStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.content.is_empty() {
            return Poll::Ready(None);
        }

        let take = self.content.len().min(DOWNLOAD_CHUNK_SIZE);
        let chunk = self.content.split_to(take);
        Poll::Ready(Some(Ok(chunk)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let chunks = self.content.len().div_ceil(DOWNLOAD_CHUNK_SIZE);
        (chunks, Some(chunks))
    }
}
