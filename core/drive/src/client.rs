//! Google Drive API relay client.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::pin::Pin;
use tracing::debug;

use driverelay_common::{Error, FileEntry, Result, GOOGLE_EDITOR_PREFIX};

/// Google Drive API base URL.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Field projection requested for list calls.
const LIST_FIELDS: &str = "files(id,name,mimeType,webViewLink,iconLink)";
/// Field projection requested for download metadata.
const METADATA_FIELDS: &str = "name,size,mimeType";
/// Page size ceiling for list calls.
const PAGE_SIZE: &str = "1000";

/// Byte stream relayed from Drive to the caller.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// File metadata fetched ahead of a download.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// File name.
    pub name: String,
    /// Size in bytes; Drive reports it as a string and omits it for
    /// editor-native documents.
    #[serde(default)]
    pub size: Option<String>,
    /// MIME type.
    pub mime_type: String,
}

impl FileMetadata {
    /// Get size as u64.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_ref().and_then(|s| s.parse().ok())
    }

    /// Whether this is a Google editor document without binary content.
    pub fn is_editor_document(&self) -> bool {
        self.mime_type.contains(GOOGLE_EDITOR_PREFIX)
    }
}

/// A download ready to be relayed: original metadata plus the byte stream.
pub struct DriveDownload {
    /// Original file name, unencoded.
    pub file_name: String,
    /// Original content type.
    pub content_type: String,
    /// Original content length, when known.
    pub content_length: Option<u64>,
    /// File content, streamed end-to-end without buffering.
    pub stream: ByteStream,
}

impl std::fmt::Debug for DriveDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveDownload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("stream", &"<byte stream>")
            .finish()
    }
}

/// Response from listing files.
#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<FileEntry>,
}

/// Drive relay client.
///
/// Every operation takes the caller's access credential; the relay holds no
/// credentials of its own.
pub struct DriveRelay {
    http: Client,
    base_url: String,
}

impl DriveRelay {
    /// Create a new Drive relay.
    pub fn new() -> Self {
        let http = Client::builder()
            .user_agent("DriveRelay/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: DRIVE_API_BASE.to_string(),
        }
    }

    /// Override the Drive API base URL (for tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// List files matching a Drive query string.
    ///
    /// Requests the fixed projection the presentation layer consumes, a
    /// single page of up to 1000 entries spanning shared drives, ordered
    /// folders-first then by name.
    ///
    /// # Errors
    /// - [`Error::Unauthorized`] when Drive rejects the access credential
    /// - [`Error::Upstream`] for any other failure
    pub async fn list(&self, access_token: &str, query: &str) -> Result<Vec<FileEntry>> {
        let url = format!("{}/files", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("q", query),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
                ("orderBy", "folder,name"),
            ])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to list files: {e}")))?;

        let list: FileListResponse = handle_response(response).await?;
        debug!(count = list.files.len(), "listed drive entries");
        Ok(list.files)
    }

    /// Get download metadata for a file.
    pub async fn metadata(&self, access_token: &str, file_id: &str) -> Result<FileMetadata> {
        let url = format!("{}/files/{}", self.base_url, file_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("fields", METADATA_FIELDS), ("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to get file metadata: {e}")))?;

        handle_response(response).await
    }

    /// Open a download stream for a file.
    ///
    /// Fetches metadata first and rejects editor-native documents before any
    /// binary content is requested; there is no export conversion here. The
    /// returned stream relays Drive's bytes without buffering the file.
    ///
    /// # Errors
    /// - [`Error::UnsupportedExport`] for editor-native documents
    /// - [`Error::Unauthorized`] when Drive rejects the access credential
    /// - [`Error::Upstream`] for any other failure
    pub async fn download(&self, access_token: &str, file_id: &str) -> Result<DriveDownload> {
        let meta = self.metadata(access_token, file_id).await?;

        if meta.is_editor_document() {
            return Err(Error::UnsupportedExport(meta.mime_type));
        }

        let url = format!("{}/files/{}", self.base_url, file_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to start download: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("Download failed: {status}: {body}")));
        }

        let content_length = meta.size_bytes().or_else(|| response.content_length());
        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(|e| Error::Upstream(format!("Stream read error: {e}"))));

        debug!(file = %meta.name, "download stream opened");

        Ok(DriveDownload {
            file_name: meta.name,
            content_type: meta.mime_type,
            content_length,
            stream: Box::pin(stream),
        })
    }
}

impl Default for DriveRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle API response with error checking.
async fn handle_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse response: {e}")))
    } else if status == StatusCode::UNAUTHORIZED {
        Err(Error::Unauthorized)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(Error::Upstream(format!("API error: {status}: {body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_list_forwards_query_and_projection() {
        let stub = Router::new().route(
            "/files",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params["q"], "'root' in parents and trashed=false");
                assert_eq!(params["pageSize"], "1000");
                assert_eq!(params["orderBy"], "folder,name");
                assert_eq!(params["supportsAllDrives"], "true");
                assert_eq!(params["fields"], "files(id,name,mimeType,webViewLink,iconLink)");
                Json(serde_json::json!({
                    "files": [
                        {"id": "d1", "name": "docs", "mimeType": "application/vnd.google-apps.folder"},
                        {"id": "f1", "name": "a.txt", "mimeType": "text/plain",
                         "webViewLink": "https://drive.google.com/file/d/f1/view"}
                    ]
                }))
            }),
        );
        let base = spawn_stub(stub).await;

        let relay = DriveRelay::new().with_base_url(base);
        let entries = relay
            .list("token", "'root' in parents and trashed=false")
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_folder());
        assert!(!entries[1].is_folder());
    }

    #[tokio::test]
    async fn test_list_rejected_credential_is_unauthorized() {
        let stub = Router::new().route(
            "/files",
            get(|| async { axum::http::StatusCode::UNAUTHORIZED }),
        );
        let base = spawn_stub(stub).await;

        let relay = DriveRelay::new().with_base_url(base);
        let err = relay.list("stale", "q").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
    }

    #[tokio::test]
    async fn test_editor_document_rejected_before_media_fetch() {
        let media_hits = Arc::new(AtomicUsize::new(0));
        let counter = media_hits.clone();

        let stub = Router::new().route(
            "/files/{id}",
            get(
                move |Path(_id): Path<String>, Query(params): Query<HashMap<String, String>>| {
                    let counter = counter.clone();
                    async move {
                        if params.get("alt").map(String::as_str) == Some("media") {
                            counter.fetch_add(1, Ordering::SeqCst);
                            return Json(serde_json::json!({})).into_response();
                        }
                        Json(serde_json::json!({
                            "name": "Budget",
                            "mimeType": "application/vnd.google-apps.spreadsheet"
                        }))
                        .into_response()
                    }
                },
            ),
        );
        let base = spawn_stub(stub).await;

        let relay = DriveRelay::new().with_base_url(base);
        let err = relay.download("token", "sheet-1").await.unwrap_err();

        assert!(matches!(err, Error::UnsupportedExport(_)));
        assert_eq!(media_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_download_relays_bytes_and_metadata() {
        let stub = Router::new().route(
            "/files/{id}",
            get(
                |Path(_id): Path<String>, Query(params): Query<HashMap<String, String>>| async move {
                    if params.get("alt").map(String::as_str) == Some("media") {
                        return "hello drive".into_response();
                    }
                    Json(serde_json::json!({
                        "name": "notes.txt",
                        "size": "11",
                        "mimeType": "text/plain"
                    }))
                    .into_response()
                },
            ),
        );
        let base = spawn_stub(stub).await;

        let relay = DriveRelay::new().with_base_url(base);
        let mut download = relay.download("token", "f-1").await.unwrap();

        assert_eq!(download.file_name, "notes.txt");
        assert_eq!(download.content_type, "text/plain");
        assert_eq!(download.content_length, Some(11));

        let mut body = Vec::new();
        while let Some(chunk) = download.stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"hello drive");
    }

    #[test]
    fn test_metadata_size_parsing() {
        let meta = FileMetadata {
            name: "f".to_string(),
            size: Some("12345".to_string()),
            mime_type: "application/pdf".to_string(),
        };
        assert_eq!(meta.size_bytes(), Some(12345));
        assert!(!meta.is_editor_document());

        let doc = FileMetadata {
            name: "doc".to_string(),
            size: None,
            mime_type: "application/vnd.google-apps.document".to_string(),
        };
        assert_eq!(doc.size_bytes(), None);
        assert!(doc.is_editor_document());
    }
}
