//! Typed client for the relay, wrapped in the single-retry protocol.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use driverelay_common::types::{
    AuthCodeRequest, DownloadRequest, ErrorResponse, ListFilesRequest, LoginResponse,
    RefreshResponse, UserProfile,
};
use driverelay_common::{Error, FileEntry, FileQuery, Result};

use crate::retry::RetryState;
use crate::store::TokenStore;

/// Byte stream delivered by a download.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A download in flight: relay-provided metadata plus the byte stream.
///
/// Once bytes start flowing the request is past the retry protocol; a
/// credential rejected mid-stream surfaces as a stream error, never as a
/// replay.
pub struct FileDownload {
    /// Content type relayed from Drive.
    pub content_type: Option<String>,
    /// Content length relayed from Drive, when known.
    pub content_length: Option<u64>,
    /// The relay's `Content-Disposition` header, carrying the
    /// percent-encoded original filename.
    pub content_disposition: Option<String>,
    /// File content.
    pub stream: ByteStream,
}

impl std::fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDownload")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("content_disposition", &self.content_disposition)
            .field("stream", &"<byte stream>")
            .finish()
    }
}

impl FileDownload {
    /// Drain the stream into a file, returning the number of bytes written.
    pub async fn save_to(mut self, path: &std::path::Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Drain the stream into memory. Intended for small files and tests.
    pub async fn bytes(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.stream.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

/// Client for the relay's HTTP surface.
///
/// Owns the request gateway: every Drive call attaches the current access
/// credential and, on a rejected credential, refreshes once and replays
/// once. The refresh credential rides the cookie jar and is never visible
/// to calling code. The [`TokenStore`] comes from the composition root so
/// the presentation layer can observe the same session state.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    store: TokenStore,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a client for the relay at `base_url`.
    pub fn new(base_url: impl Into<String>, store: TokenStore) -> Self {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            store,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The session's token store.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── Auth ───────────────────────────────────────────────────────

    /// Exchange a one-time authorization code and open the session.
    ///
    /// The refresh-credential cookie, when issued, lands in the cookie jar
    /// as a side effect of the response.
    pub async fn login(&self, code: &str) -> Result<UserProfile> {
        let response = self
            .http
            .post(self.url("/auth/google"))
            .json(&AuthCodeRequest {
                code: code.to_string(),
            })
            .send()
            .await
            .map_err(|e| Error::AuthExchange(format!("relay unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::AuthExchange(error_body(response).await));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.store.set(login.access_token).await;
        debug!("session opened");
        Ok(login.user)
    }

    /// Mint a new access credential from the refresh-credential cookie.
    pub async fn refresh(&self) -> Result<String> {
        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("relay unreachable: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::RefreshRejected);
        }
        if !status.is_success() {
            return Err(Error::Upstream(format!("refresh failed: {status}")));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.store.set(body.access_token.clone()).await;
        Ok(body.access_token)
    }

    /// End the session: destroy the local credential, clear the cookie.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await;

        let response = self
            .http
            .post(self.url("/auth/logout"))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("relay unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!("logout failed: {}", response.status())));
        }
        Ok(())
    }

    /// Revoke the refresh credential at the provider and end the session.
    pub async fn revoke(&self) -> Result<()> {
        self.store.clear().await;

        let response = self
            .http
            .post(self.url("/auth/revoke"))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("relay unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!("revoke failed: {}", response.status())));
        }
        Ok(())
    }

    // ── Drive ──────────────────────────────────────────────────────

    /// List entries for a structured Drive query.
    pub async fn list_files(&self, query: &FileQuery) -> Result<Vec<FileEntry>> {
        let body = ListFilesRequest {
            query: query.to_drive_query(),
        };

        let response = self
            .send_with_retry(|http, token| {
                with_bearer(http.post(self.url("/drive/files")), token).json(&body)
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status, error_body(response).await));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Start a file download.
    ///
    /// Only an authorization failure observed on the response status goes
    /// through the retry protocol; once the body is being consumed the
    /// request is excluded from it.
    pub async fn download(&self, file_id: &str) -> Result<FileDownload> {
        let body = DownloadRequest {
            file_id: file_id.to_string(),
        };

        let response = self
            .send_with_retry(|http, token| {
                with_bearer(http.post(self.url("/drive/downloadFile")), token).json(&body)
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status, error_body(response).await));
        }

        let content_type = header_string(&response, header::CONTENT_TYPE);
        let content_disposition = header_string(&response, header::CONTENT_DISPOSITION);
        let content_length = response.content_length();

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(|e| Error::Upstream(format!("download interrupted: {e}"))));

        Ok(FileDownload {
            content_type,
            content_length,
            content_disposition,
            stream: Box::pin(stream),
        })
    }

    // ── Gateway ────────────────────────────────────────────────────

    /// Send a request under the single-retry protocol.
    ///
    /// Attach phase: the current access credential, when present, rides as
    /// a bearer header; when absent the session is cleared and the call
    /// goes out unauthenticated for the relay to reject.
    ///
    /// Retry phase: a 401 on a [`RetryState::Fresh`] request triggers one
    /// refresh and, on success, one replay. Everything else, including a
    /// second 401 on the replay, propagates untouched.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client, Option<&str>) -> RequestBuilder,
    {
        let token = self.store.get().await;
        if token.is_none() {
            self.store.clear().await;
            debug!("no access credential, sending unauthenticated");
        }

        let state = RetryState::Fresh;
        let response = build(&self.http, token.as_deref())
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("relay unreachable: {e}")))?;

        if response.status() != StatusCode::UNAUTHORIZED || !state.can_retry() {
            return Ok(response);
        }

        let state = RetryState::Retrying;
        debug!(?state, "access credential rejected, refreshing");

        match self.refresh_coalesced(token.as_deref()).await {
            Ok(fresh) => {
                let state = RetryState::Replayed;
                debug!(?state, "replaying request with refreshed credential");
                build(&self.http, Some(&fresh))
                    .send()
                    .await
                    .map_err(|e| Error::Upstream(format!("relay unreachable: {e}")))
            }
            Err(refresh_err) => {
                let state = RetryState::Failed;
                warn!(?state, error = %refresh_err, "refresh failed, session cleared");
                self.store.clear().await;
                // The caller gets the original authorization failure; the
                // refresh outcome is session state, not a response.
                Err(Error::Unauthorized)
            }
        }
    }

    /// Refresh with single-flight coalescing.
    ///
    /// A request that lost the race reuses whatever credential the winning
    /// refresh stored instead of spending a second round trip.
    async fn refresh_coalesced(&self, observed: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.store.get().await {
            if Some(current.as_str()) != observed {
                return Ok(current);
            }
        }

        self.refresh().await
    }
}

fn with_bearer(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

fn header_string(response: &Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn map_status(status: StatusCode, message: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthorized,
        StatusCode::BAD_REQUEST => Error::UnsupportedExport(message),
        _ => Error::Upstream(message),
    }
}

/// Pull the structured error message out of a failure response.
async fn error_body(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}
