//! Relay route handlers.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::{info, warn};

use driverelay_common::types::{
    AuthCodeRequest, DownloadRequest, ListFilesRequest, LoginResponse, MessageResponse,
    RefreshResponse, UserProfile,
};
use driverelay_common::{Error, FileEntry};

use crate::cookies::{self, REFRESH_COOKIE_NAME};
use crate::error::ApiError;
use crate::state::AppState;

/// Create the relay router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/google", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/revoke", post(revoke))
        .route("/drive/files", post(list_files))
        .route("/drive/downloadFile", post(download_file))
        .with_state(state)
}

// ── Auth ───────────────────────────────────────────────────────────

/// `POST /auth/google`: exchange a one-time authorization code.
///
/// The access credential goes back in the body; a refresh credential, when
/// the provider issued one, goes only into the httpOnly cookie. Any issued
/// refresh credential replaces the previous cookie.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<AuthCodeRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let exchange = state.auth.exchange_code(&body.code).await?;

    let jar = match exchange.refresh_token.as_deref() {
        Some(refresh_token) => {
            info!("refresh credential issued, cookie set");
            jar.add(cookies::refresh_cookie(refresh_token, state.production))
        }
        None => jar,
    };

    Ok((
        jar,
        Json(LoginResponse {
            access_token: exchange.access_token,
            user: UserProfile::default(),
        }),
    ))
}

/// `POST /auth/refresh`: mint a new access credential from the cookie.
///
/// 401 when the cookie is absent; the identity provider is never contacted
/// in that case.
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), ApiError> {
    let refresh_token = jar
        .get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .ok_or(Error::Unauthenticated)?;

    let exchange = state.auth.refresh(&refresh_token).await?;

    // Providers may rotate the refresh credential; treat any returned one
    // as a replacement.
    let jar = match exchange.refresh_token.as_deref() {
        Some(rotated) => jar.add(cookies::refresh_cookie(rotated, state.production)),
        None => jar,
    };

    Ok((
        jar,
        Json(RefreshResponse {
            access_token: exchange.access_token,
        }),
    ))
}

/// `POST /auth/logout`: clear the refresh-credential cookie.
///
/// Idempotent; always 200.
async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(cookies::clear_refresh_cookie()),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

/// `POST /auth/revoke`: revoke the refresh credential at the provider and
/// clear the cookie.
///
/// Revocation is best-effort: a provider failure is logged, the session is
/// torn down regardless.
async fn revoke(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(cookie) = jar.get(REFRESH_COOKIE_NAME) {
        if let Err(e) = state.auth.revoke(cookie.value()).await {
            warn!(error = %e, "credential revocation failed");
        }
    }

    (
        jar.remove(cookies::clear_refresh_cookie()),
        Json(MessageResponse {
            message: "Token revoked".to_string(),
        }),
    )
}

// ── Drive ──────────────────────────────────────────────────────────

/// `POST /drive/files`: list entries for a Drive query.
async fn list_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ListFilesRequest>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let token = bearer_token(&headers)?;
    let files = state.drive.list(token, &body.query).await?;
    Ok(Json(files))
}

/// `POST /drive/downloadFile`: stream a file back to the caller.
///
/// The upstream bytes are relayed as they arrive; the relay never holds the
/// whole file. Headers force a download under the original filename.
async fn download_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DownloadRequest>,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)?;
    let download = state.drive.download(token, &body.file_id).await?;

    let filename = utf8_percent_encode(&download.file_name, NON_ALPHANUMERIC);
    let mut builder = Response::builder()
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename*=UTF-8''{filename}"),
        )
        .header(header::CONTENT_TYPE, download.content_type);

    if let Some(length) = download.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(download.stream))
        .map_err(|e| ApiError(Error::Upstream(format!("Failed to build response: {e}"))))
}

/// Extract the bearer credential from the `Authorization` header.
///
/// A missing or malformed header is rejected locally; Drive is not
/// contacted with an unauthenticated request.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(ApiError(Error::Unauthorized))
}
