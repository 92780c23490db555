//! Boundary conversion from relay errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use driverelay_common::types::ErrorResponse;
use driverelay_common::Error;

/// Wrapper turning [`Error`] into a structured HTTP response.
///
/// Every relay-side failure is caught here and converted to a fixed status
/// code and message; handlers never leak internals to the browser.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, "Login required"),
            Error::RefreshRejected => (
                StatusCode::UNAUTHORIZED,
                "Token refresh failed. Please log in again.",
            ),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Google token expired"),
            Error::UnsupportedExport(_) => (
                StatusCode::BAD_REQUEST,
                "Google editor documents cannot be downloaded directly",
            ),
            Error::AuthExchange(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Login failed"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Request failed"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "relay internal error");
        } else {
            tracing::debug!(error = %self.0, %status, "relay request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (Error::RefreshRejected, StatusCode::UNAUTHORIZED),
            (Error::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                Error::UnsupportedExport("application/vnd.google-apps.document".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::AuthExchange("bad code".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::Upstream("drive outage".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
