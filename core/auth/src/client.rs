//! Token exchange, refresh, and revocation against the identity provider.

use serde::Deserialize;
use tracing::{debug, warn};

use driverelay_common::{Error, Result};

use crate::config::AuthConfig;

/// Credentials minted by the identity provider.
///
/// A refresh credential is only guaranteed on the first consent; subsequent
/// exchanges may return the access credential alone.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    /// Short-lived access credential for Drive calls.
    pub access_token: String,
    /// Long-lived refresh credential, when the provider issued one.
    pub refresh_token: Option<String>,
    /// Access-credential lifetime in seconds, as reported by the provider.
    pub expires_in: Option<u64>,
}

/// Wire shape of the provider's token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Server-side credential relay.
///
/// Translates one-time authorization codes into credential pairs and
/// exchanges refresh credentials for new access credentials. The refresh
/// credential itself never leaves the relay except inside the httpOnly
/// cookie managed by `driverelay-server`.
pub struct AuthRelay {
    config: AuthConfig,
    http: reqwest::Client,
}

impl AuthRelay {
    /// Create a new credential relay.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Exchange a one-time authorization code for credentials.
    ///
    /// # Errors
    ///
    /// Any rejection by the provider maps to [`Error::AuthExchange`]; the
    /// caller surfaces it as a login failure and never retries.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchange> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::AuthExchange(format!("token endpoint unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "authorization code rejected by provider");
            return Err(Error::AuthExchange(format!("{status}: {body}")));
        }

        let token: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| Error::AuthExchange(format!("malformed token response: {e}")))?;

        debug!(
            refresh_issued = token.refresh_token.is_some(),
            "authorization code exchanged"
        );

        Ok(TokenExchange {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        })
    }

    /// Mint a new access credential from a refresh credential.
    ///
    /// # Errors
    ///
    /// [`Error::RefreshRejected`] when the provider invalidates the refresh
    /// credential (revoked or expired); terminal for the session.
    /// [`Error::Upstream`] for transport failures and provider outages.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenExchange> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body, "refresh credential rejected by provider");
            return Err(Error::RefreshRejected);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("token refresh failed: {status}: {body}")));
        }

        let token: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("malformed token response: {e}")))?;

        debug!("access credential refreshed");

        Ok(TokenExchange {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        })
    }

    /// Revoke a credential at the provider.
    ///
    /// Google accepts either credential kind here; revoking a refresh
    /// credential also invalidates the access credentials minted from it.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        let response = self
            .http
            .post(self.config.revoke_url.clone())
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("revocation endpoint unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("revocation failed: {status}: {body}")));
        }

        debug!("credential revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Form;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn relay_for(base: &str) -> AuthRelay {
        let config = AuthConfig::new("client-id", "client-secret")
            .with_token_url(format!("{base}/token").parse().unwrap())
            .with_revoke_url(format!("{base}/revoke").parse().unwrap());
        AuthRelay::new(config)
    }

    #[tokio::test]
    async fn test_exchange_code_parses_credentials() {
        let stub = Router::new().route(
            "/token",
            post(|Form(params): Form<HashMap<String, String>>| async move {
                assert_eq!(params["grant_type"], "authorization_code");
                assert_eq!(params["code"], "one-time-code");
                assert_eq!(params["redirect_uri"], "postmessage");
                Json(serde_json::json!({
                    "access_token": "at-1",
                    "refresh_token": "rt-1",
                    "expires_in": 3599,
                    "token_type": "Bearer"
                }))
            }),
        );
        let base = spawn_stub(stub).await;

        let exchange = relay_for(&base)
            .exchange_code("one-time-code")
            .await
            .unwrap();
        assert_eq!(exchange.access_token, "at-1");
        assert_eq!(exchange.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(exchange.expires_in, Some(3599));
    }

    #[tokio::test]
    async fn test_exchange_without_refresh_credential() {
        let stub = Router::new().route(
            "/token",
            post(|| async {
                Json(serde_json::json!({"access_token": "at-2", "token_type": "Bearer"}))
            }),
        );
        let base = spawn_stub(stub).await;

        let exchange = relay_for(&base).exchange_code("code").await.unwrap();
        assert_eq!(exchange.access_token, "at-2");
        assert!(exchange.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_rejected_code_maps_to_auth_exchange() {
        let stub = Router::new().route(
            "/token",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": "invalid_grant"})),
                )
            }),
        );
        let base = spawn_stub(stub).await;

        let err = relay_for(&base).exchange_code("bad").await.unwrap_err();
        assert!(matches!(err, Error::AuthExchange(_)));
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_terminal() {
        let stub = Router::new().route(
            "/token",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": "invalid_grant"})),
                )
            }),
        );
        let base = spawn_stub(stub).await;

        let err = relay_for(&base).refresh("stale-rt").await.unwrap_err();
        assert!(matches!(err, Error::RefreshRejected));
    }

    #[tokio::test]
    async fn test_provider_outage_during_refresh_is_upstream() {
        let stub = Router::new().route(
            "/token",
            post(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base = spawn_stub(stub).await;

        let err = relay_for(&base).refresh("rt").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_revoke_round_trip() {
        let stub = Router::new().route(
            "/revoke",
            post(|Form(params): Form<HashMap<String, String>>| async move {
                assert_eq!(params["token"], "rt-1");
                axum::http::StatusCode::OK
            }),
        );
        let base = spawn_stub(stub).await;

        relay_for(&base).revoke("rt-1").await.unwrap();
    }
}
