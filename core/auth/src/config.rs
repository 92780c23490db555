//! OAuth2 configuration for the credential relay.

use url::Url;

/// OAuth2 token endpoint.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// OAuth2 token revocation endpoint.
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
/// Redirect URI used by the browser auth-code popup flow.
const POSTMESSAGE_REDIRECT: &str = "postmessage";

/// Configuration for the credential relay.
///
/// Required fields are constructor parameters; endpoint URLs default to
/// Google's and can be overridden for tests.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: String,
    pub(crate) token_url: Url,
    pub(crate) revoke_url: Url,
}

impl AuthConfig {
    /// Create a configuration for the given OAuth2 client pair.
    ///
    /// The redirect URI defaults to `postmessage`, matching the auth-code
    /// flow where the browser popup hands the code back to the page instead
    /// of redirecting.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: POSTMESSAGE_REDIRECT.to_string(),
            token_url: GOOGLE_TOKEN_URL.parse().expect("valid default URL"),
            revoke_url: GOOGLE_REVOKE_URL.parse().expect("valid default URL"),
        }
    }

    /// Override the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the revocation endpoint.
    #[must_use]
    pub fn with_revoke_url(mut self, url: Url) -> Self {
        self.revoke_url = url;
        self
    }

    /// OAuth2 client ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Token endpoint URL.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Revocation endpoint URL.
    pub fn revoke_url(&self) -> &Url {
        &self.revoke_url
    }
}
