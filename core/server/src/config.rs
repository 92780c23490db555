//! Environment-driven relay configuration.

use std::env;

use driverelay_common::{Error, Result};

/// Default browser origin allowed through CORS.
const DEFAULT_ORIGIN: &str = "http://localhost:3000";
/// Default listening port.
const DEFAULT_PORT: u16 = 8080;
/// Default root folder scope for browsing clients.
const DEFAULT_FOLDER_ID: &str = "root";

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Browser origin allowed to call the relay with credentials.
    pub origin_url: String,
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Listening port.
    pub port: u16,
    /// Production mode: secure cookies and cross-site cookie transport.
    pub production: bool,
    /// Root folder ID browsing clients are scoped to.
    pub shared_folder_id: String,
}

impl ServerConfig {
    /// Load the configuration from the environment.
    ///
    /// `GOOGLE_CLIENT_ID` and `GOOGLE_CLIENT_SECRET` are required; the rest
    /// falls back to development defaults.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| Error::Config("GOOGLE_CLIENT_ID is not set".to_string()))?;
        let client_secret = env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| Error::Config("GOOGLE_CLIENT_SECRET is not set".to_string()))?;

        let origin_url = env::var("ORIGIN_URL")
            .unwrap_or_else(|_| DEFAULT_ORIGIN.to_string())
            .trim()
            .to_string();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("Invalid PORT: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let production = env::var("DRIVERELAY_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        let shared_folder_id =
            env::var("SHARED_FOLDER_ID").unwrap_or_else(|_| DEFAULT_FOLDER_ID.to_string());

        Ok(Self {
            origin_url,
            client_id,
            client_secret,
            port,
            production,
            shared_folder_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test mutating the environment; split cases would race under
    // the parallel test runner.
    #[test]
    fn test_from_env() {
        env::remove_var("GOOGLE_CLIENT_ID");
        env::remove_var("GOOGLE_CLIENT_SECRET");
        assert!(matches!(
            ServerConfig::from_env().unwrap_err(),
            Error::Config(_)
        ));

        env::set_var("GOOGLE_CLIENT_ID", "id");
        env::set_var("GOOGLE_CLIENT_SECRET", "secret");
        env::remove_var("ORIGIN_URL");
        env::remove_var("PORT");
        env::remove_var("DRIVERELAY_ENV");
        env::remove_var("SHARED_FOLDER_ID");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.origin_url, "http://localhost:3000");
        assert_eq!(config.port, 8080);
        assert!(!config.production);
        assert_eq!(config.shared_folder_id, "root");

        // Origin whitespace is trimmed, production flag recognized.
        env::set_var("ORIGIN_URL", " https://drive.example.com \n");
        env::set_var("DRIVERELAY_ENV", "production");
        env::set_var("PORT", "9090");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.origin_url, "https://drive.example.com");
        assert!(config.production);
        assert_eq!(config.port, 9090);

        env::set_var("PORT", "not-a-port");
        assert!(matches!(
            ServerConfig::from_env().unwrap_err(),
            Error::Config(_)
        ));
        env::remove_var("PORT");
        env::remove_var("DRIVERELAY_ENV");
        env::remove_var("ORIGIN_URL");
    }
}
