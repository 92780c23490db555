//! Shared state for relay route handlers.

use std::sync::Arc;

use driverelay_auth::AuthRelay;
use driverelay_drive::DriveRelay;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) auth: Arc<AuthRelay>,
    pub(crate) drive: Arc<DriveRelay>,
    /// Production mode toggles the cookie transport flags.
    pub(crate) production: bool,
}

impl AppState {
    /// Assemble the relay state.
    pub fn new(auth: AuthRelay, drive: DriveRelay, production: bool) -> Self {
        Self {
            auth: Arc::new(auth),
            drive: Arc::new(drive),
            production,
        }
    }
}
