//! In-memory access-credential store with optional on-disk persistence.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use driverelay_common::{Error, Result};

/// On-disk shape of a persisted credential.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedToken {
    access_token: String,
    saved_at: DateTime<Utc>,
}

/// Process-wide store for the current access credential.
///
/// The credential is mutated only by full replacement: login and refresh
/// success [`set`](Self::set) it, logout and refresh failure
/// [`clear`](Self::clear) it. Readers tolerate a concurrent swap: a
/// request may observe the credential that was current when it started,
/// which is acceptable by design.
///
/// Clones share the same state, so the composition root can hand one store
/// to the gateway and another handle to the presentation layer.
#[derive(Clone)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
    persist_path: Option<Arc<PathBuf>>,
}

impl TokenStore {
    /// Create a store that lives only in process memory.
    pub fn in_memory() -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            persist_path: None,
        }
    }

    /// Create a store persisted at the given path.
    ///
    /// An existing file restores the credential, so a restarted client
    /// resumes its session without a fresh login (the relay still rejects
    /// the credential if it expired in the meantime, which flows through
    /// the normal refresh path).
    pub fn with_persistence(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<PersistedToken>(&bytes) {
                Ok(persisted) => {
                    debug!(saved_at = %persisted.saved_at, "restored persisted credential");
                    Some(persisted.access_token)
                }
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable credential file");
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            token: Arc::new(RwLock::new(initial)),
            persist_path: Some(Arc::new(path)),
        }
    }

    /// Create a store persisted at the default per-user location.
    pub fn persistent() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| Error::Config("No user data directory available".to_string()))?;
        let dir = base.join("driverelay");
        std::fs::create_dir_all(&dir)?;
        Ok(Self::with_persistence(dir.join("token.json")))
    }

    /// Get the current access credential.
    pub async fn get(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replace the access credential.
    pub async fn set(&self, access_token: String) {
        *self.token.write().await = Some(access_token.clone());

        if let Some(path) = &self.persist_path {
            let persisted = PersistedToken {
                access_token,
                saved_at: Utc::now(),
            };
            match serde_json::to_vec(&persisted) {
                Ok(bytes) => {
                    if let Err(e) = std::fs::write(path.as_ref(), bytes) {
                        warn!(error = %e, "failed to persist credential");
                    }
                }
                Err(e) => warn!(error = %e, "failed to serialize credential"),
            }
        }
    }

    /// Destroy the access credential and its persisted copy.
    pub async fn clear(&self) {
        *self.token.write().await = None;

        if let Some(path) = &self.persist_path {
            if let Err(e) = std::fs::remove_file(path.as_ref()) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %e, "failed to remove persisted credential");
                }
            }
        }
    }
}
