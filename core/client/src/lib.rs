//! Client-side access layer for the DriveRelay server.
//!
//! Holds the short-lived access credential in a process-wide [`TokenStore`],
//! wraps every relay call in the single-retry-after-refresh protocol, and
//! exposes typed operations the presentation layer consumes. The refresh
//! credential never appears here: it rides the HTTP client's cookie jar,
//! exactly like a browser's.

pub mod api;
pub mod retry;
pub mod store;

pub use api::{ApiClient, FileDownload};
pub use retry::RetryState;
pub use store::TokenStore;
