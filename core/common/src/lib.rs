//! Common utilities and types shared across DriveRelay crates.
//!
//! This crate provides the error taxonomy and the wire types exchanged
//! between the relay server and its clients, ensuring both sides agree on
//! one set of shapes.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{FileEntry, FileQuery, FOLDER_MIME_TYPE, GOOGLE_EDITOR_PREFIX};
