//! Drive relay core for DriveRelay.
//!
//! Performs list and download operations against the external Drive service
//! with a caller-supplied access credential. The relay trusts the caller's
//! credential as-is and propagates a rejected credential verbatim so the
//! client-side request gateway can drive its refresh-and-retry protocol.

pub mod client;

pub use client::{ByteStream, DriveDownload, DriveRelay, FileMetadata};
