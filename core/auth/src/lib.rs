//! Credential relay core for DriveRelay.
//!
//! This crate owns the server side of the token lifecycle: exchanging a
//! one-time authorization code for an access/refresh credential pair,
//! minting fresh access credentials from a stored refresh credential, and
//! revoking credentials at the provider. It speaks directly to Google's
//! token and revocation endpoints; the HTTP surface and the cookie contract
//! live in `driverelay-server`.

pub mod client;
pub mod config;

pub use client::{AuthRelay, TokenExchange};
pub use config::AuthConfig;
