//! Gatehouse admin console library crate.
//!
//! # Purpose
//! Exposes the console HTTP API, the authentication gate, configuration,
//! and storage backends for use by the binary and tests. Authorization
//! decisions themselves live in `gatehouse_authz`.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;
