//! Waitress backend service library crate.
//!
//! # Purpose
//! Exposes the HTTP surface, the role gate middleware, configuration, and the
//! in-memory identity store for use by the binary and tests.
//!
//! # Notes
//! Authorization decisions live in `waitress-authz`; this crate only adapts
//! them to HTTP.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod observability;
