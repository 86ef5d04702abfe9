//! Data layer for the property listing and hiring portal.
//!
//! Everything persistent lives behind the backend REST service; this crate wraps
//! those calls, keeps the polled notification feed current, and derives the view
//! models the portal renders.

pub mod api;
pub mod applications;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod interviews;
pub mod loan;
pub mod notifications;
pub mod telemetry;
