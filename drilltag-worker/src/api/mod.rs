//! HTTP surface of the tagging worker
//!
//! The worker is a background process; the only route is the operational
//! health check. Pipeline behavior is driven entirely by events.

pub mod health;

pub use health::{health_check, health_routes};
