//! Integration tests for the tier router
//!
//! Exercise the routing engine through its public API and the HTTP service
//! through the full axum router.

mod api;
mod routing;
