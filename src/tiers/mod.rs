//! Tier routing module
//!
//! Maps tiers to models, tracks model health and routes requests.

pub mod config;
pub mod health;
pub mod router;
pub mod types;

pub use config::{TierConfig, TierRegistry};
pub use health::{HealthConfig, HealthTracker, ModelHealth};
pub use router::{RouteRequest, RouteResult, SmartRouter};
pub use types::Tier;
