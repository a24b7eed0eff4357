//! Session handling
//!
//! Keeps multi-turn interactions on a consistent tier and model.

pub mod affinity;

pub use affinity::{SessionAffinity, SessionAffinityStore, SessionSlot};
