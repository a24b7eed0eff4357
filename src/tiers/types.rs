//! Tier type
//!
//! Tiers are cost/quality buckets of backend models, numbered 0 (free) to 3
//! (premium). They serialize as their integer value.

use serde::{Deserialize, Serialize};

/// Cost/quality tier for model routing
///
/// Ordered from cheapest to most capable so tiers can be compared:
/// Free < Economy < Balanced < Premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    /// Pattern-matched requests served by a free/local model
    Free = 0,
    /// Cheapest paid models
    Economy = 1,
    /// Balanced cost/quality models
    Balanced = 2,
    /// Most capable models
    Premium = 3,
}

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Economy, Tier::Balanced, Tier::Premium];

    /// Numeric value of the tier (0-3)
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Position of the tier in per-tier arrays
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable tier name
    pub fn name(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Economy => "economy",
            Tier::Balanced => "balanced",
            Tier::Premium => "premium",
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Tier::Free),
            1 => Ok(Tier::Economy),
            2 => Ok(Tier::Balanced),
            3 => Ok(Tier::Premium),
            other => Err(format!("invalid tier {}, expected 0-3", other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.as_u8()
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
