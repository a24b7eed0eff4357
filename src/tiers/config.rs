//! Tier configuration and registry
//!
//! The registry is a read-only lookup table built once at construction.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{RouterError, RouterResult};

use super::Tier;

/// Per-tier model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Tier this entry configures
    pub tier: Tier,
    /// Preferred model for the tier
    pub primary: String,
    /// Ordered alternates, excluding the primary
    #[serde(default)]
    pub fallback: Vec<String>,
    /// Largest context the tier's models accept
    pub max_context_tokens: u32,
    /// USD per 1K input tokens
    pub cost_per_1k_input: f64,
    /// USD per 1K output tokens
    pub cost_per_1k_output: f64,
}

impl TierConfig {
    /// Candidate models in preference order: primary, then fallbacks
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.fallback.iter().map(String::as_str))
    }

    /// Model used when every candidate is unhealthy
    pub fn last_fallback(&self) -> &str {
        self.fallback.last().unwrap_or(&self.primary)
    }

    /// Whether a model belongs to this tier's chain
    pub fn contains(&self, model: &str) -> bool {
        self.candidates().any(|candidate| candidate == model)
    }

    fn validate(&self) -> RouterResult<()> {
        if self.primary.trim().is_empty() {
            return Err(RouterError::config(format!(
                "tier {} has no primary model",
                self.tier
            )));
        }

        let mut seen = HashSet::new();
        for model in &self.fallback {
            if model.trim().is_empty() {
                return Err(RouterError::config(format!(
                    "tier {} has a blank fallback model",
                    self.tier
                )));
            }
            if *model == self.primary {
                return Err(RouterError::config(format!(
                    "tier {} lists its primary '{}' as a fallback",
                    self.tier, model
                )));
            }
            if !seen.insert(model.as_str()) {
                return Err(RouterError::config(format!(
                    "tier {} lists fallback '{}' more than once",
                    self.tier, model
                )));
            }
        }

        if self.max_context_tokens == 0 {
            return Err(RouterError::config(format!(
                "tier {} has a zero context window",
                self.tier
            )));
        }

        if !(self.cost_per_1k_input >= 0.0 && self.cost_per_1k_output >= 0.0) {
            return Err(RouterError::config(format!(
                "tier {} has a negative or invalid cost",
                self.tier
            )));
        }

        Ok(())
    }
}

/// Lookup table from tier to its configuration
#[derive(Debug, Clone)]
pub struct TierRegistry {
    tiers: BTreeMap<Tier, TierConfig>,
}

impl TierRegistry {
    /// Build and validate the registry
    ///
    /// Fails if an entry is malformed, a tier is configured twice, or the
    /// default tier has no entry.
    pub fn new(configs: Vec<TierConfig>, default_tier: Tier) -> RouterResult<Self> {
        let mut tiers = BTreeMap::new();
        for config in configs {
            config.validate()?;
            let tier = config.tier;
            if tiers.insert(tier, config).is_some() {
                return Err(RouterError::config(format!(
                    "tier {} is configured more than once",
                    tier
                )));
            }
        }

        if !tiers.contains_key(&default_tier) {
            return Err(RouterError::config(format!(
                "default tier {} is not configured",
                default_tier
            )));
        }

        Ok(Self { tiers })
    }

    /// Configuration for a tier
    pub fn config_for(&self, tier: Tier) -> RouterResult<&TierConfig> {
        self.tiers
            .get(&tier)
            .ok_or_else(|| RouterError::config(format!("tier {} is not configured", tier)))
    }

    /// Whether the tier has an entry
    pub fn contains(&self, tier: Tier) -> bool {
        self.tiers.contains_key(&tier)
    }

    /// All configured tiers in ascending order
    pub fn tiers(&self) -> impl Iterator<Item = &TierConfig> {
        self.tiers.values()
    }

    /// Lowest tier above `from` whose context window holds `tokens`
    pub fn escalation_for(&self, from: Tier, tokens: u32) -> Option<&TierConfig> {
        self.tiers
            .range(from..)
            .map(|(_, config)| config)
            .filter(|config| config.tier > from)
            .find(|config| config.max_context_tokens >= tokens)
    }
}
