//! Configuration management for the tier router
//!
//! Process settings are loaded from environment variables. The routing table
//! (tiers, rules, default tier, session pinning) is a [`RouterConfig`], either
//! the built-in default or a JSON file named by `ROUTER_CONFIG_PATH`.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::{default_rules, TierRule};
use crate::tiers::health::DEFAULT_FAILURE_THRESHOLD;
use crate::tiers::{Tier, TierConfig};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Optional path to a JSON routing configuration
    pub router_config_path: Option<String>,
    /// Overrides the routing configuration's session pinning switch
    pub session_pinning: Option<bool>,
    /// Idle time after which session pins are evicted (0 = never)
    pub session_ttl_seconds: u64,

    /// Enable debug endpoints (development only)
    pub debug_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("ROUTER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("ROUTER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid ROUTER_PORT")?,

            router_config_path: env::var("ROUTER_CONFIG_PATH").ok(),
            session_pinning: env::var("ROUTER_SESSION_PINNING")
                .ok()
                .map(|v| parse_flag(&v)),
            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("Invalid SESSION_TTL_SECONDS")?,

            debug_enabled: env::var("ROUTER_DEBUG")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        })
    }

    /// Resolve the routing configuration for this process
    pub fn load_router_config(&self) -> Result<RouterConfig> {
        let mut router_config = match &self.router_config_path {
            Some(path) => RouterConfig::from_file(path)?,
            None => RouterConfig::default(),
        };

        if let Some(enabled) = self.session_pinning {
            router_config.session_pinning = enabled;
        }

        Ok(router_config)
    }
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

/// Routing configuration supplied at router construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Tier table
    pub tiers: Vec<TierConfig>,
    /// Classification rules
    #[serde(default)]
    pub rules: Vec<TierRule>,
    /// Tier used when no rule matches
    #[serde(default = "default_tier")]
    pub default_tier: Tier,
    /// Keep sessions on their first tier/model
    #[serde(default = "default_session_pinning")]
    pub session_pinning: bool,
    /// Consecutive failures before a model is marked unhealthy
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

fn default_tier() -> Tier {
    Tier::Economy
}

fn default_session_pinning() -> bool {
    true
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

impl RouterConfig {
    /// Load a routing configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read router config {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Invalid router config {}", path.display()))
    }

    /// Parse a routing configuration from JSON
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse router config JSON")
    }
}

impl Default for RouterConfig {
    /// Built-in four-tier table with the default rule set
    fn default() -> Self {
        Self {
            tiers: vec![
                TierConfig {
                    tier: Tier::Free,
                    primary: "local/llama-3.2-3b".to_string(),
                    fallback: vec!["local/qwen-2.5-1.5b".to_string()],
                    max_context_tokens: 8_192,
                    cost_per_1k_input: 0.0,
                    cost_per_1k_output: 0.0,
                },
                TierConfig {
                    tier: Tier::Economy,
                    primary: "gpt-4o-mini".to_string(),
                    fallback: vec![
                        "claude-3-5-haiku".to_string(),
                        "gemini-1.5-flash".to_string(),
                    ],
                    max_context_tokens: 128_000,
                    cost_per_1k_input: 0.000_15,
                    cost_per_1k_output: 0.000_6,
                },
                TierConfig {
                    tier: Tier::Balanced,
                    primary: "claude-3-5-sonnet".to_string(),
                    fallback: vec!["gpt-4o".to_string(), "gemini-1.5-pro".to_string()],
                    max_context_tokens: 200_000,
                    cost_per_1k_input: 0.003,
                    cost_per_1k_output: 0.015,
                },
                TierConfig {
                    tier: Tier::Premium,
                    primary: "claude-3-opus".to_string(),
                    fallback: vec!["o1".to_string(), "gpt-4-turbo".to_string()],
                    max_context_tokens: 200_000,
                    cost_per_1k_input: 0.015,
                    cost_per_1k_output: 0.075,
                },
            ],
            rules: default_rules(),
            default_tier: default_tier(),
            session_pinning: default_session_pinning(),
            failure_threshold: default_failure_threshold(),
        }
    }
}
