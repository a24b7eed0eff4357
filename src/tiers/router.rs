//! Tier-based model routing
//!
//! Resolves a tier for each request (forced, session-pinned or classified),
//! walks that tier's fallback chain filtering on model health, and records
//! the decision. Routing never fails for runtime conditions: when every
//! candidate is unhealthy the last fallback is used anyway and the reason
//! says so. The only error is a request resolving to an unconfigured tier.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    classifier::IntentClassifier,
    config::RouterConfig,
    error::RouterResult,
    session::{
        affinity::{pin_slot, repin_slot, touch_slot},
        SessionAffinity, SessionAffinityStore,
    },
    stats::{RouteRecord, RoutingStats, RoutingStatsSnapshot},
    tokens::TokenCounter,
};

use super::{
    config::{TierConfig, TierRegistry},
    health::{HealthConfig, HealthTracker},
    Tier,
};

/// A routing request from a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Task description used for classification
    #[serde(default)]
    pub message: String,
    /// Size of the context the caller will send, in tokens
    #[serde(default)]
    pub context_tokens: Option<u32>,
    /// Skip classification and session lookup, use this tier
    #[serde(default)]
    pub force_tier: Option<Tier>,
    /// Conversation identifier for session pinning
    #[serde(default)]
    pub session_id: Option<String>,
    /// Identifier of the calling agent, for logs only
    #[serde(default)]
    pub agent_id: Option<String>,
}

impl RouteRequest {
    /// Request with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_force_tier(mut self, tier: Tier) -> Self {
        self.force_tier = Some(tier);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_context_tokens(mut self, tokens: u32) -> Self {
        self.context_tokens = Some(tokens);
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Check the request can be routed
    ///
    /// Classification needs a message, so one is required unless a tier is
    /// forced.
    pub fn validate(&self) -> Result<(), String> {
        if self.force_tier.is_none() && self.message.trim().is_empty() {
            return Err("message must not be empty unless force_tier is set".to_string());
        }
        Ok(())
    }
}

/// The router's decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Selected model identifier
    pub model: String,
    /// Tier the model was selected from
    pub tier: Tier,
    /// Input cost per 1K tokens of the selected tier
    pub estimated_cost_per_1k: f64,
    /// Human-readable justification
    pub reason: String,
    /// Whether the tier came from session affinity
    pub from_cache: bool,
}

/// Tier resolved for a request, before model selection
struct Resolution {
    tier: Tier,
    reasons: Vec<String>,
    escalated: bool,
}

/// Model chosen from a tier's chain
#[derive(Debug, PartialEq)]
struct Selection {
    model: String,
    fallback: bool,
    degraded: bool,
    note: Option<String>,
}

/// Everything `route` needs to build the result and record statistics
struct Decision {
    tier: Tier,
    selection: Selection,
    reasons: Vec<String>,
    from_cache: bool,
    escalated: bool,
    estimated_cost_per_1k: f64,
}

/// Routing decision engine
///
/// Owns the health tracker, session affinity store and statistics. The tier
/// registry and classifier are built once and never change. Share it as
/// `Arc<SmartRouter>`; every operation takes `&self`.
pub struct SmartRouter {
    registry: TierRegistry,
    classifier: IntentClassifier,
    health: HealthTracker,
    sessions: SessionAffinityStore,
    stats: RoutingStats,
    tokens: TokenCounter,
    session_pinning: bool,
}

impl SmartRouter {
    /// Build a router from configuration
    ///
    /// Fails with a configuration error on malformed tiers or rules.
    pub fn new(config: RouterConfig) -> RouterResult<Self> {
        let registry = TierRegistry::new(config.tiers, config.default_tier)?;
        let classifier = IntentClassifier::new(&config.rules, config.default_tier)?;

        for rule in &config.rules {
            if !registry.contains(rule.tier) {
                warn!(
                    tier = %rule.tier,
                    "Rule targets an unconfigured tier, matching requests will fail"
                );
            }
        }

        info!(
            tiers = registry.tiers().count(),
            rules = classifier.rule_count(),
            default_tier = %config.default_tier,
            session_pinning = config.session_pinning,
            "Router initialized"
        );

        Ok(Self {
            registry,
            classifier,
            health: HealthTracker::with_config(HealthConfig {
                failure_threshold: config.failure_threshold,
            }),
            sessions: SessionAffinityStore::new(),
            stats: RoutingStats::new(),
            tokens: TokenCounter::new(),
            session_pinning: config.session_pinning,
        })
    }

    /// Route a request to a model
    #[instrument(
        skip(self, request),
        fields(
            session_id = request.session_id.as_deref(),
            agent_id = request.agent_id.as_deref(),
            forced = ?request.force_tier
        )
    )]
    pub fn route(&self, request: &RouteRequest) -> RouterResult<RouteResult> {
        let started = Instant::now();

        let decision = match (request.force_tier, self.pinning_session(request)) {
            (Some(tier), _) => {
                let resolution = Resolution {
                    tier,
                    reasons: vec![format!("forced: tier {}", tier)],
                    escalated: false,
                };
                self.decide(resolution, None)?
            }
            (None, Some(session_id)) => {
                let slot = self.sessions.slot(session_id);
                let mut guard = slot.lock();
                match self.decide_for_session(&mut guard, request) {
                    Ok(decision) => decision,
                    Err(e) => {
                        let unpinned = guard.is_none();
                        drop(guard);
                        drop(slot);
                        if unpinned {
                            self.sessions.discard_unpinned(session_id);
                        }
                        return Err(e);
                    }
                }
            }
            (None, None) => {
                let resolution = self.resolve_by_classification(request)?;
                self.decide(resolution, None)?
            }
        };

        let Decision {
            tier,
            selection,
            mut reasons,
            from_cache,
            escalated,
            estimated_cost_per_1k,
        } = decision;

        if let Some(note) = &selection.note {
            reasons.push(note.clone());
        }

        self.stats.record(
            RouteRecord {
                tier,
                model: &selection.model,
                from_cache,
                fallback: selection.fallback,
                degraded: selection.degraded,
                escalated,
            },
            started.elapsed(),
        );

        let result = RouteResult {
            model: selection.model,
            tier,
            estimated_cost_per_1k,
            reason: reasons.join("; "),
            from_cache,
        };

        debug!(
            tier = %result.tier,
            model = %result.model,
            from_cache = result.from_cache,
            reason = %result.reason,
            "Request routed"
        );

        Ok(result)
    }

    /// Feed the outcome of a call to a model back into health tracking
    ///
    /// Only models in the tier table are tracked, which keeps health records
    /// and metric series bounded. Returns `false` for any other model.
    #[instrument(skip(self))]
    pub fn report_outcome(&self, model: &str, success: bool, latency_ms: Option<u64>) -> bool {
        if !self.registry.tiers().any(|config| config.contains(model)) {
            warn!("Outcome reported for a model outside the tier table, ignoring");
            return false;
        }

        if success {
            self.health.report_success(model, latency_ms);
        } else {
            self.health.report_failure(model);
        }

        metrics::counter!(
            "tier_router_outcomes_total",
            "model" => model.to_string(),
            "result" => if success { "success" } else { "failure" }
        )
        .increment(1);
        true
    }

    /// Record a successful call to a model
    pub fn report_success(&self, model: &str, latency_ms: u64) -> bool {
        self.report_outcome(model, true, Some(latency_ms))
    }

    /// Record a failed call to a model
    pub fn report_failure(&self, model: &str) -> bool {
        self.report_outcome(model, false, None)
    }

    /// Copy of the routing statistics
    pub fn stats(&self) -> RoutingStatsSnapshot {
        self.stats.snapshot()
    }

    /// Health tracker, read-only view for callers
    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    /// Session affinity store
    pub fn sessions(&self) -> &SessionAffinityStore {
        &self.sessions
    }

    /// Tier registry
    pub fn registry(&self) -> &TierRegistry {
        &self.registry
    }

    /// Tier used when no classification rule matches
    pub fn default_tier(&self) -> Tier {
        self.classifier.default_tier()
    }

    /// Whether session pinning is enabled
    pub fn session_pinning_enabled(&self) -> bool {
        self.session_pinning
    }

    /// Session id to pin on, if pinning applies to this request
    fn pinning_session<'a>(&self, request: &'a RouteRequest) -> Option<&'a str> {
        if !self.session_pinning {
            return None;
        }
        request.session_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Decide for a session while holding its lock
    fn decide_for_session(
        &self,
        slot: &mut Option<SessionAffinity>,
        request: &RouteRequest,
    ) -> RouterResult<Decision> {
        let Some(affinity) = slot.as_ref() else {
            let resolution = self.resolve_by_classification(request)?;
            let decision = self.decide(resolution, None)?;
            pin_slot(slot, decision.tier, &decision.selection.model);
            debug!(
                tier = %decision.tier,
                model = %decision.selection.model,
                "Session pinned"
            );
            return Ok(decision);
        };

        let tier = affinity.tier;
        let pinned = affinity.model.clone();
        let resolution = Resolution {
            tier,
            reasons: vec![format!("session-pinned: tier {}", tier)],
            escalated: false,
        };
        let mut decision = self.decide(resolution, Some(&pinned))?;
        decision.from_cache = true;

        if decision.selection.model == pinned {
            touch_slot(slot);
        } else {
            repin_slot(slot, tier, &decision.selection.model);
            info!(
                tier = %tier,
                previous_model = %pinned,
                model = %decision.selection.model,
                "Pinned model unhealthy, session repinned within tier"
            );
        }

        Ok(decision)
    }

    /// Classify the message and apply context-window escalation
    fn resolve_by_classification(&self, request: &RouteRequest) -> RouterResult<Resolution> {
        let classification = self.classifier.classify(&request.message);
        let mut resolution = Resolution {
            tier: classification.tier,
            reasons: vec![classification.describe()],
            escalated: false,
        };

        let config = self.registry.config_for(classification.tier)?;
        let Some(tokens) = self.context_tokens(request, config) else {
            return Ok(resolution);
        };
        if tokens <= config.max_context_tokens {
            return Ok(resolution);
        }

        match self.registry.escalation_for(config.tier, tokens) {
            Some(larger) => {
                info!(
                    from_tier = %config.tier,
                    to_tier = %larger.tier,
                    context_tokens = tokens,
                    "Escalating to a tier with a larger context window"
                );
                resolution.reasons.push(format!(
                    "escalated to tier {}: {} context tokens exceed tier {} window of {}",
                    larger.tier, tokens, config.tier, config.max_context_tokens
                ));
                resolution.tier = larger.tier;
                resolution.escalated = true;
            }
            None => {
                warn!(
                    tier = %config.tier,
                    context_tokens = tokens,
                    "Context exceeds every configured window, keeping classified tier"
                );
                resolution.reasons.push(format!(
                    "{} context tokens exceed every configured window",
                    tokens
                ));
            }
        }

        Ok(resolution)
    }

    /// Context size of a request, if it could matter for `config`
    ///
    /// A token spans at least one byte, so a message no longer than the
    /// window in bytes is never measured.
    fn context_tokens(&self, request: &RouteRequest, config: &TierConfig) -> Option<u32> {
        if let Some(tokens) = request.context_tokens {
            return Some(tokens);
        }
        if request.message.len() <= config.max_context_tokens as usize {
            return None;
        }
        Some(self.tokens.estimate_tokens(&request.message))
    }

    fn decide(&self, resolution: Resolution, pinned: Option<&str>) -> RouterResult<Decision> {
        let config = self.registry.config_for(resolution.tier)?;
        let selection = self.select_model(config, pinned);

        Ok(Decision {
            tier: resolution.tier,
            selection,
            reasons: resolution.reasons,
            from_cache: false,
            escalated: resolution.escalated,
            estimated_cost_per_1k: config.cost_per_1k_input,
        })
    }

    /// Pick the first healthy candidate, or the last fallback if none is
    ///
    /// A pinned model is tried before the tier's own chain.
    fn select_model(&self, config: &TierConfig, pinned: Option<&str>) -> Selection {
        let candidates: Vec<&str> = pinned
            .into_iter()
            .chain(config.candidates().filter(|model| Some(*model) != pinned))
            .collect();

        match candidates
            .iter()
            .position(|model| self.health.is_healthy(model))
        {
            Some(0) => Selection {
                model: candidates[0].to_string(),
                fallback: false,
                degraded: false,
                note: None,
            },
            Some(index) => {
                let skipped = candidates[..index].join(", ");
                info!(
                    tier = %config.tier,
                    model = %candidates[index],
                    skipped = %skipped,
                    "Selected fallback model"
                );
                Selection {
                    model: candidates[index].to_string(),
                    fallback: true,
                    degraded: false,
                    note: Some(format!(
                        "fallback to '{}': {} unhealthy",
                        candidates[index], skipped
                    )),
                }
            }
            None => {
                let model = config.last_fallback();
                warn!(
                    tier = %config.tier,
                    model = %model,
                    candidates = candidates.len(),
                    "All candidates unhealthy, routing to last fallback"
                );
                Selection {
                    model: model.to_string(),
                    fallback: false,
                    degraded: true,
                    note: Some(format!(
                        "all candidates unhealthy, using last fallback '{}'",
                        model
                    )),
                }
            }
        }
    }
}
