//! Intent classification
//!
//! Maps a message to a tier using ordered pattern/keyword rules. Evaluation
//! order is fixed: tier 0 rules first, then 3, 2, 1. A message matching both
//! a premium and an economy keyword is therefore classified premium.
//!
//! Classification is pure and allocation-light; it runs on every request that
//! is neither forced nor session-pinned.

pub mod rules;

pub use rules::{default_rules, RuleMatch, TierRule};

use crate::error::RouterResult;
use crate::tiers::Tier;

use rules::CompiledRule;

/// Order in which tier buckets are evaluated
pub const EVALUATION_ORDER: [Tier; 4] = [Tier::Free, Tier::Premium, Tier::Balanced, Tier::Economy];

/// Outcome of classifying a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Selected tier
    pub tier: Tier,
    /// The match that decided the tier, `None` when the default tier was used
    pub matched: Option<RuleMatch>,
}

impl Classification {
    /// Short explanation used in routing reasons
    pub fn describe(&self) -> String {
        match &self.matched {
            Some(RuleMatch::Pattern(pattern)) => {
                format!("tier {}: pattern match '{}'", self.tier, pattern)
            }
            Some(RuleMatch::Keyword(keyword)) => {
                format!("tier {}: keyword match '{}'", self.tier, keyword)
            }
            None => "default tier: no rule matched".to_string(),
        }
    }
}

/// Compiled, tier-ordered rule set
#[derive(Debug)]
pub struct IntentClassifier {
    /// Rules bucketed by tier index, config order preserved within a bucket
    buckets: [Vec<CompiledRule>; 4],
    default_tier: Tier,
}

impl IntentClassifier {
    /// Compile a rule set
    ///
    /// Fails if any rule is empty or carries an invalid pattern.
    pub fn new(rules: &[TierRule], default_tier: Tier) -> RouterResult<Self> {
        let mut buckets: [Vec<CompiledRule>; 4] = Default::default();
        for rule in rules {
            let compiled = CompiledRule::compile(rule)?;
            buckets[compiled.tier.index()].push(compiled);
        }

        Ok(Self {
            buckets,
            default_tier,
        })
    }

    /// Tier returned when no rule matches
    pub fn default_tier(&self) -> Tier {
        self.default_tier
    }

    /// Number of compiled rules
    pub fn rule_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Classify a message; first matching rule wins
    pub fn classify(&self, message: &str) -> Classification {
        let normalized = message.trim().to_lowercase();

        for tier in EVALUATION_ORDER {
            for rule in &self.buckets[tier.index()] {
                if let Some(matched) = rule.matches(message, &normalized) {
                    return Classification {
                        tier,
                        matched: Some(matched),
                    };
                }
            }
        }

        Classification {
            tier: self.default_tier,
            matched: None,
        }
    }
}

/// One-shot classification against an uncompiled rule set
///
/// Prefer building an [`IntentClassifier`] once when classifying repeatedly.
pub fn classify(message: &str, rules: &[TierRule], default_tier: Tier) -> RouterResult<Tier> {
    Ok(IntentClassifier::new(rules, default_tier)?
        .classify(message)
        .tier)
}
