//! Classification rules
//!
//! A rule maps a set of regex patterns and/or keywords to a tier. Patterns are
//! only evaluated for tier 0; keywords are evaluated for every tier.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RouterError, RouterResult};
use crate::tiers::Tier;

/// A configured classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    /// Tier assigned when the rule matches
    pub tier: Tier,
    /// Regex patterns, matched against the original message (tier 0 only)
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Keywords, matched as substrings of the lowercased message
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl TierRule {
    /// Build a keyword-only rule
    pub fn keywords(tier: Tier, keywords: &[&str]) -> Self {
        Self {
            tier,
            patterns: Vec::new(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Build a pattern-only rule
    pub fn patterns(tier: Tier, patterns: &[&str]) -> Self {
        Self {
            tier,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            keywords: Vec::new(),
        }
    }
}

/// What caused a rule to match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatch {
    /// A tier-0 regex matched; holds the pattern source
    Pattern(String),
    /// A keyword was found in the message
    Keyword(String),
}

/// A rule ready for evaluation: regexes compiled, keywords lowercased
#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub(crate) tier: Tier,
    patterns: Vec<Regex>,
    keywords: Vec<String>,
}

impl CompiledRule {
    /// Validate and compile a configured rule
    pub(crate) fn compile(rule: &TierRule) -> RouterResult<Self> {
        if rule.patterns.is_empty() && rule.keywords.is_empty() {
            return Err(RouterError::config(format!(
                "rule for tier {} has neither patterns nor keywords",
                rule.tier
            )));
        }
        if rule.tier != Tier::Free && rule.keywords.is_empty() {
            return Err(RouterError::config(format!(
                "rule for tier {} has only patterns, which are evaluated for tier 0 only",
                rule.tier
            )));
        }

        let patterns = if rule.tier == Tier::Free {
            rule.patterns
                .iter()
                .map(|source| {
                    if source.trim().is_empty() {
                        return Err(RouterError::config(format!(
                            "rule for tier {} has a blank pattern",
                            rule.tier
                        )));
                    }
                    Regex::new(source).map_err(|e| {
                        RouterError::config(format!("invalid pattern '{}': {}", source, e))
                    })
                })
                .collect::<RouterResult<Vec<_>>>()?
        } else {
            if !rule.patterns.is_empty() {
                warn!(
                    tier = %rule.tier,
                    patterns = rule.patterns.len(),
                    "Patterns are only evaluated for tier 0, ignoring"
                );
            }
            Vec::new()
        };

        let keywords = rule
            .keywords
            .iter()
            .map(|keyword| {
                let normalized = keyword.trim().to_lowercase();
                if normalized.is_empty() {
                    return Err(RouterError::config(format!(
                        "rule for tier {} has a blank keyword",
                        rule.tier
                    )));
                }
                Ok(normalized)
            })
            .collect::<RouterResult<Vec<_>>>()?;

        Ok(Self {
            tier: rule.tier,
            patterns,
            keywords,
        })
    }

    /// Check the rule against a message
    ///
    /// `original` is the message as received; `normalized` is lowercased and
    /// trimmed. Patterns run before keywords.
    pub(crate) fn matches(&self, original: &str, normalized: &str) -> Option<RuleMatch> {
        if let Some(pattern) = self.patterns.iter().find(|p| p.is_match(original)) {
            return Some(RuleMatch::Pattern(pattern.as_str().to_string()));
        }

        self.keywords
            .iter()
            .find(|keyword| normalized.contains(keyword.as_str()))
            .map(|keyword| RuleMatch::Keyword(keyword.clone()))
    }
}

/// Built-in rule set used by the default router configuration
pub fn default_rules() -> Vec<TierRule> {
    vec![
        TierRule::patterns(
            Tier::Free,
            &[
                r"(?i)^\s*(hi|hello|hey|thanks|thank you|ok|okay|bye)\b[\s!.?]*$",
                r"^\s*[\d\s+\-*/().]+=?\s*$",
                r"(?i)^\s*what time is it\??\s*$",
            ],
        ),
        TierRule::keywords(
            Tier::Premium,
            &[
                "distributed system",
                "architecture",
                "security audit",
                "formal proof",
                "threat model",
                "research paper",
            ],
        ),
        TierRule::keywords(
            Tier::Balanced,
            &[
                "refactor",
                "debug",
                "implement",
                "code review",
                "analyze",
                "write a function",
                "unit test",
            ],
        ),
        TierRule::keywords(
            Tier::Economy,
            &["summarize", "translate", "rephrase", "explain", "list", "format"],
        ),
    ]
}
