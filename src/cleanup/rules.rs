// ABOUTME: Name-matching rules for cleanup targets.
// ABOUTME: Exact, prefixed, and substring rules; engine-reserved names never match.

use crate::types::{ServiceName, Slot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Networks every engine creates for itself.
pub const RESERVED_NETWORKS: &[&str] = &[
    "bridge",
    "host",
    "none",
    "ingress",
    "docker_gwbridge",
    "podman",
];

/// One way of recognising a resource as ours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact(String),
    #[serde(rename = "prefix")]
    Prefixed(String),
    Contains(String),
}

impl MatchRule {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            MatchRule::Exact(exact) => name == exact,
            MatchRule::Prefixed(prefix) => !prefix.is_empty() && name.starts_with(prefix.as_str()),
            MatchRule::Contains(fragment) => {
                !fragment.is_empty() && name.contains(fragment.as_str())
            }
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Exact(s) => write!(f, "={s}"),
            MatchRule::Prefixed(s) => write!(f, "{s}*"),
            MatchRule::Contains(s) => write!(f, "*{s}*"),
        }
    }
}

/// A list of rules plus names that must never match.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<MatchRule>,
    reserved: BTreeSet<String>,
}

impl RuleSet {
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self {
            rules,
            reserved: BTreeSet::new(),
        }
    }

    /// Rules for networks: the engine's reserved networks are excluded.
    pub fn for_networks(rules: Vec<MatchRule>, extra_reserved: &[String]) -> Self {
        let reserved = RESERVED_NETWORKS
            .iter()
            .map(|s| s.to_string())
            .chain(extra_reserved.iter().cloned())
            .collect();
        Self { rules, reserved }
    }

    /// Exact container names for `services`: bare and under each slot prefix.
    pub fn for_service_containers(services: &[ServiceName], prefix_base: &str) -> Self {
        let rules = services
            .iter()
            .flat_map(|s| {
                [
                    s.bare_container(),
                    s.slot_container(prefix_base, Slot::A),
                    s.slot_container(prefix_base, Slot::B),
                ]
            })
            .map(|c| MatchRule::Exact(c.into_inner()))
            .collect();
        Self::new(rules)
    }

    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    pub fn matches(&self, name: &str) -> bool {
        !self.is_reserved(name) && self.rules.iter().any(|r| r.matches(name))
    }

    /// Matching names, in input order.
    pub fn select<'n, I>(&self, names: I) -> Vec<&'n str>
    where
        I: IntoIterator<Item = &'n str>,
    {
        names.into_iter().filter(|n| self.matches(n)).collect()
    }
}
