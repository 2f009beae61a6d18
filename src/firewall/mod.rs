// ABOUTME: Host firewall rules this deployment added.
// ABOUTME: Rules are removed by exact match only; the host's other rules are never touched.

mod iptables;

pub use iptables::Iptables;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FirewallError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {message}")]
    Failed { command: String, message: String },
}

/// One exact rule: table, chain, and the match/target arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FirewallRule {
    #[serde(default = "default_table")]
    pub table: String,
    pub chain: String,
    /// Rule specification, e.g. `-p udp --dport 53 -j ACCEPT`.
    pub rule: String,
}

fn default_table() -> String {
    "filter".to_string()
}

impl FirewallRule {
    pub fn spec_args(&self) -> Vec<String> {
        self.rule.split_whitespace().map(str::to_string).collect()
    }
}

impl fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-t {} {} {}", self.table, self.chain, self.rule)
    }
}

#[async_trait]
pub trait Firewall: Send + Sync {
    /// Does this exact rule exist?
    async fn rule_exists(&self, rule: &FirewallRule) -> Result<bool, FirewallError>;

    /// Delete one instance of this exact rule.
    async fn delete_rule(&self, rule: &FirewallRule) -> Result<(), FirewallError>;
}

/// Rules added more than once have to be deleted more than once.
const MAX_DUPLICATES: usize = 16;

/// Delete every instance of `rule`. Returns how many were deleted; zero when absent.
pub async fn remove_exact(
    firewall: &dyn Firewall,
    rule: &FirewallRule,
) -> Result<usize, FirewallError> {
    let mut deleted = 0;
    while deleted < MAX_DUPLICATES && firewall.rule_exists(rule).await? {
        firewall.delete_rule(rule).await?;
        deleted += 1;
    }
    if deleted > 0 {
        tracing::info!("deleted firewall rule {} ({}x)", rule, deleted);
    }
    Ok(deleted)
}


#[cfg(test)]
pub(crate) fn rule(table: &str, chain: &str, spec: &str) -> FirewallRule {
    FirewallRule {
        table: table.to_string(),
        chain: chain.to_string(),
        rule: spec.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::fake::MemoryFirewall;
    use super::*;

    #[tokio::test]
    async fn removes_only_exact_rule_including_duplicates() {
        let ours = rule("nat", "PREROUTING", "-p udp --dport 53 -j REDIRECT --to-ports 5353");
        let foreign = rule("nat", "PREROUTING", "-p tcp --dport 80 -j REDIRECT --to-ports 8080");
        let fw = MemoryFirewall::with_rules(vec![ours.clone(), foreign.clone(), ours.clone()]);

        assert_eq!(remove_exact(&fw, &ours).await.unwrap(), 2);
        assert_eq!(fw.rules(), vec![foreign]);
    }

    #[tokio::test]
    async fn absent_rule_is_a_no_op() {
        let fw = MemoryFirewall::default();
        let r = rule("filter", "INPUT", "-p udp --dport 53 -j ACCEPT");
        assert_eq!(remove_exact(&fw, &r).await.unwrap(), 0);
    }

    #[test]
    fn rule_deserializes_with_default_table() {
        let r: FirewallRule =
            serde_yaml::from_str("chain: INPUT\nrule: -p udp --dport 53 -j ACCEPT").unwrap();
        assert_eq!(r.table, "filter");
        assert_eq!(r.spec_args(), vec!["-p", "udp", "--dport", "53", "-j", "ACCEPT"]);
        assert_eq!(r.to_string(), "-t filter INPUT -p udp --dport 53 -j ACCEPT");
    }
}
