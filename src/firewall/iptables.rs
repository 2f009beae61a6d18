// ABOUTME: iptables-backed firewall adapter.
// ABOUTME: Checks with -C and deletes with -D so only exact matches are affected.

use super::{Firewall, FirewallError, FirewallRule};
use crate::process::HostCommand;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct Iptables {
    program: String,
}

impl Default for Iptables {
    fn default() -> Self {
        Self {
            program: "iptables".to_string(),
        }
    }
}

impl Iptables {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&self, action: &str, rule: &FirewallRule) -> HostCommand {
        HostCommand::new(&self.program)
            .args(["-t", rule.table.as_str(), action, rule.chain.as_str()])
            .args(rule.spec_args())
    }
}

#[async_trait]
impl Firewall for Iptables {
    async fn rule_exists(&self, rule: &FirewallRule) -> Result<bool, FirewallError> {
        let cmd = self.command("-C", rule);
        let out = cmd.run().await.map_err(|source| FirewallError::Spawn {
            command: cmd.display(),
            source,
        })?;

        // -C exits 1 when the rule is absent, 2 or more on usage/permission errors.
        match out.exit_code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(FirewallError::Failed {
                command: cmd.display(),
                message: out.summary(),
            }),
        }
    }

    async fn delete_rule(&self, rule: &FirewallRule) -> Result<(), FirewallError> {
        let cmd = self.command("-D", rule);
        let out = cmd.run().await.map_err(|source| FirewallError::Spawn {
            command: cmd.display(),
            source,
        })?;

        if out.success {
            Ok(())
        } else {
            Err(FirewallError::Failed {
                command: cmd.display(),
                message: out.summary(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firewall::rule;

    #[test]
    fn check_command_places_table_and_chain_first() {
        let r = rule("nat", "PREROUTING", "-p udp --dport 53 -j REDIRECT --to-ports 5353");
        assert_eq!(
            Iptables::new().command("-C", &r).display(),
            "iptables -t nat -C PREROUTING -p udp --dport 53 -j REDIRECT --to-ports 5353"
        );
    }
}
