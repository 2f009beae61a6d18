// ABOUTME: Config scaffolding for new installations.
// ABOUTME: Creates a commented hubstack.yml template.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ServiceName;

use super::{CONFIG_FILENAME, Config};

pub fn init_config(
    dir: &Path,
    name: Option<&str>,
    domain: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let name = name.unwrap_or("hub");
    // The app name doubles as a volume prefix, so it follows service-name rules.
    ServiceName::new(name).map_err(|e| Error::InvalidConfig(e.to_string()))?;

    let yaml = generate_template_yaml(name, &dir.join(name).display().to_string(), domain);
    // Refuse to write a template that would not load back.
    Config::from_yaml(&yaml)?;
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(name: &str, base_dir: &str, domain: Option<&str>) -> String {
    let domain_line = match domain {
        Some(d) => format!("  domain: {d}"),
        None => "  # domain: hub.example.org".to_string(),
    };
    format!(
        r#"app:
  name: {name}
  base_dir: {base_dir}
  container_prefix: dhi

services:
  - adguard
  - unbound
  - memos

# Started first and health-gated before the rest.
infra_critical:
  - adguard
  - unbound

tls:
{domain_line}
  dns_token:
    env: DESEC_TOKEN
    default: ""
  min_remaining: 30days

health:
  ticks: 30
  interval: 1s

# control_url: http://127.0.0.1:8088/health

# firewall:
#   rules:
#     - table: nat
#       chain: PREROUTING
#       rule: -p udp --dport 53 -j REDIRECT --to-ports 5353

# Autodetected when omitted (rootless Podman, rootful Podman, Docker).
# engine:
#   kind: podman
#   socket: /run/user/1000/podman/podman.sock
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_loads_back() {
        let yaml = generate_template_yaml("hub", "/srv/hub", Some("hub.example.org"));
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.app.name, "hub");
        assert_eq!(config.tls.domain.as_deref(), Some("hub.example.org"));
        assert_eq!(config.infra_critical.len(), 2);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = tempfile::tempdir().unwrap();
        init_config(tmp.path(), None, None, false).unwrap();
        assert!(matches!(
            init_config(tmp.path(), None, None, false),
            Err(Error::AlreadyExists(_))
        ));
        init_config(tmp.path(), Some("lab"), None, true).unwrap();
    }
}
