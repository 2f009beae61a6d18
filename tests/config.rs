// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, env var interpolation, discovery, and derived paths.

use hubstack::cleanup::MatchRule;
use hubstack::config::*;
use hubstack::runtime::EngineKind;
use std::path::PathBuf;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
app:
  name: hub
  base_dir: /srv/hub
services: [adguard, unbound, memos]
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.app.name, "hub");
        assert_eq!(config.services.len(), 3);
        assert!(config.infra_critical.is_empty());
        assert_eq!(config.health.interval, Duration::from_secs(1));
        assert_eq!(config.manifest_file(), PathBuf::from("/srv/hub/docker-compose.yml"));
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
app:
  name: hub
  base_dir: /srv/hub
  container_prefix: lab

services:
  - adguard
  - unbound
  - memos

infra_critical: [adguard, unbound]
images: [adguard/adguardhome, klutchell/unbound]

cleanup:
  volumes:
    - prefix: lab_
    - contains: memos
  networks:
    - exact: lab_frontend
  reserved_networks: [lan]
  extra_dirs: [logs]
  stop_timeout: 20s

tls:
  domain: hub.example.org
  min_remaining: 14days
  self_signed_days: 90
  backup_dir: /var/lib/hubstack/cert-backup

dns:
  timeout: 5s

health:
  ticks: 10
  interval: 2s

control_url: https://hub.example.org/health

schedule:
  marker: lab-managed

firewall:
  rules:
    - table: nat
      chain: PREROUTING
      rule: -p udp --dport 53 -j REDIRECT --to-ports 5353

engine:
  kind: podman
  socket: /run/user/1000/podman/podman.sock
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.app.container_prefix, "lab");
        assert_eq!(config.infra_critical.len(), 2);
        assert_eq!(config.tls.min_remaining, Duration::from_secs(14 * 86400));
        assert_eq!(config.tls.self_signed_days, 90);
        assert_eq!(config.health.ticks, 10);
        assert_eq!(config.firewall.rules.len(), 1);
        assert_eq!(config.engine.kind, Some(EngineKind::Podman));
        assert_eq!(config.retry_marker(), "lab-managed:cert-retry");
        assert_eq!(
            config.cert_backup_dir(),
            PathBuf::from("/var/lib/hubstack/cert-backup")
        );
        assert!(config.state_paths().contains(&PathBuf::from("/srv/hub/logs")));

        let plan = config.cleanup_plan(Some("hub.example.org".to_string()));
        assert_eq!(
            plan.volumes.rules(),
            [
                MatchRule::Prefixed("lab_".to_string()),
                MatchRule::Contains("memos".to_string())
            ]
        );
        assert!(plan.networks.matches("lab_frontend"));
        assert!(!plan.networks.matches("lan"));
        assert_eq!(plan.stop_timeout, Duration::from_secs(20));
    }

    #[test]
    fn missing_services_returns_error() {
        let yaml = "app:\n  name: hub\n  base_dir: /srv/hub\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn invalid_service_name_returns_error() {
        let yaml = "app:\n  name: hub\n  base_dir: /srv/hub\nservices: [Memos]\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn invalid_prefix_returns_error() {
        let yaml = "app:\n  name: hub\n  base_dir: /srv/hub\n  container_prefix: 'a b'\nservices: [memos]\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}

mod discovery {
    use super::*;

    const YAML: &str = "app:\n  name: hub\n  base_dir: /srv/hub\nservices: [memos]\n";

    #[test]
    fn finds_alternate_file_names() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".hubstack")).unwrap();
        std::fs::write(tmp.path().join(".hubstack/config.yml"), YAML).unwrap();

        let config = Config::discover(tmp.path()).unwrap();
        assert_eq!(config.source, Some(tmp.path().join(".hubstack/config.yml")));
    }

    #[test]
    fn prefers_primary_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILENAME), YAML).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILENAME_ALT), "not: [valid").unwrap();

        assert!(Config::discover(tmp.path()).is_ok());
    }

    #[test]
    fn empty_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Config::discover(tmp.path()).unwrap_err();
        assert!(matches!(err, hubstack::error::Error::ConfigNotFound(_)));
    }

    #[test]
    fn init_template_is_discoverable() {
        let tmp = tempfile::tempdir().unwrap();
        init_config(tmp.path(), Some("lab"), None, false).unwrap();
        let config = Config::discover(tmp.path()).unwrap();
        assert_eq!(config.app.name, "lab");
        assert_eq!(config.app.base_dir, tmp.path().join("lab"));
    }
}

mod env_vars {
    use super::*;

    #[test]
    fn literal_value() {
        let yaml = r#"
app: { name: hub, base_dir: /srv/hub }
services: [memos]
tls:
  dns_token: literal-token
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(
            config.dns_token(&Secrets::default()).as_deref(),
            Some("literal-token")
        );
    }

    #[test]
    fn env_reference() {
        let yaml = r#"
app: { name: hub, base_dir: /srv/hub }
services: [memos]
tls:
  dns_token:
    env: HUBSTACK_TEST_TOKEN
"#;
        let config = Config::from_yaml(yaml).unwrap();

        temp_env::with_var("HUBSTACK_TEST_TOKEN", Some("from_environment"), || {
            assert_eq!(
                config.dns_token(&Secrets::default()).as_deref(),
                Some("from_environment")
            );
        });

        temp_env::with_var_unset("HUBSTACK_TEST_TOKEN", || {
            let secrets = Secrets::parse("DESEC_TOKEN=from-secrets\n");
            assert_eq!(config.dns_token(&secrets).as_deref(), Some("from-secrets"));
        });
    }

    #[test]
    fn env_reference_with_empty_default_counts_as_absent() {
        let value = EnvValue::env("HUBSTACK_TEST_UNSET", Some(""));
        temp_env::with_var_unset("HUBSTACK_TEST_UNSET", || {
            assert_eq!(value.resolve().unwrap(), "");
            assert_eq!(value.resolve_optional(), None);
        });
    }

    #[test]
    fn unset_env_without_default_is_an_error() {
        let value = EnvValue::env("HUBSTACK_TEST_MISSING", None);
        temp_env::with_var_unset("HUBSTACK_TEST_MISSING", || {
            assert!(matches!(
                value.resolve(),
                Err(hubstack::error::Error::MissingEnvVar(_))
            ));
        });
    }

    #[test]
    fn display_hides_inline_secrets() {
        let literal = EnvValue::Literal("s3cret".to_string());
        assert!(!literal.to_string().contains("s3cret"));
        assert_eq!(EnvValue::env("DESEC_TOKEN", None).to_string(), "$DESEC_TOKEN");
    }
}

mod secrets {
    use super::*;

    #[test]
    fn secrets_file_next_to_the_stack() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".secrets");
        std::fs::write(
            &path,
            "# written by setup\nexport DESEC_DOMAIN=\"hub.example.org\"\nDESEC_TOKEN='abc'\n",
        )
        .unwrap();

        let secrets = Secrets::load(&path).unwrap();
        assert_eq!(secrets.domain(), Some("hub.example.org"));
        assert_eq!(secrets.token(), Some("abc"));
        assert_eq!(secrets.get(DOMAIN_KEY), Some("hub.example.org"));
    }

    #[test]
    fn missing_secrets_file_is_empty() {
        let secrets = Secrets::load(std::path::Path::new("/nonexistent/.secrets")).unwrap();
        assert_eq!(secrets.token(), None);
    }
}
