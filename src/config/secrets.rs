// ABOUTME: Reader for the deployment's key=value secrets file.
// ABOUTME: Supplies the previously configured domain during certificate-risk assessment.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Key holding the domain the certificate was issued for.
pub const DOMAIN_KEY: &str = "DESEC_DOMAIN";
/// Key holding the DNS provider token.
pub const TOKEN_KEY: &str = "DESEC_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    values: BTreeMap<String, String>,
}

impl Secrets {
    /// Parse `KEY=value` lines. Blank lines and `#` comments are skipped,
    /// an `export ` prefix and matching quotes are stripped.
    pub fn parse(text: &str) -> Self {
        let values = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| {
                let l = l.strip_prefix("export ").unwrap_or(l);
                let (key, value) = l.split_once('=')?;
                Some((key.trim().to_string(), unquote(value.trim()).to_string()))
            })
            .collect();
        Self { values }
    }

    /// A missing file reads as empty.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn domain(&self) -> Option<&str> {
        self.get(DOMAIN_KEY)
    }

    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_KEY)
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
