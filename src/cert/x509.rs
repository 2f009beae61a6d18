// ABOUTME: X.509 field extraction and self-signed generation through the openssl CLI.
// ABOUTME: Text parsing of openssl output stays inside this adapter.

use super::error::CertError;
use crate::process::HostCommand;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// The fields cleanup and issuance decisions are based on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateFields {
    /// Full subject line, e.g. `CN = example.org`.
    pub subject: String,
    /// Full issuer line, e.g. `C = US, O = Let's Encrypt, CN = R3`.
    pub issuer: String,
    pub not_after: DateTime<Utc>,
    #[serde(default)]
    pub alt_names: Vec<String>,
}

impl CertificateFields {
    /// Subject common name, if the subject has one.
    pub fn common_name(&self) -> Option<&str> {
        common_name(&self.subject)
    }

    pub fn issuer_common_name(&self) -> Option<&str> {
        common_name(&self.issuer)
    }
}

/// Parameters for a locally generated certificate.
#[derive(Debug, Clone)]
pub struct SelfSignedRequest<'a> {
    pub common_name: &'a str,
    pub organization: &'a str,
    pub days: u32,
    pub cert_path: &'a Path,
    pub key_path: &'a Path,
}

/// Reads certificates and creates self-signed ones.
#[async_trait]
pub trait X509Tool: Send + Sync {
    async fn read(&self, cert: &Path) -> Result<CertificateFields, CertError>;

    async fn self_signed(&self, request: &SelfSignedRequest<'_>) -> Result<(), CertError>;
}

static SUBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Subject:\s*(.*?)\s*$").expect("valid regex"));
static ISSUER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Issuer:\s*(.*?)\s*$").expect("valid regex"));
static NOT_AFTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Not After\s*:\s*(.*?)\s*$").expect("valid regex"));
static CN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CN\s*=\s*([^,/\n]+)").expect("valid regex"));
static SAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DNS:([^,\s]+)").expect("valid regex"));

fn common_name(dn: &str) -> Option<&str> {
    CN_RE
        .captures(dn)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Parse openssl's `Not After` form, e.g. `Jan  1 00:00:00 2027 GMT`.
pub fn parse_openssl_date(text: &str) -> Option<DateTime<Utc>> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, "%b %d %H:%M:%S %Y GMT")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Extract fields from `openssl x509 -noout -text` output.
pub fn parse_x509_text(text: &str) -> Result<CertificateFields, String> {
    let capture = |re: &Regex, what: &str| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| format!("no {what} in certificate text"))
    };

    let subject = capture(&SUBJECT_RE, "subject")?;
    let issuer = capture(&ISSUER_RE, "issuer")?;
    let not_after_text = capture(&NOT_AFTER_RE, "expiry")?;
    let not_after = parse_openssl_date(&not_after_text)
        .ok_or_else(|| format!("unrecognized expiry date {not_after_text:?}"))?;
    let alt_names = SAN_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    Ok(CertificateFields {
        subject,
        issuer,
        not_after,
        alt_names,
    })
}

/// The `openssl` binary on the host.
#[derive(Debug, Clone)]
pub struct OpensslCli {
    program: String,
}

impl Default for OpensslCli {
    fn default() -> Self {
        Self {
            program: "openssl".to_string(),
        }
    }
}

impl OpensslCli {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl X509Tool for OpensslCli {
    async fn read(&self, cert: &Path) -> Result<CertificateFields, CertError> {
        let cmd = HostCommand::new(&self.program)
            .args(["x509", "-noout", "-text", "-in"])
            .arg_path(cert);
        let out = cmd
            .run()
            .await
            .map_err(|e| CertError::Tool(format!("{}: {}", cmd.display(), e)))?;

        if !out.success {
            return Err(CertError::Parse {
                path: cert.to_path_buf(),
                reason: out.summary(),
            });
        }

        parse_x509_text(&out.stdout).map_err(|reason| CertError::Parse {
            path: cert.to_path_buf(),
            reason,
        })
    }

    async fn self_signed(&self, request: &SelfSignedRequest<'_>) -> Result<(), CertError> {
        let cn = request.common_name;
        let cmd = HostCommand::new(&self.program)
            .args(["req", "-x509", "-nodes", "-newkey", "rsa:2048", "-sha256"])
            .args(["-days".to_string(), request.days.to_string()])
            .arg("-keyout")
            .arg_path(request.key_path)
            .arg("-out")
            .arg_path(request.cert_path)
            .arg("-subj")
            .arg(format!("/CN={}/O={}", cn, request.organization))
            .arg("-addext")
            .arg(format!("subjectAltName=DNS:{cn},DNS:*.{cn}"));

        let out = cmd
            .run()
            .await
            .map_err(|e| CertError::SelfSignedGeneration(format!("{}: {}", cmd.display(), e)))?;

        if out.success {
            Ok(())
        } else {
            Err(CertError::SelfSignedGeneration(out.summary()))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const LE_TEXT: &str = "\
Certificate:
    Data:
        Version: 3 (0x2)
        Signature Algorithm: sha256WithRSAEncryption
        Issuer: C = US, O = Let's Encrypt, CN = R3
        Validity
            Not Before: Oct  3 10:00:00 2026 GMT
            Not After : Jan  1 09:59:59 2027 GMT
        Subject: CN = example.org
        X509v3 extensions:
            X509v3 Subject Alternative Name:
                DNS:*.example.org, DNS:example.org
";

    #[test]
    fn parses_letsencrypt_text() {
        let fields = parse_x509_text(LE_TEXT).unwrap();
        assert_eq!(fields.subject, "CN = example.org");
        assert_eq!(fields.issuer, "C = US, O = Let's Encrypt, CN = R3");
        assert_eq!(fields.common_name(), Some("example.org"));
        assert_eq!(fields.issuer_common_name(), Some("R3"));
        assert_eq!(fields.alt_names, vec!["*.example.org", "example.org"]);
        assert_eq!(fields.not_after.year(), 2027);
        assert_eq!(fields.not_after.hour(), 9);
    }

    #[test]
    fn parses_single_digit_and_padded_days() {
        let a = parse_openssl_date("Jan  1 00:00:00 2027 GMT").unwrap();
        let b = parse_openssl_date("Jan 01 00:00:00 2027 GMT").unwrap();
        assert_eq!(a, b);
        assert!(parse_openssl_date("tomorrow").is_none());
    }

    #[test]
    fn garbage_text_is_an_error() {
        assert!(parse_x509_text("unable to load certificate").is_err());
    }

    #[test]
    fn legacy_slash_subject_common_name() {
        assert_eq!(common_name("/C=DE/CN=hub.local/O=x"), Some("hub.local"));
    }
}
