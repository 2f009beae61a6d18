// ABOUTME: Issuer classification: ACME-issued, self-signed, or unknown.
// ABOUTME: Decides whether deleting a certificate risks the issuer's rate limit.

use super::x509::CertificateFields;
use serde::Serialize;

/// Issuer substrings of public ACME CAs and their intermediates.
pub const DEFAULT_TRUSTED_ISSUERS: &[&str] = &[
    "Let's Encrypt",
    "R3",
    "R10",
    "R11",
    "E1",
    "E2",
    "E5",
    "E6",
    "ZeroSSL",
    "Sectigo",
    "DigiCert",
    "GTS",
    "ISRG",
    "DST Root",
];

/// Markers this short match whole words only, so `R3` does not hit `R30`.
const WORD_MATCH_MAX_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuerClass {
    Acme,
    SelfSigned,
    Unknown,
}

/// What is on disk at the certificate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateClass {
    Missing,
    Malformed,
    SelfSigned,
    Acme,
    Unknown,
}

impl From<IssuerClass> for CertificateClass {
    fn from(class: IssuerClass) -> Self {
        match class {
            IssuerClass::Acme => CertificateClass::Acme,
            IssuerClass::SelfSigned => CertificateClass::SelfSigned,
            IssuerClass::Unknown => CertificateClass::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuerMatcher {
    trusted: Vec<String>,
    local_marker: String,
}

impl Default for IssuerMatcher {
    fn default() -> Self {
        Self::new(
            DEFAULT_TRUSTED_ISSUERS.iter().map(|s| s.to_string()).collect(),
            "hubstack",
        )
    }
}

impl IssuerMatcher {
    pub fn new(trusted: Vec<String>, local_marker: impl Into<String>) -> Self {
        Self {
            trusted: trusted.into_iter().map(|m| m.to_lowercase()).collect(),
            local_marker: local_marker.into().to_lowercase(),
        }
    }

    /// The organization stamped into locally generated certificates.
    pub fn local_marker(&self) -> &str {
        &self.local_marker
    }

    /// Classify by issuer text alone.
    pub fn classify_issuer(&self, issuer: &str) -> IssuerClass {
        let issuer = issuer.to_lowercase();
        if !self.local_marker.is_empty() && issuer.contains(&self.local_marker) {
            return IssuerClass::SelfSigned;
        }
        if self.trusted.iter().any(|m| marker_matches(&issuer, m)) {
            return IssuerClass::Acme;
        }
        IssuerClass::Unknown
    }

    /// Classify a parsed certificate; issuer equal to subject is self-signed.
    pub fn classify(&self, fields: &CertificateFields) -> IssuerClass {
        if fields.issuer.trim() == fields.subject.trim() {
            return IssuerClass::SelfSigned;
        }
        self.classify_issuer(&fields.issuer)
    }
}

fn marker_matches(haystack: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    if marker.chars().count() > WORD_MATCH_MAX_LEN {
        return haystack.contains(marker);
    }
    haystack.match_indices(marker).any(|(start, m)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + m.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn letsencrypt_intermediates_are_acme() {
        let m = IssuerMatcher::default();
        assert_eq!(
            m.classify_issuer("C = US, O = Let's Encrypt, CN = R11"),
            IssuerClass::Acme
        );
        assert_eq!(m.classify_issuer("C = US, O = Google Trust Services, CN = WR1"), IssuerClass::Unknown);
        assert_eq!(m.classify_issuer("CN = GTS CA 1P5"), IssuerClass::Acme);
        assert_eq!(m.classify_issuer("CN = ZeroSSL RSA Domain Secure Site CA"), IssuerClass::Acme);
    }

    #[test]
    fn short_markers_need_word_boundaries() {
        let m = IssuerMatcher::default();
        assert_eq!(m.classify_issuer("CN = R30 Internal"), IssuerClass::Unknown);
        assert_eq!(m.classify_issuer("CN = homelab-E1x"), IssuerClass::Unknown);
        assert_eq!(m.classify_issuer("CN = E1"), IssuerClass::Acme);
    }

    #[test]
    fn local_marker_wins() {
        let m = IssuerMatcher::default();
        assert_eq!(
            m.classify_issuer("CN = hub.local, O = Hubstack"),
            IssuerClass::SelfSigned
        );
    }

    #[test]
    fn subject_equal_to_issuer_is_self_signed() {
        let m = IssuerMatcher::default();
        let fields = CertificateFields {
            subject: "CN = example.org".to_string(),
            issuer: "CN = example.org".to_string(),
            not_after: Utc::now(),
            alt_names: vec![],
        };
        assert_eq!(m.classify(&fields), IssuerClass::SelfSigned);
    }

    #[test]
    fn configured_markers_replace_defaults() {
        let m = IssuerMatcher::new(vec!["Buypass".to_string()], "homelab");
        assert_eq!(m.classify_issuer("CN = Buypass Class 2 CA 5"), IssuerClass::Acme);
        assert_eq!(m.classify_issuer("O = Let's Encrypt, CN = R3"), IssuerClass::Unknown);
    }
}
