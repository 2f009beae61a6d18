// ABOUTME: TLS certificate lifecycle: inspection, backup/restore, issuance, fallback.
// ABOUTME: The certificate store is the only writer of certificate bytes.

mod acme;
mod classify;
mod error;
mod issuer;
mod rate_limit;
mod risk;
mod status;
mod store;
mod x509;

pub use acme::{
    AcmeAgent, AcmeShContainer, FailureKind, IssuanceFailure, IssueRequest, IssuedCertificate,
    classify_log,
};
pub use classify::{CertificateClass, DEFAULT_TRUSTED_ISSUERS, IssuerClass, IssuerMatcher};
pub use error::CertError;
pub use issuer::{CertificateIssuer, FallbackReason, IssuancePolicy, TlsOutcome};
pub use rate_limit::{RateLimitWindow, parse_retry_after};
pub use risk::{CertificateRisk, Preservation, PreservedCertificate, assess};
pub use status::{CertificateStatus, certificate_status};
pub use store::{BackupHandle, CertificateInfo, CertificatePaths, CertificateStore};
pub use x509::{
    CertificateFields, OpensslCli, SelfSignedRequest, X509Tool, parse_openssl_date,
    parse_x509_text,
};

#[cfg(test)]
pub(crate) mod testing {
    pub(crate) use super::acme::fake::FakeAgent;
    pub(crate) use super::store::testing::store_in;
    pub(crate) use super::x509::fake::{FakeX509, acme_fields, self_signed_fields, write_pair};
}
