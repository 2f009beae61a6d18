// ABOUTME: On-disk certificate/key pair and its single-slot backup area.
// ABOUTME: Inspection never fails; problems degrade to Missing or Malformed.

use super::classify::{CertificateClass, IssuerClass, IssuerMatcher};
use super::error::CertError;
use super::x509::{CertificateFields, SelfSignedRequest, X509Tool};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Where the certificate, its key, and the backup slot live.
#[derive(Debug, Clone)]
pub struct CertificatePaths {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub backup_dir: PathBuf,
}

/// Result of inspecting the certificate path.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateInfo {
    pub path: PathBuf,
    pub class: CertificateClass,
    pub fields: Option<CertificateFields>,
    pub key_present: bool,
}

impl CertificateInfo {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.fields.as_ref().map(|f| f.not_after)
    }

    /// Time left; `None` when nothing readable is on disk.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.expires_at().map(|t| t - now)
    }

    /// Unreadable certificates count as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|t| t <= now)
    }

    /// Key and certificate both present, and the certificate not expired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.key_present && !self.is_expired(now)
    }

    /// Expires within `window` of `now`, or cannot be read at all.
    pub fn is_expiring_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        self.remaining(now).is_none_or(|left| left <= window)
    }

    /// Subject CN or a SAN covers `domain`; wildcards cover one label.
    pub fn matches_domain(&self, domain: &str) -> bool {
        let Some(fields) = &self.fields else {
            return false;
        };
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        fields
            .common_name()
            .into_iter()
            .chain(fields.alt_names.iter().map(String::as_str))
            .any(|name| name_covers(&name.to_lowercase(), &domain))
    }

    pub fn issuer_class(&self) -> IssuerClass {
        match self.class {
            CertificateClass::Acme => IssuerClass::Acme,
            CertificateClass::SelfSigned => IssuerClass::SelfSigned,
            _ => IssuerClass::Unknown,
        }
    }
}

fn name_covers(name: &str, domain: &str) -> bool {
    if name == domain {
        return true;
    }
    match name.strip_prefix("*.") {
        Some(parent) => domain
            .split_once('.')
            .is_some_and(|(label, rest)| !label.is_empty() && rest == parent),
        None => false,
    }
}

/// Proof that a backup was taken. Consumed by [`CertificateStore::restore`].
#[derive(Debug)]
#[must_use = "a certificate backup should be restored"]
pub struct BackupHandle {
    cert: PathBuf,
    key: PathBuf,
}

/// Sole owner of the on-disk certificate state.
pub struct CertificateStore {
    paths: CertificatePaths,
    tool: Arc<dyn X509Tool>,
    matcher: IssuerMatcher,
}

impl CertificateStore {
    pub fn new(paths: CertificatePaths, tool: Arc<dyn X509Tool>, matcher: IssuerMatcher) -> Self {
        Self {
            paths,
            tool,
            matcher,
        }
    }

    pub fn cert_path(&self) -> &Path {
        &self.paths.cert
    }

    pub fn key_path(&self) -> &Path {
        &self.paths.key
    }

    /// Directory holding the certificate.
    pub fn cert_dir(&self) -> Option<&Path> {
        self.paths.cert.parent()
    }

    pub fn matcher(&self) -> &IssuerMatcher {
        &self.matcher
    }

    /// Inspect the managed certificate.
    pub async fn inspect(&self) -> CertificateInfo {
        self.inspect_pair(&self.paths.cert, &self.paths.key).await
    }

    async fn inspect_pair(&self, cert: &Path, key: &Path) -> CertificateInfo {
        let key_present = key.is_file();
        if !cert.is_file() {
            return CertificateInfo {
                path: cert.to_path_buf(),
                class: CertificateClass::Missing,
                fields: None,
                key_present,
            };
        }

        match self.tool.read(cert).await {
            Ok(fields) => CertificateInfo {
                path: cert.to_path_buf(),
                class: self.matcher.classify(&fields).into(),
                fields: Some(fields),
                key_present,
            },
            Err(e) => {
                tracing::warn!("treating {} as malformed: {}", cert.display(), e);
                CertificateInfo {
                    path: cert.to_path_buf(),
                    class: CertificateClass::Malformed,
                    fields: None,
                    key_present,
                }
            }
        }
    }

    pub fn classify_issuer(&self, issuer: &str) -> IssuerClass {
        self.matcher.classify_issuer(issuer)
    }

    /// Copy certificate and key into the backup slot, replacing any earlier backup.
    pub fn backup(&self) -> Result<BackupHandle, CertError> {
        for path in [&self.paths.cert, &self.paths.key] {
            if !path.is_file() {
                return Err(CertError::NothingToBackUp(path.clone()));
            }
        }

        let dir = &self.paths.backup_dir;
        if dir.exists() {
            std::fs::remove_dir_all(dir).map_err(CertError::io("clear", dir))?;
        }
        std::fs::create_dir_all(dir).map_err(CertError::io("create", dir))?;

        let handle = BackupHandle {
            cert: dir.join(file_name(&self.paths.cert)),
            key: dir.join(file_name(&self.paths.key)),
        };
        std::fs::copy(&self.paths.cert, &handle.cert)
            .map_err(CertError::io("back up", &self.paths.cert))?;
        std::fs::copy(&self.paths.key, &handle.key)
            .map_err(CertError::io("back up", &self.paths.key))?;

        tracing::info!(
            "backed up {} to {}",
            self.paths.cert.display(),
            dir.display()
        );
        Ok(handle)
    }

    /// Put a backup back in place. A partial backup is never installed.
    pub fn restore(&self, handle: BackupHandle) -> bool {
        if !handle.cert.is_file() || !handle.key.is_file() {
            tracing::error!(
                "certificate backup in {} is incomplete; nothing restored",
                self.paths.backup_dir.display()
            );
            return false;
        }

        let copied = self
            .ensure_cert_dir()
            .and_then(|()| {
                std::fs::copy(&handle.key, &self.paths.key)
                    .map_err(CertError::io("restore", &self.paths.key))
            })
            .and_then(|_| {
                std::fs::copy(&handle.cert, &self.paths.cert)
                    .map_err(CertError::io("restore", &self.paths.cert))
            });

        match copied {
            Ok(_) => {
                tracing::info!("restored certificate to {}", self.paths.cert.display());
                self.clear_backup();
                true
            }
            Err(e) => {
                tracing::error!("certificate restore failed: {}", e);
                false
            }
        }
    }

    /// Drop the backup slot.
    pub fn clear_backup(&self) {
        let dir = &self.paths.backup_dir;
        if dir.exists()
            && let Err(e) = std::fs::remove_dir_all(dir)
        {
            tracing::warn!("failed to clear {}: {}", dir.display(), e);
        }
    }

    /// Copy an issued pair into place.
    pub fn install(&self, cert: &Path, key: &Path) -> Result<(), CertError> {
        self.ensure_cert_dir()?;
        replace_file(key, &self.paths.key)?;
        replace_file(cert, &self.paths.cert)?;
        tracing::info!("installed certificate at {}", self.paths.cert.display());
        Ok(())
    }

    /// Generate a self-signed pair in place.
    pub async fn generate_self_signed(
        &self,
        common_name: &str,
        days: u32,
    ) -> Result<(), CertError> {
        self.ensure_cert_dir()
            .map_err(|e| CertError::SelfSignedGeneration(e.to_string()))?;

        let request = SelfSignedRequest {
            common_name,
            organization: self.matcher.local_marker(),
            days,
            cert_path: &self.paths.cert,
            key_path: &self.paths.key,
        };
        self.tool.self_signed(&request).await?;

        if !self.paths.cert.is_file() || !self.paths.key.is_file() {
            return Err(CertError::SelfSignedGeneration(format!(
                "{} or {} missing after generation",
                self.paths.cert.display(),
                self.paths.key.display()
            )));
        }
        tracing::info!("generated self-signed certificate for {}", common_name);
        Ok(())
    }

    fn ensure_cert_dir(&self) -> Result<(), CertError> {
        match self.cert_dir() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                std::fs::create_dir_all(dir).map_err(CertError::io("create", dir))
            }
            _ => Ok(()),
        }
    }
}

fn file_name(path: &Path) -> PathBuf {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("unnamed"))
}

/// Copy `from` next to `to`, then rename over it.
fn replace_file(from: &Path, to: &Path) -> Result<(), CertError> {
    let mut staging = to.as_os_str().to_owned();
    staging.push(".new");
    let staging = PathBuf::from(staging);
    std::fs::copy(from, &staging).map_err(CertError::io("copy", from))?;
    std::fs::rename(&staging, to).map_err(CertError::io("install", to))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::cert::x509::fake::FakeX509;

    /// A store rooted in `root`: certificate under `root/data/conf`, backup under `root/backup`.
    pub(crate) fn store_in(root: &Path, tool: Arc<FakeX509>) -> CertificateStore {
        CertificateStore::new(
            CertificatePaths {
                cert: root.join("data/conf/ssl.crt"),
                key: root.join("data/conf/ssl.key"),
                backup_dir: root.join("backup"),
            },
            tool,
            IssuerMatcher::default(),
        )
    }
}
