// ABOUTME: Error type for certificate inspection, backup, and installation.
// ABOUTME: Only SelfSignedGeneration is fatal to a run; callers degrade on the rest.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("certificate tool failed: {0}")]
    Tool(String),

    #[error("cannot parse certificate {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("nothing to back up: {0} is missing")]
    NothingToBackUp(PathBuf),

    #[error("self-signed certificate generation failed: {0}")]
    SelfSignedGeneration(String),
}

impl CertError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CertError::Io {
            action,
            path,
            source,
        }
    }

    /// No TLS material can be produced; TLS-dependent services must not start.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CertError::SelfSignedGeneration(_))
    }
}
