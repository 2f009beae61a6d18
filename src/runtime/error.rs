// ABOUTME: Engine connection errors, built with snafu context selectors.
// ABOUTME: Separates "nothing installed" from "installed but not answering".

use snafu::Snafu;
use std::path::PathBuf;

use super::engine::EngineKind;
use super::traits::RuntimeInfoError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RuntimeError {
    #[snafu(display("no container engine found (checked {})", checked.join(", ")))]
    NotFound { checked: Vec<String> },

    #[snafu(display("cannot open {kind} socket {}: {source}", path.display()))]
    Connect {
        kind: EngineKind,
        path: PathBuf,
        source: RuntimeInfoError,
    },

    #[snafu(display("{kind} at {} is not responding: {source}", path.display()))]
    Unresponsive {
        kind: EngineKind,
        path: PathBuf,
        source: RuntimeInfoError,
    },
}

impl RuntimeError {
    /// True when no engine is installed at all, as opposed to a broken one.
    pub fn is_missing_engine(&self) -> bool {
        matches!(self, RuntimeError::NotFound { .. })
    }
}
