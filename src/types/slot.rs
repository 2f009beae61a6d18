// ABOUTME: Blue/green slot identities.
// ABOUTME: Exactly two slots exist; each owns a container-name prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the two parallel deployment environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Default identity on first run.
    #[default]
    A,
    B,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown slot identity: {0:?} (expected 'a' or 'b')")]
pub struct ParseSlotError(pub String);

impl Slot {
    /// The slot that is not `self`.
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::A => "a",
            Slot::B => "b",
        }
    }

    /// Prefix carried by every container of this slot, e.g. `dhi-a-`.
    pub fn container_prefix(self, base: &str) -> String {
        format!("{}-{}-", base, self.as_str())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = ParseSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Slot::A),
            "b" => Ok(Slot::B),
            other => Err(ParseSlotError(other.to_string())),
        }
    }
}
