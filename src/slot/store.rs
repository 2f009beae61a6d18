// ABOUTME: Durable active-slot pointer: a single token in a small file.
// ABOUTME: Writes go to a temp file that is renamed over the old one.

use super::SlotError;
use crate::types::Slot;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SlotStore {
    path: PathBuf,
}

impl SlotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file means first run: the default slot.
    pub fn load(&self) -> Result<Slot, SlotError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} absent, defaulting to slot {}", self.path.display(), Slot::default());
                return Ok(Slot::default());
            }
            Err(e) => return Err(SlotError::io("read", &self.path)(e)),
        };

        content.parse().map_err(|_| SlotError::Corrupt {
            path: self.path.clone(),
            content: content.trim().to_string(),
        })
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the pointer. Readers see the old token or the new one, never a mix.
    pub(super) fn save(&self, slot: Slot) -> Result<(), SlotError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(SlotError::io("create", dir))?;
        }

        let tmp = self.temp_path();
        let written = std::fs::File::create(&tmp).and_then(|mut file| {
            writeln!(file, "{slot}")?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(SlotError::io("write", &tmp)(e));
        }

        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            SlotError::io("replace", &self.path)(e)
        })?;
        tracing::info!("active slot is now {}", slot);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "slot".to_string());
        self.path
            .with_file_name(format!(".{}.tmp.{}", name, std::process::id()))
    }
}
