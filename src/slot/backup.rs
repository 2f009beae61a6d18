// ABOUTME: Pre-swap safety backup: config and secrets packed into a gzip tarball.
// ABOUTME: Bulk data and source trees are excluded; a JSON sidecar records who made it.

use super::SlotError;
use crate::types::Slot;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// What goes into a pre-swap backup and where it lands.
#[derive(Debug, Clone)]
pub struct BackupSpec {
    /// Archive paths are stored relative to this directory.
    pub root: PathBuf,
    pub include: Vec<PathBuf>,
    /// Skipped even when nested inside an included directory.
    pub exclude: Vec<PathBuf>,
    pub dest_dir: PathBuf,
}

/// Sidecar describing a backup archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    /// Hostname of the machine that made the backup.
    pub host: String,
    pub pid: u32,
    pub created_at: DateTime<Utc>,
    /// Active slot when the backup was taken.
    pub active: Slot,
    pub target: Slot,
    /// Archive entries, relative to the root.
    pub entries: Vec<String>,
}

impl BackupInfo {
    fn new(active: Slot, target: Slot, created_at: DateTime<Utc>, entries: Vec<String>) -> Self {
        Self {
            host: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            created_at,
            active,
            target,
            entries,
        }
    }

    /// Path of the sidecar for `archive`.
    pub fn sidecar_path(archive: &Path) -> PathBuf {
        let mut name = archive.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }
}

/// Write `pre-swap-<active>-<timestamp>.tar.gz` plus its sidecar. Returns the archive path.
pub fn create_backup(
    spec: &BackupSpec,
    active: Slot,
    target: Slot,
    now: DateTime<Utc>,
) -> Result<PathBuf, SlotError> {
    std::fs::create_dir_all(&spec.dest_dir).map_err(SlotError::io("create", &spec.dest_dir))?;

    let archive = spec.dest_dir.join(format!(
        "pre-swap-{}-{}.tar.gz",
        active,
        now.format("%Y%m%d-%H%M%S")
    ));
    let partial = archive.with_extension("partial");
    let failed = |reason: String| SlotError::Backup {
        path: archive.clone(),
        reason,
    };

    let entries = match write_archive(spec, &partial) {
        Ok(entries) => entries,
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            return Err(failed(e.to_string()));
        }
    };
    std::fs::rename(&partial, &archive).map_err(|e| failed(e.to_string()))?;

    let info = BackupInfo::new(active, target, now, entries);
    let json = serde_json::to_string_pretty(&info).map_err(|e| failed(e.to_string()))?;
    let sidecar = BackupInfo::sidecar_path(&archive);
    std::fs::write(&sidecar, json).map_err(SlotError::io("write", &sidecar))?;

    tracing::info!(
        entries = info.entries.len(),
        "pre-swap backup written to {}",
        archive.display()
    );
    Ok(archive)
}

fn write_archive(spec: &BackupSpec, path: &Path) -> std::io::Result<Vec<String>> {
    let file = File::create(path)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);

    let mut entries = Vec::new();
    for include in &spec.include {
        append_tree(&mut builder, spec, include, &mut entries)?;
    }

    builder.into_inner()?.finish()?.sync_all()?;
    Ok(entries)
}

fn append_tree<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    spec: &BackupSpec,
    path: &Path,
    entries: &mut Vec<String>,
) -> std::io::Result<()> {
    if spec.exclude.iter().any(|ex| path.starts_with(ex)) {
        tracing::debug!("backup skips {}", path.display());
        return Ok(());
    }
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let name = path
        .strip_prefix(&spec.root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default());

    if metadata.is_dir() {
        builder.append_dir(&name, path)?;
        entries.push(format!("{}/", name.display()));
        let mut children: Vec<PathBuf> = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        children.sort();
        for child in children {
            append_tree(builder, spec, &child, entries)?;
        }
    } else {
        builder.append_path_with_name(path, &name)?;
        entries.push(name.display().to_string());
    }
    Ok(())
}
