// ABOUTME: Integration tests for the active-slot pointer and pre-swap backups.
// ABOUTME: Exercises crash safety through the public SlotManager API.

use chrono::Utc;
use hubstack::slot::{BackupInfo, BackupSpec, SlotError, SlotManager, SlotStore};
use hubstack::types::Slot;
use std::path::Path;

fn spec(root: &Path) -> BackupSpec {
    BackupSpec {
        root: root.to_path_buf(),
        include: vec![root.join("config"), root.join(".secrets"), root.join(".active_slot")],
        exclude: vec![root.join("data")],
        dest_dir: root.join("backups"),
    }
}

fn open(root: &Path) -> Result<SlotManager, SlotError> {
    SlotManager::open(SlotStore::new(root.join(".active_slot")), spec(root), "dhi")
}

#[test]
fn first_run_defaults_to_slot_a() {
    let tmp = tempfile::tempdir().unwrap();
    let mgr = open(tmp.path()).unwrap();
    assert_eq!(mgr.active(), Slot::A);
    assert_eq!(mgr.inactive(), Slot::B);
    assert!(!SlotStore::new(tmp.path().join(".active_slot")).exists());
}

#[test]
fn corrupt_pointer_is_an_error_naming_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join(".active_slot"), "green\n").unwrap();

    let err = open(tmp.path()).unwrap_err();
    assert!(matches!(err, SlotError::Corrupt { .. }));
    assert!(err.to_string().contains(".active_slot"));
}

#[test]
fn unfinished_swap_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join(".active_slot"), "b\n").unwrap();
    std::fs::create_dir_all(tmp.path().join("config")).unwrap();

    let mgr = open(tmp.path()).unwrap();
    let pending = mgr.swap_slots(Utc::now()).unwrap();
    assert_eq!(pending.target(), Slot::A);
    drop(pending);
    drop(mgr);

    assert_eq!(open(tmp.path()).unwrap().active(), Slot::B);
}

#[test]
fn finished_swap_is_durable_and_backed_up() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("config")).unwrap();
    std::fs::write(tmp.path().join("config/app.yml"), "x: 1").unwrap();
    std::fs::write(tmp.path().join(".secrets"), "DESEC_TOKEN=abc").unwrap();

    let mut mgr = open(tmp.path()).unwrap();
    let pending = mgr.swap_slots(Utc::now()).unwrap();
    let archive = pending.backup().to_path_buf();
    mgr.finalize_swap(pending).unwrap();

    assert_eq!(open(tmp.path()).unwrap().active(), Slot::B);
    assert!(archive.is_file());
    let info: BackupInfo = serde_json::from_str(
        &std::fs::read_to_string(BackupInfo::sidecar_path(&archive)).unwrap(),
    )
    .unwrap();
    assert_eq!(info.active, Slot::A);
    assert!(info.entries.iter().any(|e| e == ".secrets"));
}
