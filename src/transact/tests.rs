use super::*;
use crate::inspect::{Corruption, InstallationState, Inspector};
use crate::testutil::{write, Fixture, ORIGINAL};

const ASSEMBLY: &str = "140_Data/Managed/Assembly-CSharp.dll";
const TIMER: &str = "140_Data/Managed/SpeedrunTimer.dll";

#[test]
fn test_apply_places_files_and_backs_up_originals() {
    let fx = Fixture::new("1.2.0");
    let payload = fx.payload();
    let tx = FileTransactor::new(fx.dir());

    let manifest = tx.apply(&payload, &[]).unwrap();

    assert_eq!(fx.read(ASSEMBLY).as_deref(), Some("patched assembly"));
    assert_eq!(fx.read(TIMER).as_deref(), Some("timer"));
    let state = StateDir::new(fx.dir());
    assert_eq!(std::fs::read_to_string(state.backup_of(ASSEMBLY)).unwrap(), ORIGINAL);
    assert!(!state.pending().exists());
    assert!(state.work_dirs().is_empty());

    let flags: Vec<(&str, bool)> = manifest
        .entries
        .iter()
        .map(|e| (e.relative_path.as_str(), e.is_backup_of_original))
        .collect();
    assert_eq!(flags, [(ASSEMBLY, true), (TIMER, false)]);
    assert_eq!(manifest::read(&state.manifest()).unwrap(), Some(manifest));
}

#[test]
fn test_apply_then_revert_restores_directory() {
    let fx = Fixture::new("1.2.0");
    let before = fx.snapshot();
    let payload = fx.payload();
    let tx = FileTransactor::new(fx.dir());

    let manifest = tx.apply(&payload, &[]).unwrap();
    tx.revert(&manifest.entries).unwrap();

    assert_eq!(fx.snapshot(), before);
    assert!(!fx.dir().join(crate::manifest::STATE_DIR).exists());
}

#[test]
fn test_crash_before_commit_is_never_installed() {
    let fx = Fixture::new("1.2.0");
    let before = fx.snapshot();
    let payload = fx.payload();
    let tx = FileTransactor::new(fx.dir());

    let mut prepared = tx.prepare(&payload, &[]).unwrap();
    prepared.swap_in().unwrap();
    drop(prepared);

    let inspector = Inspector::new(&payload);
    assert_eq!(
        inspector.inspect(fx.dir()),
        InstallationState::Corrupted(Corruption::Interrupted)
    );

    // The intent record is enough to undo the half-finished install.
    tx.revert(&inspector.owned_entries(fx.dir())).unwrap();
    assert_eq!(fx.snapshot(), before);
    assert_eq!(inspector.inspect(fx.dir()), InstallationState::Absent);
}

#[test]
fn test_crash_after_staging_leaves_game_untouched() {
    let fx = Fixture::new("1.2.0");
    let payload = fx.payload();
    let tx = FileTransactor::new(fx.dir());

    drop(tx.prepare(&payload, &[]).unwrap());

    assert_eq!(fx.read(ASSEMBLY).as_deref(), Some(ORIGINAL));
    assert_eq!(Inspector::new(&payload).inspect(fx.dir()), InstallationState::Absent);

    // The next transaction sweeps the abandoned work directory.
    tx.apply(&payload, &[]).unwrap();
    assert!(StateDir::new(fx.dir()).work_dirs().is_empty());
}

#[test]
fn test_failure_mid_swap_rolls_back() {
    let fx = Fixture::new("1.2.0");
    fx.set_payload(
        "1.2.0",
        &[
            (ASSEMBLY, "patched assembly"),
            (TIMER, "timer"),
            ("blocker/extra.dll", "extra"),
        ],
    );
    // A plain file where the payload needs a directory.
    write(&fx.file("blocker"), "not a directory");
    let before = fx.snapshot();
    let payload = fx.payload();
    let tx = FileTransactor::new(fx.dir());

    let err = tx.apply(&payload, &[]).unwrap_err();

    assert!(matches!(err, TransactError::Io { .. }), "{err}");
    assert_eq!(fx.snapshot(), before);
    let state = StateDir::new(fx.dir());
    assert!(!state.manifest().exists());
    assert!(!state.pending().exists());
    assert_eq!(Inspector::new(&payload).inspect(fx.dir()), InstallationState::Absent);
}

#[test]
fn test_changed_payload_source_fails_before_touching_game() {
    let fx = Fixture::new("1.2.0");
    let before = fx.snapshot();
    let payload = fx.payload();
    write(
        &fx.payload_dir.path().join("files").join(TIMER),
        "tampered",
    );

    let err = FileTransactor::new(fx.dir()).apply(&payload, &[]).unwrap_err();

    assert!(matches!(err, TransactError::HashMismatch { .. }));
    assert_eq!(fx.snapshot(), before);
}

#[test]
fn test_revert_tolerates_missing_files() {
    let fx = Fixture::new("1.2.0");
    let payload = fx.payload();
    let tx = FileTransactor::new(fx.dir());
    let manifest = tx.apply(&payload, &[]).unwrap();

    std::fs::remove_file(fx.file(TIMER)).unwrap();
    tx.revert(&manifest.entries).unwrap();

    assert_eq!(fx.read(ASSEMBLY).as_deref(), Some(ORIGINAL));
    assert!(!fx.file(TIMER).exists());
    assert_eq!(Inspector::new(&payload).inspect(fx.dir()), InstallationState::Absent);
}

#[test]
fn test_revert_is_safe_to_repeat_after_partial_revert() {
    let fx = Fixture::new("1.2.0");
    let payload = fx.payload();
    let tx = FileTransactor::new(fx.dir());
    let manifest = tx.apply(&payload, &[]).unwrap();

    // Simulate a revert that restored the original and died before the commit.
    let state = StateDir::new(fx.dir());
    std::fs::rename(state.backup_of(ASSEMBLY), fx.file(ASSEMBLY)).unwrap();

    tx.revert(&manifest.entries).unwrap();
    assert_eq!(fx.read(ASSEMBLY).as_deref(), Some(ORIGINAL));
    assert!(!fx.file(TIMER).exists());
}

#[test]
fn test_update_retires_files_no_longer_shipped() {
    let fx = Fixture::new("1.0.0");
    fx.set_payload(
        "1.0.0",
        &[(ASSEMBLY, "old patch"), (TIMER, "old timer"), ("140_Data/Managed/Legacy.dll", "legacy")],
    );
    let tx = FileTransactor::new(fx.dir());
    let old = tx.apply(&fx.payload(), &[]).unwrap();

    fx.set_payload("1.2.0", &[(ASSEMBLY, "patched assembly"), (TIMER, "timer")]);
    let payload = fx.payload();
    let new = tx.apply(&payload, &old.entries).unwrap();

    assert!(!fx.file("140_Data/Managed/Legacy.dll").exists());
    assert_eq!(new.version.as_str(), "1.2.0");
    assert_eq!(new.entries.len(), 2);
    // The original survives the update untouched in the backup area.
    let state = StateDir::new(fx.dir());
    assert_eq!(std::fs::read_to_string(state.backup_of(ASSEMBLY)).unwrap(), ORIGINAL);
    assert_eq!(
        Inspector::new(&payload).inspect(fx.dir()),
        InstallationState::Installed { version: "1.2.0".into() }
    );
}

#[test]
fn test_revert_prunes_directories_it_created() {
    let fx = Fixture::new("1.2.0");
    fx.set_payload("1.2.0", &[("Mods/Timer/timer.dll", "timer")]);
    let tx = FileTransactor::new(fx.dir());
    let manifest = tx.apply(&fx.payload(), &[]).unwrap();
    assert!(fx.file("Mods/Timer/timer.dll").exists());

    tx.revert(&manifest.entries).unwrap();
    assert!(!fx.file("Mods").exists());
}

#[test]
fn test_revert_never_restores_a_damaged_backup() {
    let fx = Fixture::new("1.2.0");
    let payload = fx.payload();
    let tx = FileTransactor::new(fx.dir());
    let manifest = tx.apply(&payload, &[]).unwrap();
    let state = StateDir::new(fx.dir());
    write(&state.backup_of(ASSEMBLY), "orig");

    tx.revert(&manifest.entries).unwrap();

    assert_eq!(fx.read(ASSEMBLY).as_deref(), Some("patched assembly"));
    assert!(!fx.file(TIMER).exists());
    assert!(!state.root().exists());
    assert_eq!(
        Inspector::new(&payload).inspect(fx.dir()),
        InstallationState::Corrupted(Corruption::Unrecorded(ASSEMBLY.into()))
    );
}

#[test]
fn test_apply_records_hash_of_displaced_original() {
    let fx = Fixture::new("1.2.0");
    let manifest = FileTransactor::new(fx.dir()).apply(&fx.payload(), &[]).unwrap();
    let hashes: Vec<Option<String>> = manifest.entries.into_iter().map(|e| e.original_hash).collect();
    assert_eq!(
        hashes,
        [Some(crate::hash::bytes_sha256(ORIGINAL.as_bytes())), None]
    );
}
