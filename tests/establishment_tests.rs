//! Establishment scoping over file-backed storage: selections must survive
//! process restarts (the dashboard-reload analogue) and always re-validate
//! against the memberships of the moment.

use anyhow::Result;
use tempfile::tempdir;

use boostpay::config::ESTABLISHMENT_STORAGE_KEY;
use boostpay::session::{EstablishmentMembership, EstablishmentSelector};
use boostpay::storage::{FileStore, KeyValueStore};

fn memberships(ids: &[i64]) -> Vec<EstablishmentMembership> {
    ids.iter()
        .map(|&id| EstablishmentMembership { id, role: "admin".into() })
        .collect()
}

#[test]
fn selection_survives_reload() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("dashboard.json");
    let ms = memberships(&[7, 12, 31]);

    {
        let selector = EstablishmentSelector::new(FileStore::shared(&path));
        assert_eq!(selector.init(&ms), Some(7));
        assert!(selector.switch(31, &ms));
    }

    // Fresh store over the same file, as after a page reload.
    let selector = EstablishmentSelector::new(FileStore::shared(&path));
    assert_eq!(selector.current(&ms), Some(31));
    Ok(())
}

#[test]
fn reload_with_shrunk_memberships_replaces_selection() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("dashboard.json");

    {
        let selector = EstablishmentSelector::new(FileStore::shared(&path));
        assert!(selector.switch(31, &memberships(&[7, 31])));
    }

    // The user lost access to 31 between sessions.
    let store = FileStore::shared(&path);
    let selector = EstablishmentSelector::new(store.clone());
    assert_eq!(selector.current(&memberships(&[7])), Some(7));
    assert_eq!(store.get(ESTABLISHMENT_STORAGE_KEY).as_deref(), Some("7"));
    Ok(())
}

#[test]
fn switch_rejection_does_not_touch_the_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("dashboard.json");
    let store = FileStore::shared(&path);
    let selector = EstablishmentSelector::new(store.clone());

    let ms = memberships(&[7]);
    assert_eq!(selector.init(&ms), Some(7));
    assert!(!selector.switch(99, &ms));
    assert_eq!(store.get(ESTABLISHMENT_STORAGE_KEY).as_deref(), Some("7"));
    Ok(())
}

#[test]
fn membership_order_decides_auto_selection() -> Result<()> {
    let dir = tempdir()?;
    let selector = EstablishmentSelector::new(FileStore::shared(dir.path().join("kv.json")));

    // Payload order is authoritative; ids are deliberately not sorted.
    assert_eq!(selector.init(&memberships(&[42, 3, 17])), Some(42));
    Ok(())
}
