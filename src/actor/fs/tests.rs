use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::debouncer::{DEBOUNCE, Debouncer};
use super::types::ChangeKind;
use super::{FsActor, PathFilter, is_temp_file};
use crate::actor::messages::CoordinatorMsg;
use crate::utils::path::normalize_path;

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new();
    assert!(!debouncer.is_ready());
    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.sleep_duration() > DEBOUNCE);
}

#[test]
fn test_debouncer_waits_for_quiet_period() {
    let mut debouncer = Debouncer::new();
    debouncer.add(PathBuf::from("/p/api.json"), ChangeKind::Modified);
    assert!(!debouncer.is_ready());
    assert!(debouncer.sleep_duration() <= DEBOUNCE);

    std::thread::sleep(DEBOUNCE + Duration::from_millis(20));
    assert_eq!(
        debouncer.take_if_ready(),
        Some(vec![PathBuf::from("/p/api.json")])
    );
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_debouncer_dedups_and_sorts() {
    let mut debouncer = Debouncer::new();
    debouncer.add(PathBuf::from("/p/b.json"), ChangeKind::Modified);
    debouncer.add(PathBuf::from("/p/a.json"), ChangeKind::Modified);
    debouncer.add(PathBuf::from("/p/b.json"), ChangeKind::Modified);

    std::thread::sleep(DEBOUNCE + Duration::from_millis(20));
    assert_eq!(
        debouncer.take_if_ready(),
        Some(vec![PathBuf::from("/p/a.json"), PathBuf::from("/p/b.json")])
    );
}

#[test]
fn test_debouncer_created_then_removed_cancels() {
    let mut debouncer = Debouncer::new();
    debouncer.add(PathBuf::from("/p/new.json"), ChangeKind::Created);
    debouncer.add(PathBuf::from("/p/new.json"), ChangeKind::Removed);
    assert!(debouncer.changes.is_empty());

    std::thread::sleep(DEBOUNCE + Duration::from_millis(20));
    assert!(debouncer.take_if_ready().is_none());
    // Timer reset, back to idle
    assert!(debouncer.sleep_duration() > DEBOUNCE);
}

#[test]
fn test_debouncer_modified_then_removed() {
    let mut debouncer = Debouncer::new();
    debouncer.add(PathBuf::from("/p/api.json"), ChangeKind::Modified);
    debouncer.add(PathBuf::from("/p/api.json"), ChangeKind::Removed);
    assert_eq!(
        debouncer.changes.get(Path::new("/p/api.json")),
        Some(&ChangeKind::Removed)
    );
}

#[test]
fn test_change_kind_mapping() {
    assert_eq!(
        ChangeKind::from_event(&modify_kind()),
        Some(ChangeKind::Modified)
    );
    assert_eq!(ChangeKind::from_event(&metadata_kind()), None);
    assert_eq!(
        ChangeKind::from_event(&notify::EventKind::Remove(
            notify::event::RemoveKind::File
        )),
        Some(ChangeKind::Removed)
    );
    assert_eq!(
        ChangeKind::from_event(&notify::EventKind::Access(
            notify::event::AccessKind::Any
        )),
        None
    );
}

#[test]
fn test_temp_files() {
    assert!(is_temp_file(Path::new("/p/.api.json.swp")));
    assert!(is_temp_file(Path::new("/p/api.json~")));
    assert!(is_temp_file(Path::new("/p/#api.json#")));
    assert!(is_temp_file(Path::new("/p/api.tmp")));
    assert!(!is_temp_file(Path::new("/p/api.json")));
}

#[test]
fn test_path_filter() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let viewer = root.join("viewer");
    std::fs::create_dir_all(&viewer).unwrap();

    let filter = PathFilter::new(vec![viewer.clone()]);
    assert!(filter.is_ignored(&viewer.join("index.html")));
    assert!(filter.is_ignored(&root.join("node_modules/x/index.js")));
    assert!(filter.is_ignored(&root.join(".git/HEAD")));
    assert!(!filter.is_ignored(&root.join("api.json")));
    assert!(!filter.is_ignored(&root.join("types/user.json")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_actor_reports_file_change() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let api = root.join("api.json");
    std::fs::write(&api, "{}").unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let actor = FsActor::new(&[root.clone()], vec![], tx).unwrap();
    let handle = tokio::spawn(actor.run());

    // Let the backend settle before writing
    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(&api, r#"{"title": "changed"}"#).unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match msg {
        CoordinatorMsg::Changed(paths) => assert!(paths.contains(&api)),
        other => panic!("unexpected message: {other:?}"),
    }

    drop(rx);
    handle.abort();
}
