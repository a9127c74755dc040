use super::*;

#[test]
fn scanner_reports_creation_modification_and_removal() {
    let dir = tempfile::tempdir().unwrap();
    let keep = dir.path().join("keep.json");
    std::fs::write(&keep, "{}").unwrap();
    let mut scanner = DirScanner::new(dir.path()).unwrap();
    assert!(scanner.scan().unwrap().is_empty());

    let added = dir.path().join("added.json");
    std::fs::write(&added, "{}").unwrap();
    std::fs::write(dir.path().join("ignored.txt"), "x").unwrap();
    assert_eq!(scanner.scan().unwrap(), vec![ReloadEvent::Changed(added.clone())]);

    // Length changes are detected even when the mtime granularity is coarse.
    std::fs::write(&keep, r#"{"objects": []}"#).unwrap();
    assert_eq!(scanner.scan().unwrap(), vec![ReloadEvent::Changed(keep.clone())]);

    std::fs::remove_file(&added).unwrap();
    assert_eq!(scanner.scan().unwrap(), vec![ReloadEvent::Removed(added)]);
    assert!(scanner.scan().unwrap().is_empty());
}

#[test]
fn events_are_path_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let mut scanner = DirScanner::new(dir.path()).unwrap();
    std::fs::write(dir.path().join("b.json"), "{}").unwrap();
    std::fs::write(dir.path().join("a.json"), "{}").unwrap();
    let paths: Vec<PathBuf> = scanner
        .scan()
        .unwrap()
        .iter()
        .map(|e| e.path().to_path_buf())
        .collect();
    assert_eq!(paths, vec![dir.path().join("a.json"), dir.path().join("b.json")]);
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(DirScanner::new(dir.path().join("nope")).is_err());
}

#[test]
fn watcher_thread_delivers_events() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = LayerWatcher::spawn(dir.path(), Duration::from_millis(10)).unwrap();
    let file = dir.path().join("layer.json");
    std::fs::write(&file, "{}").unwrap();

    let event = watcher
        .events()
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    assert_eq!(event, ReloadEvent::Changed(file));
    drop(watcher);
}
