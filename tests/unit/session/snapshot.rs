use super::*;

const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
    <rect x="0" y="0" width="10" height="10" fill="#ffffff"/>
</svg>"##;

struct Tree {
    _dir: tempfile::TempDir,
    animations: PathBuf,
    assets: PathBuf,
}

fn tree() -> Tree {
    let dir = tempfile::tempdir().unwrap();
    let animations = dir.path().join("animations");
    let assets = dir.path().join("assets");
    std::fs::create_dir_all(&animations).unwrap();
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("square.svg"), SQUARE_SVG).unwrap();
    Tree {
        _dir: dir,
        animations,
        assets,
    }
}

fn layer_json(objects: usize, asset: &str) -> String {
    let obj = format!(
        r#"{{"assets": ["{asset}"], "keyframer": [{{"time": 0}}, {{"time": 4}}]}}"#
    );
    format!(r#"{{"objects": [{}]}}"#, vec![obj; objects].join(","))
}

#[test]
fn load_dir_publishes_every_json_file_in_path_order() {
    let t = tree();
    std::fs::write(t.animations.join("b.json"), layer_json(2, "square.svg")).unwrap();
    std::fs::write(t.animations.join("a.json"), layer_json(1, "square.svg")).unwrap();
    std::fs::write(t.animations.join("notes.txt"), "not a layer").unwrap();

    let cache = AssetCache::new(&t.assets);
    let store = LayerStore::new(&t.assets);
    let snap = store.load_dir(&t.animations, &cache).unwrap();

    let names: Vec<String> = snap.layers().iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(snap.object_count(), 3);
    assert_eq!(snap.end_time(), 4.0);
    assert!(cache.contains(crate::assets::AssetKind::Vector, "square.svg"));
}

#[test]
fn failed_reload_keeps_the_previous_layer() {
    let t = tree();
    let file = t.animations.join("main.json");
    std::fs::write(&file, layer_json(1, "square.svg")).unwrap();
    let cache = AssetCache::new(&t.assets);
    let store = LayerStore::new(&t.assets);
    store.load_dir(&t.animations, &cache).unwrap();
    let before = store.get(&file).unwrap();

    std::fs::write(&file, "{ \"objects\": [").unwrap();
    let outcome = store.apply_change(&file, &cache);
    let ReloadOutcome::Rejected(err) = outcome else {
        panic!("expected a rejected reload, got {outcome:?}");
    };
    assert!(err.is_config());
    assert!(Arc::ptr_eq(&before, &store.get(&file).unwrap()));

    std::fs::write(&file, layer_json(1, "missing.svg")).unwrap();
    let outcome = store.apply_change(&file, &cache);
    assert!(matches!(
        outcome,
        ReloadOutcome::Rejected(ref e) if matches!(**e, LayerplayError::Asset { .. })
    ));
    assert_eq!(store.snapshot().object_count(), 1);
    assert!(Arc::ptr_eq(&before, &store.snapshot().layers()[0]));
}

#[test]
fn successful_reload_replaces_the_layer_and_its_assets() {
    let t = tree();
    let file = t.animations.join("main.json");
    std::fs::write(&file, layer_json(1, "square.svg")).unwrap();
    let cache = AssetCache::new(&t.assets);
    let store = LayerStore::new(&t.assets);
    let old = store.load_dir(&t.animations, &cache).unwrap();
    assert_eq!(cache.vector("square.svg").unwrap().width, 20.0);

    std::fs::write(
        t.assets.join("square.svg"),
        SQUARE_SVG.replace("width=\"20\"", "width=\"40\""),
    )
    .unwrap();
    std::fs::write(&file, layer_json(3, "square.svg")).unwrap();
    assert!(matches!(
        store.apply_change(&file, &cache),
        ReloadOutcome::Published(ref l) if l.objects.len() == 3
    ));
    assert_eq!(cache.vector("square.svg").unwrap().width, 40.0);
    assert_eq!(store.snapshot().object_count(), 3);
    // Snapshots already handed out are unaffected.
    assert_eq!(old.object_count(), 1);
}

#[test]
fn removed_files_drop_their_layer() {
    let t = tree();
    let file = t.animations.join("main.json");
    std::fs::write(&file, layer_json(1, "square.svg")).unwrap();
    let cache = AssetCache::new(&t.assets);
    let store = LayerStore::new(&t.assets);
    store.load_dir(&t.animations, &cache).unwrap();

    assert!(matches!(store.remove(&file, &cache), ReloadOutcome::Removed));
    assert!(store.snapshot().is_empty());
    assert!(store.get(&file).is_none());
    assert!(cache.is_empty());
}

#[test]
fn initial_load_fails_on_a_bad_layer() {
    let t = tree();
    std::fs::write(t.animations.join("main.json"), r#"{"objects": [{"prototype": "nope"}]}"#)
        .unwrap();
    let store = LayerStore::new(&t.assets);
    let err = store
        .load_dir(&t.animations, &AssetCache::new(&t.assets))
        .unwrap_err();
    assert!(err.to_string().contains("nope"), "{err}");
}

#[test]
fn layer_files_are_json_only() {
    assert!(is_layer_file(Path::new("a/b.json")));
    assert!(is_layer_file(Path::new("a/B.JSON")));
    assert!(!is_layer_file(Path::new("a/b.json.swp")));
    assert!(!is_layer_file(Path::new("a/json")));
}
