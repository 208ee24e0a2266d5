// Integration tests (native) for the offline manifest, the event log and the
// content-lint walker. Lint tests build a scratch tree under the system temp
// dir.

use std::fs;
use std::path::PathBuf;

use contrastive_goat::events::{EventLog, EventStore, MemoryStore};
use contrastive_goat::lint::{AssetPolicy, LintPolicy, Violation, check_alts, lint_tree};
use contrastive_goat::offline::{CACHE_NAME, FALLBACK, Manifest, PRECACHE};
use serde_json::json;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("contrastive-goat-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn policy() -> AssetPolicy {
    LintPolicy::from_json(
        r#"{"assets": {"max_image_kb": 1, "max_audio_mb": 0.001, "require_alt_text": true}}"#,
        "test",
    )
    .unwrap()
    .assets
}

#[test]
fn walks_nested_directories() {
    let root = scratch("walk");
    fs::create_dir_all(root.join("img/deep")).unwrap();
    fs::write(root.join("img/small.png"), vec![0u8; 512]).unwrap();
    fs::write(root.join("img/deep/big.webp"), vec![0u8; 4096]).unwrap();
    fs::write(root.join("loop.ogg"), vec![0u8; 4096]).unwrap();
    fs::write(root.join("notes.txt"), vec![0u8; 1 << 20]).unwrap();

    let found = lint_tree(&policy(), &root).unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|v| matches!(v, Violation::ImageTooLarge { path, .. } if path.ends_with("big.webp"))));
    assert!(found.iter().any(|v| matches!(v, Violation::AudioTooLarge { path, .. } if path.ends_with("loop.ogg"))));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn missing_root_is_an_io_error() {
    let root = scratch("missing").join("nope");
    let err = lint_tree(&policy(), &root).unwrap_err();
    assert!(err.to_string().starts_with("failed to read"));
}

#[test]
fn shipped_feelings_have_alt_text() {
    let text = fs::read_to_string("data/feelings_items.json").unwrap();
    assert!(check_alts(&policy(), &text).is_empty());
}

#[test]
fn manifest_lists_precache_assets() {
    let m = Manifest::current();
    assert_eq!(m.cache, CACHE_NAME);
    assert_eq!(m.assets, PRECACHE);
    assert_eq!(m.fallback, FALLBACK);
    assert!(PRECACHE.contains(&FALLBACK));
}

#[test]
fn event_log_exports_jsonl() {
    let mut log = EventLog::open(MemoryStore::default());
    log.track("nav_goat", serde_json::Value::Null, 1.0);
    log.track("goat_pick", json!({"which": "a", "expected": "a"}), 2.0);
    let out = log.export_jsonl();
    let names: Vec<String> = out
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["event"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["nav_goat", "goat_pick"]);
}

#[test]
fn boxed_store_behaves_like_inner() {
    let store: Box<dyn EventStore> = Box::new(MemoryStore::default());
    let mut log = EventLog::open(store);
    log.track("view_home", serde_json::Value::Null, 3.0);
    assert_eq!(log.events().len(), 1);
}
