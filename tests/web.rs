// Browser tests, run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use contrastive_goat::embed::web::message_payload;
use contrastive_goat::events::{EventLog, LocalStorage, STORAGE_KEY};
use contrastive_goat::offline::worker;
use contrastive_goat::particles::ParticleOptions;
use contrastive_goat::particles::canvas::ParticleField;
use serde_json::Value;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn particle_field_mounts_and_runs() {
    let doc = web_sys::window().unwrap().document().unwrap();
    let field = ParticleField::mount(&doc, ParticleOptions::background("#9cd3ff"))
        .unwrap()
        .expect("headless browsers provide a 2d context");
    assert_eq!(field.len(), 30);
    field.start();
    field.start();
    assert!(field.is_running());
    field.add_burst(10.0, 10.0);
    assert_eq!(field.len(), 31);
    field.stop();
    assert!(!field.is_running());
    field.destroy();
    assert!(doc.get_element_by_id("cg-particles").is_some());
}

#[wasm_bindgen_test]
fn events_persist_to_local_storage() {
    let storage = web_sys::window().unwrap().local_storage().unwrap().unwrap();
    storage.remove_item(STORAGE_KEY).unwrap();
    let mut log = EventLog::open(LocalStorage::open().unwrap());
    log.track("view_home", Value::Null, 1.0);
    let saved = storage.get_item(STORAGE_KEY).unwrap().unwrap();
    assert!(saved.contains("view_home"));
    let reopened = EventLog::open(LocalStorage::open().unwrap());
    assert_eq!(reopened.events().len(), 1);
}

#[wasm_bindgen_test]
fn manifest_is_exported() {
    let v: Value = serde_json::from_str(&contrastive_goat::precache_manifest()).unwrap();
    assert_eq!(v["cache"], "autogoat-v2");
}

#[wasm_bindgen_test]
fn unserializable_messages_are_dropped() {
    assert_eq!(message_payload(&JsValue::UNDEFINED), None);
    let func = js_sys::Function::new_no_args("return 1");
    assert_eq!(message_payload(&func), None);
    let parsed = js_sys::JSON::parse(r#"{"type": "toggleMute"}"#).unwrap();
    assert_eq!(message_payload(&parsed).unwrap()["type"], "toggleMute");
}

#[wasm_bindgen_test]
async fn worker_exports_refuse_to_run_in_a_page() {
    assert!(worker::sw_install().await.is_err());
    assert!(worker::sw_activate().await.is_err());
}

#[wasm_bindgen_test]
fn registration_is_fire_and_forget() {
    worker::register(&web_sys::window().unwrap(), "");
}
