//! Local analytics log. Every interaction becomes `{event, props, ts}`;
//! the log lives in local storage and can be exported as JSON Lines.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::error::js_error_message;

/// Local-storage key holding the JSON array of events.
pub const STORAGE_KEY: &str = "autogoat_events";
/// Download name for exports.
pub const EXPORT_FILE_NAME: &str = "events.jsonl";
/// Oldest events are dropped beyond this.
pub const MAX_EVENTS: usize = 1000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub props: Value,
    pub ts: f64,
}

/// Where the serialized log is kept.
pub trait EventStore {
    fn load(&self) -> Option<String>;
    fn save(&self, json: &str) -> Result<(), String>;
}

impl<S: EventStore + ?Sized> EventStore for Box<S> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, json: &str) -> Result<(), String> {
        (**self).save(json)
    }
}

/// Browser local storage.
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    /// `None` when storage is disabled (private mode, sandboxed iframe).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

impl EventStore for LocalStorage {
    fn load(&self) -> Option<String> {
        self.storage.get_item(STORAGE_KEY).ok().flatten()
    }

    fn save(&self, json: &str) -> Result<(), String> {
        self.storage
            .set_item(STORAGE_KEY, json)
            .map_err(|e: JsValue| js_error_message(&e))
    }
}

/// In-memory store, used when local storage is unavailable.
#[derive(Default)]
pub struct MemoryStore {
    data: std::cell::RefCell<Option<String>>,
}

impl EventStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.data.borrow().clone()
    }

    fn save(&self, json: &str) -> Result<(), String> {
        *self.data.borrow_mut() = Some(json.to_string());
        Ok(())
    }
}

pub struct EventLog<S: EventStore> {
    store: S,
    events: Vec<Event>,
}

impl<S: EventStore> EventLog<S> {
    /// Loads whatever the store already holds; unreadable data starts a
    /// fresh log.
    pub fn open(store: S) -> Self {
        let events = store
            .load()
            .and_then(|json| match serde_json::from_str::<Vec<Event>>(&json) {
                Ok(events) => Some(events),
                Err(err) => {
                    tracing::warn!(%err, "discarding unreadable event log");
                    None
                }
            })
            .unwrap_or_default();
        Self { store, events }
    }

    pub fn track(&mut self, name: &str, props: Value, ts: f64) {
        self.events.push(Event {
            event: name.to_string(),
            props,
            ts,
        });
        if self.events.len() > MAX_EVENTS {
            let excess = self.events.len() - MAX_EVENTS;
            self.events.drain(..excess);
        }
        tracing::debug!(event = name, "tracked");
        self.persist();
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.events) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(%err, "failed to encode event log");
                return;
            }
        };
        if let Err(reason) = self.store.save(&json) {
            tracing::warn!(%reason, "failed to persist event log");
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// One JSON object per line.
    pub fn export_jsonl(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            if let Ok(line) = serde_json::to_string(event) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tracks_and_persists() {
        let mut log = EventLog::open(MemoryStore::default());
        log.track("goat_pick", json!({"which": "a", "expected": "b"}), 1.0);
        log.track("view_home", Value::Null, 2.0);
        let saved = log.store.load().unwrap();
        let reloaded: Vec<Event> = serde_json::from_str(&saved).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0].event, "goat_pick");
    }

    #[test]
    fn reopen_keeps_history() {
        let store = MemoryStore::default();
        store
            .save(r#"[{"event":"nav_goat","props":null,"ts":5.0}]"#)
            .unwrap();
        let mut log = EventLog::open(store);
        log.track("view_home", Value::Null, 6.0);
        assert_eq!(log.events().len(), 2);
    }

    #[test]
    fn garbage_starts_fresh() {
        let store = MemoryStore::default();
        store.save("not json").unwrap();
        let log = EventLog::open(store);
        assert!(log.events().is_empty());
    }

    #[test]
    fn export_is_one_object_per_line() {
        let mut log = EventLog::open(MemoryStore::default());
        log.track("a", json!({"x": 1}), 1.0);
        log.track("b", Value::Null, 2.0);
        let out = log.export_jsonl();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.props, json!({"x": 1}));
    }

    #[test]
    fn caps_history() {
        let mut log = EventLog::open(MemoryStore::default());
        for i in 0..MAX_EVENTS + 5 {
            log.track("tick", Value::Null, i as f64);
        }
        assert_eq!(log.events().len(), MAX_EVENTS);
        assert_eq!(log.events()[0].ts, 5.0);
    }
}
