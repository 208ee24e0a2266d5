//! postMessage bridge to a parent page when the app runs inside an iframe.
//!
//! Outbound: `{source: "contrastive-goat", type, data}`. Inbound: `{type,
//! data}` dispatched to the handler registered for `type`, but only from
//! allowed origins.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::EmbedError;

pub mod web;

/// Value of `source` on every outbound message.
pub const SOURCE: &str = "contrastive-goat";

/// Origins allowed to talk to the embed by default.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://papersthatdream.com",
    "https://thebearwithabite.github.io",
    "http://localhost:5173",
    "http://localhost:4173",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Ready,
    Interaction,
    Navigation,
    State,
    Fullscreen,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub source: &'static str,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub data: Value,
}

/// What the parent sends us. `type` is free-form; unknown ones are dropped.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// Which origins may send inbound messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OriginPolicy {
    AllowList(Vec<String>),
    /// Local development only.
    AllowAny,
}

impl Default for OriginPolicy {
    fn default() -> Self {
        OriginPolicy::AllowList(DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect())
    }
}

impl OriginPolicy {
    /// The allow-list, unless built with the `dev-origins` feature.
    pub fn for_build() -> Self {
        if cfg!(feature = "dev-origins") {
            OriginPolicy::AllowAny
        } else {
            OriginPolicy::default()
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            OriginPolicy::AllowAny => true,
            OriginPolicy::AllowList(list) => list.iter().any(|o| o == origin),
        }
    }
}

/// URL flags the host page can set on the iframe src.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmbedMode {
    pub minimal: bool,
    pub no_audio: bool,
    pub auto_start: bool,
}

impl EmbedMode {
    /// Parses `?minimal=true&noAudio=true&autoStart=true`. Only the literal
    /// `true` switches a flag on.
    pub fn from_query(query: &str) -> Self {
        let mut mode = Self::default();
        for (key, value) in query_pairs(query) {
            let on = value == "true";
            match key {
                "minimal" => mode.minimal = on,
                "noAudio" => mode.no_audio = on,
                "autoStart" => mode.auto_start = on,
                _ => {}
            }
        }
        mode
    }
}

/// `key=value` pairs of a query string, with or without the leading `?`.
pub(crate) fn query_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| part.split_once('=').unwrap_or((part, "")))
}

/// Where outbound messages go and what time it is there.
pub trait Transport {
    fn is_embedded(&self) -> bool;
    fn post(&self, message: &OutboundMessage) -> Result<(), EmbedError>;
    /// Milliseconds since the epoch.
    fn now_ms(&self) -> f64;
}

/// What became of an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// Well-formed but nobody registered for its type.
    Ignored,
    /// Not shaped like `{type, data}`.
    Malformed,
    Rejected,
}

pub type Handler = Rc<dyn Fn(&Value)>;

pub struct EmbedBridge<T: Transport> {
    transport: T,
    policy: OriginPolicy,
    handlers: HashMap<String, Handler>,
}

impl<T: Transport> EmbedBridge<T> {
    pub fn new(transport: T, policy: OriginPolicy) -> Self {
        Self {
            transport,
            policy,
            handlers: HashMap::new(),
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.transport.is_embedded()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Registers the handler for inbound `kind`, replacing any previous one.
    pub fn on<F>(&mut self, kind: &str, handler: F)
    where
        F: Fn(&Value) + 'static,
    {
        self.handlers.insert(kind.to_string(), Rc::new(handler));
    }

    /// Checks origin and shape and looks up the handler, without running it.
    /// Lets callers release their borrow of the bridge before the handler
    /// runs, since handlers commonly send messages themselves.
    pub fn resolve(&self, origin: &str, payload: &Value) -> Result<(Handler, Value), Dispatch> {
        if !self.policy.allows(origin) {
            tracing::warn!(origin, "rejected message from unauthorized origin");
            return Err(Dispatch::Rejected);
        }
        let Ok(msg) = InboundMessage::deserialize(payload) else {
            return Err(Dispatch::Malformed);
        };
        match self.handlers.get(&msg.kind) {
            Some(handler) => Ok((handler.clone(), msg.data)),
            None => {
                tracing::debug!(kind = %msg.kind, "no handler for embed message");
                Err(Dispatch::Ignored)
            }
        }
    }

    pub fn handle_message(&self, origin: &str, payload: &Value) -> Dispatch {
        match self.resolve(origin, payload) {
            Ok((handler, data)) => {
                handler(&data);
                Dispatch::Handled
            }
            Err(outcome) => outcome,
        }
    }

    /// Posts to the parent. A no-op outside an iframe.
    pub fn send(&self, kind: MessageKind, data: Value) {
        if !self.transport.is_embedded() {
            return;
        }
        let message = OutboundMessage {
            source: SOURCE,
            kind,
            data,
        };
        if let Err(err) = self.transport.post(&message) {
            tracing::warn!(%err, ?kind, "failed to post embed message");
        }
    }

    pub fn send_ready(&self, url: &str) {
        let ts = self.transport.now_ms();
        self.send(MessageKind::Ready, json!({ "timestamp": ts, "url": url }));
    }

    pub fn send_interaction(&self, action: &str, metadata: Value) {
        let ts = self.transport.now_ms();
        self.send(
            MessageKind::Interaction,
            json!({ "action": action, "metadata": metadata, "timestamp": ts }),
        );
    }

    pub fn send_navigation(&self, route: &str) {
        let ts = self.transport.now_ms();
        self.send(MessageKind::Navigation, json!({ "route": route, "timestamp": ts }));
    }

    /// Sends the given fields plus a timestamp.
    pub fn send_state(&self, state: Map<String, Value>) {
        let mut data = state;
        data.insert("timestamp".into(), json!(self.transport.now_ms()));
        self.send(MessageKind::State, Value::Object(data));
    }

    pub fn request_fullscreen(&self) {
        self.send(MessageKind::Fullscreen, json!({ "requested": true }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording {
        embedded: bool,
        sent: RefCell<Vec<Value>>,
    }

    impl Transport for Recording {
        fn is_embedded(&self) -> bool {
            self.embedded
        }
        fn post(&self, message: &OutboundMessage) -> Result<(), EmbedError> {
            let v = serde_json::to_value(message).map_err(|e| EmbedError::Encode(e.to_string()))?;
            self.sent.borrow_mut().push(v);
            Ok(())
        }
        fn now_ms(&self) -> f64 {
            42.0
        }
    }

    fn bridge(embedded: bool) -> EmbedBridge<Recording> {
        EmbedBridge::new(
            Recording {
                embedded,
                sent: RefCell::new(Vec::new()),
            },
            OriginPolicy::default(),
        )
    }

    #[test]
    fn outbound_shape() {
        let b = bridge(true);
        b.send_navigation("/goat");
        b.request_fullscreen();
        let sent = b.transport().sent.borrow();
        assert_eq!(
            sent[0],
            json!({"source": "contrastive-goat", "type": "navigation", "data": {"route": "/goat", "timestamp": 42.0}})
        );
        assert_eq!(sent[1]["type"], "fullscreen");
        assert_eq!(sent[1]["data"], json!({"requested": true}));
    }

    #[test]
    fn silent_when_not_embedded() {
        let b = bridge(false);
        b.send_ready("http://x/");
        assert!(b.transport().sent.borrow().is_empty());
    }

    #[test]
    fn state_merges_timestamp() {
        let b = bridge(true);
        let mut state = Map::new();
        state.insert("score".into(), json!(3));
        b.send_state(state);
        assert_eq!(b.transport().sent.borrow()[0]["data"], json!({"score": 3, "timestamp": 42.0}));
    }

    #[test]
    fn dispatches_by_type_from_allowed_origin() {
        let mut b = bridge(true);
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        b.on("setRoute", move |data| {
            *sink.borrow_mut() = Some(data.clone());
        });
        let msg = json!({"type": "setRoute", "data": {"route": "/predict"}});
        assert_eq!(b.handle_message("https://papersthatdream.com", &msg), Dispatch::Handled);
        assert_eq!(*seen.borrow(), Some(json!({"route": "/predict"})));
        assert_eq!(
            b.handle_message("https://papersthatdream.com", &json!({"type": "mystery"})),
            Dispatch::Ignored
        );
        assert_eq!(
            b.handle_message("https://papersthatdream.com", &json!("hello")),
            Dispatch::Malformed
        );
    }

    #[test]
    fn rejects_unknown_origin() {
        let mut b = bridge(true);
        b.on("ping", |_| panic!("must not run"));
        let msg = json!({"type": "ping"});
        assert_eq!(b.handle_message("https://evil.example", &msg), Dispatch::Rejected);
        assert!(OriginPolicy::AllowAny.allows("https://evil.example"));
    }

    #[test]
    fn release_builds_use_the_allow_list() {
        let policy = OriginPolicy::for_build();
        if cfg!(feature = "dev-origins") {
            assert_eq!(policy, OriginPolicy::AllowAny);
        } else {
            assert_eq!(policy, OriginPolicy::default());
            assert!(!policy.allows("https://evil.example"));
        }
    }

    #[test]
    fn embed_mode_flags() {
        let mode = EmbedMode::from_query("?minimal=true&noAudio=1&autoStart=true&x");
        assert_eq!(
            mode,
            EmbedMode {
                minimal: true,
                no_audio: false,
                auto_start: true
            }
        );
        assert_eq!(EmbedMode::from_query(""), EmbedMode::default());
    }
}
