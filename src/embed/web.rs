//! Window-level `Transport`: posts to `window.parent` and listens for
//! `message` events.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, Window, window};

use super::{EmbedBridge, EmbedMode, OriginPolicy, OutboundMessage, Transport};
use crate::error::{AppError, EmbedError, js_error_message};

/// Posts to the parent window with target origin `*`; inbound origins are
/// what the bridge checks.
pub struct ParentWindow {
    window: Window,
    embedded: bool,
}

impl ParentWindow {
    pub fn new(window: Window) -> Self {
        let embedded = detect_embed(&window);
        Self { window, embedded }
    }
}

/// True when we are not the top-level browsing context. A cross-origin
/// `top` that cannot be read also counts as embedded.
pub fn detect_embed(win: &Window) -> bool {
    match win.top() {
        Ok(Some(top)) => top != win.self_(),
        Ok(None) => false,
        Err(_) => true,
    }
}

/// JSON view of a posted value. `None` for anything `JSON.stringify` cannot
/// express, such as `undefined` or a function.
pub fn message_payload(data: &JsValue) -> Option<serde_json::Value> {
    let text = js_sys::JSON::stringify(data).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

impl Transport for ParentWindow {
    fn is_embedded(&self) -> bool {
        self.embedded
    }

    fn post(&self, message: &OutboundMessage) -> Result<(), EmbedError> {
        let parent = self
            .window
            .parent()
            .ok()
            .flatten()
            .ok_or(EmbedError::NoParent)?;
        let text = serde_json::to_string(message).map_err(|e| EmbedError::Encode(e.to_string()))?;
        let value = js_sys::JSON::parse(&text).map_err(|e| EmbedError::Encode(js_error_message(&e)))?;
        parent
            .post_message(&value, "*")
            .map_err(|e| EmbedError::Post(js_error_message(&e)))
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

pub type SharedBridge = Rc<RefCell<EmbedBridge<ParentWindow>>>;

/// Bridge plus the `message` listener that feeds it.
pub struct WebEmbed {
    bridge: SharedBridge,
    mode: EmbedMode,
    _on_message: Option<Closure<dyn FnMut(MessageEvent)>>,
}

impl WebEmbed {
    /// Detects iframe hosting; when embedded, starts listening and tells the
    /// parent we are ready.
    pub fn install(policy: OriginPolicy) -> Result<Self, AppError> {
        let win = window().ok_or(AppError::Missing("window"))?;
        let mode = EmbedMode::from_query(&win.location().search().unwrap_or_default());
        let bridge = Rc::new(RefCell::new(EmbedBridge::new(ParentWindow::new(win.clone()), policy)));

        let mut on_message = None;
        if bridge.borrow().is_embedded() {
            let target = bridge.clone();
            let closure = Closure::wrap(Box::new(move |evt: MessageEvent| {
                let Some(value) = message_payload(&evt.data()) else { return };
                let resolved = target.borrow().resolve(&evt.origin(), &value);
                if let Ok((handler, data)) = resolved {
                    handler(&data);
                }
            }) as Box<dyn FnMut(MessageEvent)>);
            win.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())?;
            on_message = Some(closure);

            let url = win.location().href().unwrap_or_default();
            bridge.borrow().send_ready(&url);
            tracing::info!("running embedded; ready sent to parent");
        }

        Ok(Self {
            bridge,
            mode,
            _on_message: on_message,
        })
    }

    pub fn bridge(&self) -> SharedBridge {
        self.bridge.clone()
    }

    pub fn mode(&self) -> EmbedMode {
        self.mode
    }
}
