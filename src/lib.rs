//! Contrastive Goat core crate.
//!
//! Three small contrastive-learning games (Predict, Feelings, Goat) over an
//! ambient particle background, with Web Audio feedback, a local event log and
//! a postMessage bridge for hosting pages. Engine state lives in plain Rust
//! types behind small traits (`Surface`, `AudioBackend`, `Transport`,
//! `EventStore`) so it runs natively under `cargo test`; the browser bindings
//! sit in the `canvas`, `web` and `app` modules.

use wasm_bindgen::prelude::*;

pub mod app;
pub mod audio;
pub mod config;
pub mod embed;
pub mod error;
pub mod events;
pub mod lint;
pub mod logging;
pub mod offline;
pub mod particles;
pub mod quiz;

pub use offline::precache_manifest;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(config::AppConfig::from_location().log_level);
}

/// Mounts the app into `#root` and starts the particle loop.
#[wasm_bindgen]
pub fn start_app() -> Result<(), JsValue> {
    app::start().map_err(|err| {
        tracing::error!(%err, "failed to start");
        JsValue::from(err)
    })
}
