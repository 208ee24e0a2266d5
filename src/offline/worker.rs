//! Service-worker side of the offline policy, plus page-side registration.
//! `sw.js` forwards its `install`, `activate` and `fetch` events to the
//! exports here.

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Cache, RegistrationOptions, Request, Response, ServiceWorkerGlobalScope, Window};

use super::{CACHE_NAME, CacheStore, Network, Served, install, is_stale_cache, respond};
use crate::error::js_error_message;

/// Worker script, relative to the app's base path.
pub const SCRIPT: &str = "sw.js";

fn scope() -> Result<ServiceWorkerGlobalScope, JsValue> {
    js_sys::global()
        .dyn_into()
        .map_err(|_| JsValue::from_str("not running in a service worker"))
}

async fn open_cache(scope: &ServiceWorkerGlobalScope) -> Result<BrowserCache, JsValue> {
    let cache: Cache = JsFuture::from(scope.caches()?.open(CACHE_NAME)).await?.dyn_into()?;
    Ok(BrowserCache(cache))
}

pub struct BrowserCache(Cache);

impl CacheStore for BrowserCache {
    type Response = Response;

    async fn lookup(&self, request: &str) -> Option<Response> {
        // A miss resolves to `undefined`, which is not a Response.
        let found = JsFuture::from(self.0.match_with_str(request)).await.ok()?;
        found.dyn_into().ok()
    }

    async fn put(&self, request: &str, response: Response) -> Result<(), String> {
        JsFuture::from(self.0.put_with_str(request, &response))
            .await
            .map(drop)
            .map_err(|e| js_error_message(&e))
    }
}

pub struct BrowserNetwork(ServiceWorkerGlobalScope);

impl Network for BrowserNetwork {
    type Response = Response;

    async fn fetch(&self, request: &str) -> Result<Response, String> {
        JsFuture::from(self.0.fetch_with_str(request))
            .await
            .map_err(|e| js_error_message(&e))?
            .dyn_into()
            .map_err(|_| "fetch did not yield a Response".to_string())
    }

    fn check(&self, response: &Response) -> Result<(), String> {
        if response.ok() {
            Ok(())
        } else {
            Err(format!("http status {}", response.status()))
        }
    }
}

/// `install` event: precache the shell, all or nothing.
#[wasm_bindgen]
pub async fn sw_install() -> Result<(), JsValue> {
    let scope = scope()?;
    let cache = open_cache(&scope).await?;
    install(&cache, &BrowserNetwork(scope))
        .await
        .map_err(|reason| JsValue::from_str(&reason))
}

/// `activate` event: drop older cache generations and take over open pages.
#[wasm_bindgen]
pub async fn sw_activate() -> Result<(), JsValue> {
    let scope = scope()?;
    let caches = scope.caches()?;
    let names: Array = JsFuture::from(caches.keys()).await?.dyn_into()?;
    for name in names.iter().filter_map(|n| n.as_string()) {
        if is_stale_cache(&name) {
            JsFuture::from(caches.delete(&name)).await?;
            tracing::info!(cache = %name, "dropped stale cache");
        }
    }
    JsFuture::from(scope.clients().claim()).await?;
    Ok(())
}

/// `fetch` event: the response handed to `respondWith`.
#[wasm_bindgen]
pub async fn sw_fetch(request: Request) -> Result<Response, JsValue> {
    let scope = scope()?;
    let cache = open_cache(&scope).await?;
    let url = request.url();
    match respond(&cache, &BrowserNetwork(scope), &url).await {
        Served::Cache(hit) => Ok(hit),
        Served::Network(fresh) => Ok(fresh),
        Served::Fallback(root) => Ok(root),
        Served::Unavailable => Err(JsValue::from_str(&format!("{url}: offline and not cached"))),
    }
}

/// Registers `sw.js` as a module worker under `base`. Pages without
/// service-worker support (plain http, some embeds) skip it.
pub fn register(win: &Window, base: &str) {
    let navigator = win.navigator();
    if !Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false) {
        tracing::debug!("service workers unavailable");
        return;
    }
    let options = Object::new();
    if Reflect::set(&options, &JsValue::from_str("type"), &JsValue::from_str("module")).is_err() {
        return;
    }
    let url = format!("{base}/{SCRIPT}");
    let pending = navigator
        .service_worker()
        .register_with_options(&url, options.unchecked_ref::<RegistrationOptions>());
    wasm_bindgen_futures::spawn_local(async move {
        match JsFuture::from(pending).await {
            Ok(_) => tracing::debug!(%url, "service worker registered"),
            Err(e) => tracing::warn!(%url, error = %js_error_message(&e), "service worker registration failed"),
        }
    });
}
