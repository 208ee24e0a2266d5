//! Offline cache manifest and the fetch policy the service worker applies:
//! cached copy first, then the network, then the cached root document.
//!
//! The policy is written against two async seams, `CacheStore` and
//! `Network`. `worker` binds them to `CacheStorage` and `fetch`.

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod worker;

pub const CACHE_NAME: &str = "autogoat-v2";

/// Earlier cache generations share this prefix.
const CACHE_PREFIX: &str = "autogoat-";

/// Relative so the app also works under a sub-path.
pub const PRECACHE: &[&str] = &["./", "./index.html", "./404.html", "./manifest.webmanifest"];

/// Document served when both cache and network miss.
pub const FALLBACK: &str = "./";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub cache: &'static str,
    pub assets: &'static [&'static str],
    pub fallback: &'static str,
}

impl Manifest {
    pub const fn current() -> Self {
        Self {
            cache: CACHE_NAME,
            assets: PRECACHE,
            fallback: FALLBACK,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait CacheStore {
    type Response;
    async fn lookup(&self, request: &str) -> Option<Self::Response>;
    async fn put(&self, request: &str, response: Self::Response) -> Result<(), String>;
}

#[allow(async_fn_in_trait)]
pub trait Network {
    type Response;
    /// Fails only when no response arrives at all.
    async fn fetch(&self, request: &str) -> Result<Self::Response, String>;

    /// Whether a response is good enough to precache.
    fn check(&self, _response: &Self::Response) -> Result<(), String> {
        Ok(())
    }
}

/// Where a response came from.
#[derive(Clone, Debug, PartialEq)]
pub enum Served<R> {
    Cache(R),
    Network(R),
    Fallback(R),
    Unavailable,
}

/// Fetches every precached asset, then stores them. Nothing is written
/// unless every fetch succeeded.
pub async fn install<C, N, R>(cache: &C, network: &N) -> Result<(), String>
where
    C: CacheStore<Response = R>,
    N: Network<Response = R>,
{
    let mut fetched = Vec::with_capacity(PRECACHE.len());
    for &asset in PRECACHE {
        let response = match network.fetch(asset).await {
            Ok(response) => network.check(&response).map(|()| response),
            Err(reason) => Err(reason),
        };
        fetched.push((asset, response.map_err(|reason| format!("{asset}: {reason}"))?));
    }
    for (asset, response) in fetched {
        cache
            .put(asset, response)
            .await
            .map_err(|reason| format!("{asset}: {reason}"))?;
    }
    tracing::info!(cache = CACHE_NAME, count = PRECACHE.len(), "precached");
    Ok(())
}

pub async fn respond<C, N, R>(cache: &C, network: &N, request: &str) -> Served<R>
where
    C: CacheStore<Response = R>,
    N: Network<Response = R>,
{
    if let Some(hit) = cache.lookup(request).await {
        return Served::Cache(hit);
    }
    match network.fetch(request).await {
        Ok(response) => Served::Network(response),
        Err(reason) => {
            tracing::debug!(request, %reason, "network failed, serving fallback");
            match cache.lookup(FALLBACK).await {
                Some(root) => Served::Fallback(root),
                None => Served::Unavailable,
            }
        }
    }
}

/// Older generations of our cache, dropped on activation.
pub fn is_stale_cache(name: &str) -> bool {
    name != CACHE_NAME && name.starts_with(CACHE_PREFIX)
}

/// Manifest as JSON for the service worker script.
#[wasm_bindgen]
pub fn precache_manifest() -> String {
    serde_json::to_string(&Manifest::current()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    use pollster::block_on;

    #[derive(Default)]
    struct MapCache(RefCell<HashMap<String, String>>);

    impl CacheStore for MapCache {
        type Response = String;
        async fn lookup(&self, request: &str) -> Option<String> {
            self.0.borrow().get(request).cloned()
        }
        async fn put(&self, request: &str, response: String) -> Result<(), String> {
            self.0.borrow_mut().insert(request.to_string(), response);
            Ok(())
        }
    }

    struct Net {
        online: bool,
        /// Answers this one request with an error page.
        broken: Option<&'static str>,
    }

    impl Net {
        fn up() -> Self {
            Self { online: true, broken: None }
        }

        fn down() -> Self {
            Self { online: false, broken: None }
        }
    }

    impl Network for Net {
        type Response = String;
        async fn fetch(&self, request: &str) -> Result<String, String> {
            if !self.online {
                return Err("offline".into());
            }
            if self.broken == Some(request) {
                return Ok(format!("503:{request}"));
            }
            Ok(format!("net:{request}"))
        }

        fn check(&self, response: &String) -> Result<(), String> {
            match response.strip_prefix("503:") {
                Some(_) => Err("503".into()),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn cache_then_network_then_root() {
        let cache = MapCache::default();
        block_on(install(&cache, &Net::up())).unwrap();
        assert_eq!(cache.0.borrow().len(), 4);

        assert_eq!(
            block_on(respond(&cache, &Net::down(), "./index.html")),
            Served::Cache("net:./index.html".into())
        );
        assert_eq!(
            block_on(respond(&cache, &Net::up(), "./data.json")),
            Served::Network("net:./data.json".into())
        );
        assert_eq!(
            block_on(respond(&cache, &Net::down(), "./goat")),
            Served::Fallback("net:./".into())
        );
    }

    #[test]
    fn nothing_cached_and_offline() {
        let cache = MapCache::default();
        assert_eq!(block_on(respond(&cache, &Net::down(), "./")), Served::Unavailable);
        assert!(block_on(install(&cache, &Net::down())).is_err());
        assert!(cache.0.borrow().is_empty());
    }

    #[test]
    fn failed_install_leaves_cache_empty() {
        let cache = MapCache::default();
        let net = Net {
            online: true,
            broken: Some("./404.html"),
        };
        assert_eq!(block_on(install(&cache, &net)), Err("./404.html: 503".to_string()));
        assert!(cache.0.borrow().is_empty());
        assert_eq!(block_on(respond(&cache, &Net::down(), "./goat")), Served::Unavailable);
    }

    #[test]
    fn network_error_pages_are_still_served() {
        let cache = MapCache::default();
        let net = Net {
            online: true,
            broken: Some("./missing"),
        };
        assert_eq!(
            block_on(respond(&cache, &net, "./missing")),
            Served::Network("503:./missing".into())
        );
    }

    #[test]
    fn only_older_generations_are_stale() {
        assert!(is_stale_cache("autogoat-v1"));
        assert!(!is_stale_cache(CACHE_NAME));
        assert!(!is_stale_cache("someone-else"));
    }

    #[test]
    fn manifest_json() {
        let v: serde_json::Value = serde_json::from_str(&precache_manifest()).unwrap();
        assert_eq!(v["cache"], "autogoat-v2");
        assert_eq!(v["assets"].as_array().unwrap().len(), 4);
        assert_eq!(v["fallback"], "./");
    }
}
