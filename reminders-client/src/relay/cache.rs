//! Versioned resource cache and the network-first fetch strategy.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

pub const CACHE_PREFIX: &str = "smart-reminders";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Resources cached at install time so the app opens offline.
pub const APP_SHELL: &[&str] = &["/", "/index.html", "/manifest.json", "/icon-192.png", "/icon-512.png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Same-origin response.
    Basic,
    Cors,
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
}

impl FetchRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".into(),
            url: url.to_string(),
        }
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub kind: ResponseKind,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseKind::Basic
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Fetches over HTTP with reqwest, resolving relative paths against `origin`.
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: url::Url,
}

impl HttpFetcher {
    pub fn new(origin: &str) -> Result<Self, FetchError> {
        let origin = url::Url::parse(origin).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client, origin })
    }

    fn resolve(&self, raw: &str) -> Result<url::Url, FetchError> {
        self.origin
            .join(raw)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = self.resolve(&req.url)?;
        let method = reqwest::Method::from_bytes(req.method.as_bytes())
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let kind = if url.origin() == self.origin.origin() {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        };
        let res = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = res
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .to_vec();
        Ok(FetchResponse {
            status,
            kind,
            content_type,
            body,
        })
    }
}

/// Named caches; only the one matching the current version survives activation.
#[derive(Debug, Default)]
pub struct ResourceCache {
    current: String,
    caches: HashMap<String, HashMap<String, FetchResponse>>,
}

impl ResourceCache {
    pub fn new(version: &str) -> Self {
        Self {
            current: format!("{CACHE_PREFIX}-{version}"),
            caches: HashMap::new(),
        }
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.keys().cloned().collect();
        names.sort();
        names
    }

    /// Inserts into a named cache, creating it if needed.
    pub fn put_in(&mut self, cache: &str, url: &str, resp: FetchResponse) {
        self.caches
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), resp);
    }

    pub fn put(&mut self, url: &str, resp: FetchResponse) {
        let current = self.current.clone();
        self.put_in(&current, url, resp);
    }

    pub fn lookup(&self, url: &str) -> Option<&FetchResponse> {
        self.caches.get(&self.current).and_then(|c| c.get(url))
    }

    /// Moves the current-version entries of `installed` into this cache.
    /// Entries already present are kept.
    pub fn adopt(&mut self, mut installed: ResourceCache) {
        let Some(entries) = installed.caches.remove(&installed.current) else {
            return;
        };
        let target = self.caches.entry(self.current.clone()).or_default();
        for (url, resp) in entries {
            target.entry(url).or_insert(resp);
        }
    }

    /// Drops every cache whose name differs from the current version.
    /// Returns the names that were removed.
    pub fn purge_stale(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .caches
            .keys()
            .filter(|name| **name != self.current)
            .cloned()
            .collect();
        for name in &stale {
            self.caches.remove(name);
            info!(cache = %name, "deleted stale cache");
        }
        stale
    }

    /// Pre-caches the app shell; failures are logged and skipped.
    pub async fn precache(&mut self, fetcher: &dyn Fetcher, urls: &[&str]) -> usize {
        let mut stored = 0;
        for url in urls {
            match fetcher.fetch(&FetchRequest::get(url)).await {
                Ok(resp) if resp.is_cacheable() => {
                    self.put(url, resp);
                    stored += 1;
                }
                Ok(resp) => debug!(url = %url, status = resp.status, "precache: skipped"),
                Err(e) => warn!(url = %url, error = %e, "precache: fetch failed"),
            }
        }
        stored
    }

    /// Network first; successful same-origin GET responses refresh the cache
    /// and the cache answers when the network fails. Non-GET passes through.
    pub async fn network_first(
        &mut self,
        fetcher: &dyn Fetcher,
        req: &FetchRequest,
    ) -> Result<FetchResponse, FetchError> {
        if !req.is_get() {
            return fetcher.fetch(req).await;
        }
        match fetcher.fetch(req).await {
            Ok(resp) => {
                if resp.is_cacheable() {
                    self.put(&req.url, resp.clone());
                }
                Ok(resp)
            }
            Err(e) => match self.lookup(&req.url) {
                Some(cached) => {
                    debug!(url = %req.url, error = %e, "network failed; serving from cache");
                    Ok(cached.clone())
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    #[tokio::test]
    async fn network_first_caches_and_falls_back() {
        let fetcher = MockFetcher::default();
        fetcher.serve("/index.html", 200, ResponseKind::Basic, b"<html>");
        let mut cache = ResourceCache::new("v1");

        let req = FetchRequest::get("/index.html");
        let online = cache.network_first(&fetcher, &req).await.unwrap();
        assert_eq!(online.body, b"<html>");
        assert!(cache.lookup("/index.html").is_some());

        fetcher.set_offline(true);
        let offline = cache.network_first(&fetcher, &req).await.unwrap();
        assert_eq!(offline.body, b"<html>");

        let missing = cache
            .network_first(&fetcher, &FetchRequest::get("/other"))
            .await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn only_basic_ok_responses_are_cached() {
        let fetcher = MockFetcher::default();
        fetcher.serve("/missing", 404, ResponseKind::Basic, b"");
        fetcher.serve("https://cdn.example/x.js", 200, ResponseKind::Cors, b"x");
        let mut cache = ResourceCache::new("v1");

        cache
            .network_first(&fetcher, &FetchRequest::get("/missing"))
            .await
            .unwrap();
        cache
            .network_first(&fetcher, &FetchRequest::get("https://cdn.example/x.js"))
            .await
            .unwrap();
        assert!(cache.lookup("/missing").is_none());
        assert!(cache.lookup("https://cdn.example/x.js").is_none());
    }

    #[tokio::test]
    async fn non_get_bypasses_cache() {
        let fetcher = MockFetcher::default();
        fetcher.serve("/api/reminders", 200, ResponseKind::Basic, b"{}");
        let mut cache = ResourceCache::new("v1");
        let req = FetchRequest {
            method: "POST".into(),
            url: "/api/reminders".into(),
        };
        cache.network_first(&fetcher, &req).await.unwrap();
        assert!(cache.lookup("/api/reminders").is_none());
    }

    #[test]
    fn adopt_keeps_fresher_entries() {
        let resp = |body: &[u8]| FetchResponse {
            status: 200,
            kind: ResponseKind::Basic,
            content_type: None,
            body: body.to_vec(),
        };
        let mut installed = ResourceCache::new("v1");
        installed.put("/", resp(b"installed"));
        installed.put("/manifest.json", resp(b"{}"));

        let mut live = ResourceCache::new("v1");
        live.put("/", resp(b"live"));
        live.adopt(installed);

        assert_eq!(live.lookup("/").unwrap().body, b"live");
        assert_eq!(live.lookup("/manifest.json").unwrap().body, b"{}");
    }

    #[test]
    fn purge_keeps_only_current_version() {
        let mut cache = ResourceCache::new("v2");
        let resp = FetchResponse {
            status: 200,
            kind: ResponseKind::Basic,
            content_type: None,
            body: Vec::new(),
        };
        cache.put_in("smart-reminders-v1", "/", resp.clone());
        cache.put("/", resp);
        let removed = cache.purge_stale();
        assert_eq!(removed, vec!["smart-reminders-v1".to_string()]);
        assert_eq!(cache.cache_names(), vec!["smart-reminders-v2".to_string()]);
    }
}
