//! オフライン・アセットキャッシュ（Service Worker の戦略部分）
//!
//! - install: 世代名付きキャッシュへ重要アセットを事前格納
//! - activate: 現行世代以外のキャッシュをすべて削除
//! - fetch: 同一オリジンのGETはキャッシュ優先 → ネットワーク（コピーを格納）
//!   → どちらも失敗ならキャッシュ済みのルート文書
//!
//! ブラウザAPIへの束縛は `AssetBackend` 実装側が受け持つ。

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

/// Cache Storage とネットワークへのアクセス
#[allow(async_fn_in_trait)]
pub trait AssetBackend {
    type Response;

    async fn cache_names(&self) -> Result<Vec<String>>;
    async fn delete_cache(&self, name: &str) -> Result<bool>;
    async fn add_all(&self, cache: &str, urls: &[String]) -> Result<()>;
    /// 全キャッシュを横断して一致するレスポンスを探す
    async fn lookup(&self, url: &str) -> Result<Option<Self::Response>>;
    async fn store(&self, cache: &str, url: &str, response: Self::Response) -> Result<()>;
    async fn fetch(&self, url: &str) -> Result<Self::Response>;
    /// 本文を二重に読めるよう複製する
    fn duplicate(&self, response: &Self::Response) -> Result<Self::Response>;
}

/// 横取り判定に必要なリクエスト情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub url: String,
    pub method: String,
}

impl AssetRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".into(),
        }
    }
}

/// 同一オリジンならオリジン以降のパスを返す
pub fn same_origin_path<'a>(url: &'a str, origin: &str) -> Option<&'a str> {
    let rest = url.strip_prefix(origin.trim_end_matches('/'))?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// 現行世代以外のキャッシュ名
pub fn stale_caches(existing: &[String], current: &str) -> Vec<String> {
    existing
        .iter()
        .filter(|name| name.as_str() != current)
        .cloned()
        .collect()
}

pub struct OfflineCache<B> {
    backend: B,
    cache_name: String,
    precache: Vec<String>,
    shell: String,
    api_base: String,
}

impl<B: AssetBackend> OfflineCache<B> {
    pub fn new(backend: B, config: &ClientConfig) -> Self {
        Self {
            backend,
            cache_name: config.cache_name.clone(),
            precache: config.precache.clone(),
            shell: config.offline_shell.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub async fn install(&self) -> Result<()> {
        self.backend.add_all(&self.cache_name, &self.precache).await
    }

    /// 古い世代を削除し、削除したキャッシュ名を返す
    pub async fn activate(&self) -> Result<Vec<String>> {
        let names = self.backend.cache_names().await?;
        let mut deleted = Vec::new();
        for name in stale_caches(&names, &self.cache_name) {
            if self.backend.delete_cache(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// このリクエストを横取りするか
    ///
    /// 別オリジン、GET以外、APIへのリクエストは素通しする。
    pub fn intercepts(&self, request: &AssetRequest, origin: &str) -> bool {
        if !request.method.eq_ignore_ascii_case("GET") {
            return false;
        }
        match same_origin_path(&request.url, origin) {
            Some(path) => {
                self.api_base.is_empty()
                    || !(path == self.api_base || path.starts_with(&format!("{}/", self.api_base)))
            }
            None => false,
        }
    }

    /// キャッシュ → ネットワーク → オフラインシェルの順で応答を決める
    pub async fn respond(&self, url: &str) -> Result<B::Response> {
        if let Ok(Some(cached)) = self.backend.lookup(url).await {
            return Ok(cached);
        }
        match self.backend.fetch(url).await {
            Ok(response) => {
                // 格納の失敗は応答に影響させない
                if let Ok(copy) = self.backend.duplicate(&response) {
                    let _ = self.backend.store(&self.cache_name, url, copy).await;
                }
                Ok(response)
            }
            Err(err) => match self.backend.lookup(&self.shell).await {
                Ok(Some(shell)) => Ok(shell),
                _ => Err(err),
            },
        }
    }
}

/// メモリ上のバックエンド（テスト・非ブラウザ環境用）
///
/// レスポンスは本文の文字列。ネットワークは `serve` で登録したURLだけ応答する。
#[derive(Debug)]
pub struct MemoryBackend {
    caches: RefCell<BTreeMap<String, BTreeMap<String, String>>>,
    network: RefCell<HashMap<String, String>>,
    online: Cell<bool>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            caches: RefCell::default(),
            network: RefCell::default(),
            online: Cell::new(true),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: &str) {
        self.network.borrow_mut().insert(url.to_string(), body.to_string());
    }

    pub fn set_online(&self, online: bool) {
        self.online.set(online);
    }

    /// 空のキャッシュ世代を作る
    pub fn open_cache(&self, name: &str) {
        self.caches.borrow_mut().entry(name.to_string()).or_default();
    }

    pub fn cached(&self, cache: &str, url: &str) -> Option<String> {
        self.caches.borrow().get(cache)?.get(url).cloned()
    }
}

impl AssetBackend for MemoryBackend {
    type Response = String;

    async fn cache_names(&self) -> Result<Vec<String>> {
        Ok(self.caches.borrow().keys().cloned().collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool> {
        Ok(self.caches.borrow_mut().remove(name).is_some())
    }

    async fn add_all(&self, cache: &str, urls: &[String]) -> Result<()> {
        // 1件でも取得できなければ何も格納しない
        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            fetched.push((url.clone(), self.fetch(url).await?));
        }
        let mut caches = self.caches.borrow_mut();
        let entry = caches.entry(cache.to_string()).or_default();
        entry.extend(fetched);
        Ok(())
    }

    async fn lookup(&self, url: &str) -> Result<Option<String>> {
        Ok(self
            .caches
            .borrow()
            .values()
            .find_map(|c| c.get(url).cloned()))
    }

    async fn store(&self, cache: &str, url: &str, response: String) -> Result<()> {
        self.caches
            .borrow_mut()
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), response);
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        if !self.online.get() {
            return Err(Error::Network(format!("offline: {url}")));
        }
        self.network
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Network(format!("404: {url}")))
    }

    fn duplicate(&self, response: &String) -> Result<String> {
        Ok(response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    const ORIGIN: &str = "https://kisan.example";

    fn online_backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.serve("/", "<html>shell</html>");
        backend.serve("/static/css/styles.css", "body{}");
        backend.serve("/static/js/app.js", "init()");
        backend.serve("/manifest.webmanifest", "{}");
        backend
    }

    #[test]
    fn test_same_origin_path() {
        assert_eq!(same_origin_path("https://kisan.example/a.css", ORIGIN), Some("/a.css"));
        assert_eq!(same_origin_path("https://kisan.example", ORIGIN), Some("/"));
        assert_eq!(same_origin_path("https://kisan.example.evil/a", ORIGIN), None);
        assert_eq!(same_origin_path("https://cdn.example/a.js", ORIGIN), None);
    }

    #[test]
    fn test_stale_caches() {
        let names = vec!["kisan-netra-v1".to_string(), "kisan-netra-v2".to_string()];
        assert_eq!(stale_caches(&names, "kisan-netra-v2"), vec!["kisan-netra-v1"]);
    }

    #[test]
    fn test_install_precaches_manifest() {
        let cache = OfflineCache::new(online_backend(), &ClientConfig::default());
        block_on(cache.install()).expect("install失敗");
        let backend = cache.backend();
        assert_eq!(backend.cached("kisan-netra-v2", "/").as_deref(), Some("<html>shell</html>"));
        assert!(backend.cached("kisan-netra-v2", "/manifest.webmanifest").is_some());
    }

    #[test]
    fn test_install_fails_when_asset_missing() {
        let backend = MemoryBackend::new();
        backend.serve("/", "shell");
        let cache = OfflineCache::new(backend, &ClientConfig::default());
        assert!(block_on(cache.install()).is_err());
        assert!(cache.backend().cached("kisan-netra-v2", "/").is_none());
    }

    #[test]
    fn test_intercepts() {
        let cache = OfflineCache::new(MemoryBackend::new(), &ClientConfig::default());
        let origin_url = format!("{ORIGIN}/static/js/app.js");
        assert!(cache.intercepts(&AssetRequest::get(origin_url.as_str()), ORIGIN));
        assert!(!cache.intercepts(&AssetRequest::get("https://cdn.example/lib.js"), ORIGIN));
        assert!(!cache.intercepts(&AssetRequest::get(format!("{ORIGIN}/api/prices")), ORIGIN));

        let post = AssetRequest {
            url: origin_url,
            method: "POST".into(),
        };
        assert!(!cache.intercepts(&post, ORIGIN));
    }

    #[test]
    fn test_respond_refills_cache_from_network() {
        let backend = online_backend();
        backend.serve("/static/img/leaf.png", "png");
        let cache = OfflineCache::new(backend, &ClientConfig::default());

        let body = block_on(cache.respond("/static/img/leaf.png")).expect("応答失敗");
        assert_eq!(body, "png");
        assert_eq!(
            cache.backend().cached("kisan-netra-v2", "/static/img/leaf.png").as_deref(),
            Some("png")
        );
    }

    #[test]
    fn test_respond_prefers_cache() {
        let backend = online_backend();
        let cache = OfflineCache::new(backend, &ClientConfig::default());
        block_on(cache.install()).expect("install失敗");
        cache.backend().serve("/static/js/app.js", "newer()");
        let body = block_on(cache.respond("/static/js/app.js")).expect("応答失敗");
        assert_eq!(body, "init()");
    }

    #[test]
    fn test_respond_fails_without_shell() {
        let backend = MemoryBackend::new();
        backend.set_online(false);
        let cache = OfflineCache::new(backend, &ClientConfig::default());
        let err = block_on(cache.respond("/static/js/app.js")).unwrap_err();
        assert!(err.is_unreachable());
    }
}
