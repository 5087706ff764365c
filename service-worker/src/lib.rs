//! Kisan-Netra オフライン用 Service Worker
//!
//! キャッシュ戦略は `kisan_netra_common::OfflineCache` にあり、
//! ここでは Cache Storage と fetch への束縛だけを実装する。

use std::cell::OnceCell;
use std::rc::Rc;

use js_sys::{Array, Promise};
use kisan_netra_common::{AssetBackend, AssetRequest, ClientConfig, Error, OfflineCache, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{Cache, CacheStorage, FetchEvent, Response, ServiceWorkerGlobalScope};

fn cache_error(e: JsValue) -> Error {
    Error::Cache(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

fn network_error(e: JsValue) -> Error {
    Error::Network(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

fn to_js(e: Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Service Worker のグローバルスコープ上の Cache Storage と fetch
pub struct WorkerBackend {
    scope: ServiceWorkerGlobalScope,
}

impl WorkerBackend {
    pub fn new() -> Self {
        Self {
            scope: js_sys::global().unchecked_into(),
        }
    }

    fn caches(&self) -> Result<CacheStorage> {
        self.scope.caches().map_err(cache_error)
    }

    async fn open(&self, name: &str) -> Result<Cache> {
        let value = JsFuture::from(self.caches()?.open(name))
            .await
            .map_err(cache_error)?;
        value.dyn_into::<Cache>().map_err(cache_error)
    }

    pub fn origin(&self) -> String {
        self.scope.location().origin()
    }
}

impl Default for WorkerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetBackend for WorkerBackend {
    type Response = Response;

    async fn cache_names(&self) -> Result<Vec<String>> {
        let keys = JsFuture::from(self.caches()?.keys())
            .await
            .map_err(cache_error)?;
        Ok(Array::from(&keys)
            .iter()
            .filter_map(|name| name.as_string())
            .collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool> {
        let deleted = JsFuture::from(self.caches()?.delete(name))
            .await
            .map_err(cache_error)?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn add_all(&self, cache: &str, urls: &[String]) -> Result<()> {
        let list: Array = urls.iter().map(|url| JsValue::from_str(url)).collect();
        let cache = self.open(cache).await?;
        JsFuture::from(cache.add_all_with_str_sequence(&list))
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn lookup(&self, url: &str) -> Result<Option<Response>> {
        let found = JsFuture::from(self.caches()?.match_with_str(url))
            .await
            .map_err(cache_error)?;
        if found.is_undefined() || found.is_null() {
            return Ok(None);
        }
        found.dyn_into::<Response>().map(Some).map_err(cache_error)
    }

    async fn store(&self, cache: &str, url: &str, response: Response) -> Result<()> {
        let cache = self.open(cache).await?;
        JsFuture::from(cache.put_with_str(url, &response))
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Response> {
        let value = JsFuture::from(self.scope.fetch_with_str(url))
            .await
            .map_err(network_error)?;
        value.dyn_into::<Response>().map_err(network_error)
    }

    fn duplicate(&self, response: &Response) -> Result<Response> {
        response.clone().map_err(cache_error)
    }
}

thread_local! {
    static WORKER: OnceCell<Rc<OfflineCache<WorkerBackend>>> = const { OnceCell::new() };
}

fn worker() -> Rc<OfflineCache<WorkerBackend>> {
    WORKER.with(|cell| {
        cell.get_or_init(|| Rc::new(OfflineCache::new(WorkerBackend::new(), &ClientConfig::default())))
            .clone()
    })
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// install: 重要アセットを事前格納する
#[wasm_bindgen]
pub fn install() -> Promise {
    let cache = worker();
    future_to_promise(async move {
        cache.install().await.map_err(|e| {
            gloo::console::error!(format!("precache failed: {e}"));
            to_js(e)
        })?;
        gloo::console::log!(format!("precached into {}", cache.cache_name()));
        Ok(JsValue::UNDEFINED)
    })
}

/// activate: 旧世代のキャッシュを削除する
#[wasm_bindgen]
pub fn activate() -> Promise {
    let cache = worker();
    future_to_promise(async move {
        let deleted = cache.activate().await.map_err(to_js)?;
        for name in deleted {
            gloo::console::log!(format!("deleted stale cache {name}"));
        }
        Ok(JsValue::UNDEFINED)
    })
}

/// fetch: 対象のリクエストならキャッシュ戦略で応答する
///
/// 対象外（別オリジン、GET以外、API）のときは何もせずブラウザに任せる。
#[wasm_bindgen]
pub fn handle_fetch(event: FetchEvent) -> std::result::Result<(), JsValue> {
    let cache = worker();
    let request = event.request();
    let asset = AssetRequest {
        url: request.url(),
        method: request.method(),
    };
    if !cache.intercepts(&asset, &cache.backend().origin()) {
        return Ok(());
    }

    let url = asset.url;
    let promise = future_to_promise(async move {
        match cache.respond(&url).await {
            Ok(response) => Ok(response.into()),
            Err(e) => {
                gloo::console::warn!(format!("offline miss for {url}: {e}"));
                Err(to_js(e))
            }
        }
    });
    event.respond_with(&promise)
}
