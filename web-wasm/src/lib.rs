//! Kisan-Netra Web App (Leptos + WASM)

mod api;
mod app;
mod browser;
mod busy;
mod components;
mod store;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

const SERVICE_WORKER_URL: &str = "/service-worker.js";

/// オフライン用のサービスワーカーを登録する（失敗してもアプリは動く）
fn register_service_worker() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let promise = window.navigator().service_worker().register(SERVICE_WORKER_URL);
    wasm_bindgen_futures::spawn_local(async move {
        match JsFuture::from(promise).await {
            Ok(_) => gloo::console::log!("service worker registered"),
            Err(e) => gloo::console::warn!("service worker registration failed", e),
        }
    });
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    register_service_worker();
    leptos::mount::mount_to_body(app::App);
}
