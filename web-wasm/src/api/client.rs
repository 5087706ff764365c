//! REST APIクライアント
//!
//! 状態を持たない関数群。失敗はすべて `kisan_netra_common::Error` で返し、
//! トースト表示への変換は呼び出し側（各フロー）で行う。

use kisan_netra_common::api::{IMPORT_FIELD, PREDICT_FIELD, PREDICT_FILE_NAME};
use kisan_netra_common::prediction::is_ranked;
use kisan_netra_common::prices::DeleteTarget;
use kisan_netra_common::{
    ClientConfig, Error, Health, PredictResponse, Prediction, PriceEntry, PriceRow,
    RecommendOutcome, RecommendRequest, Result, Route,
};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, File, FormData, Request, RequestInit, RequestMode, Response};

/// リクエスト本体
enum Body<'a> {
    Json(String),
    Form(&'a FormData),
}

fn network_error(e: JsValue) -> Error {
    Error::Network(
        e.as_string()
            .unwrap_or_else(|| format!("{:?}", e)),
    )
}

/// fetch を実行し、レスポンスを返す（ステータスは見ない）
async fn send(config: &ClientConfig, route: Route, body: Option<Body<'_>>) -> Result<Response> {
    let url = config.endpoint(&route.path());

    let opts = RequestInit::new();
    opts.set_method(route.method().as_str());
    opts.set_mode(RequestMode::SameOrigin);

    let mut json = false;
    match &body {
        Some(Body::Json(text)) => {
            opts.set_body(&JsValue::from_str(text));
            json = true;
        }
        Some(Body::Form(form)) => opts.set_body(form),
        None => {}
    }

    let request = Request::new_with_str_and_init(&url, &opts).map_err(network_error)?;
    if json {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(network_error)?;
    }

    let window = web_sys::window().ok_or_else(|| Error::Network("window unavailable".into()))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network_error)?;
    resp_value.dyn_into::<Response>().map_err(network_error)
}

async fn text(resp: &Response) -> Result<String> {
    let value = JsFuture::from(resp.text().map_err(network_error)?)
        .await
        .map_err(network_error)?;
    Ok(value.as_string().unwrap_or_default())
}

/// 非2xxを `Error::Http` に変換
async fn ensure_ok(resp: Response) -> Result<Response> {
    if resp.ok() {
        return Ok(resp);
    }
    let status = resp.status();
    let message = text(&resp).await.unwrap_or_default();
    Err(Error::Http { status, message })
}

async fn json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = ensure_ok(resp).await?;
    let value = JsFuture::from(resp.json().map_err(network_error)?)
        .await
        .map_err(network_error)?;
    serde_wasm_bindgen::from_value(value).map_err(|e| Error::Network(e.to_string()))
}

pub async fn health(config: &ClientConfig) -> Result<Health> {
    json(send(config, Route::Health, None).await?).await
}

pub async fn labels(config: &ClientConfig) -> Result<Vec<String>> {
    json(send(config, Route::Labels, None).await?).await
}

/// PNG画像を送って判定結果を受け取る
pub async fn predict(config: &ClientConfig, png: &Blob) -> Result<Vec<Prediction>> {
    let form = FormData::new().map_err(network_error)?;
    form.append_with_blob_and_filename(PREDICT_FIELD, png, PREDICT_FILE_NAME)
        .map_err(network_error)?;

    let resp = send(config, Route::Predict, Some(Body::Form(&form))).await?;
    let body = text(&ensure_ok(resp).await?).await?;
    let parsed: PredictResponse = serde_json::from_str(&body)?;

    if !is_ranked(&parsed.predictions) {
        gloo::console::warn!("predictions are not sorted by probability");
    }
    Ok(parsed.predictions)
}

/// 推奨を取得。非2xxはエラーではなく `RecommendOutcome::NoMatch`
pub async fn recommend(config: &ClientConfig, request: &RecommendRequest) -> Result<RecommendOutcome> {
    let payload = serde_json::to_string(request)?;
    let resp = send(config, Route::Recommend, Some(Body::Json(payload))).await?;
    let status = resp.status();
    let body = text(&resp).await?;
    RecommendOutcome::from_response(status, &body)
}

pub async fn list_prices(config: &ClientConfig) -> Result<Vec<PriceEntry>> {
    json(send(config, Route::ListPrices, None).await?).await
}

/// 行を保存（IDが無ければ作成、あれば全項目更新）
pub async fn save_price(config: &ClientConfig, row: &PriceRow) -> Result<()> {
    let payload = serde_json::to_string(&row.to_payload())?;
    let route = Route::from(&row.save_target());
    ensure_ok(send(config, route, Some(Body::Json(payload))).await?).await?;
    Ok(())
}

/// 行を削除（未作成の行はリクエストを送らない）
pub async fn delete_price(config: &ClientConfig, target: &DeleteTarget) -> Result<()> {
    let Some(route) = target.route() else {
        return Ok(());
    };
    ensure_ok(send(config, route, None).await?).await?;
    Ok(())
}

pub async fn export_prices(config: &ClientConfig) -> Result<String> {
    let resp = ensure_ok(send(config, Route::ExportPrices, None).await?).await?;
    text(&resp).await
}

pub async fn import_prices(config: &ClientConfig, file: &File) -> Result<()> {
    let form = FormData::new().map_err(network_error)?;
    form.append_with_blob(IMPORT_FIELD, file).map_err(network_error)?;
    ensure_ok(send(config, Route::ImportPrices, Some(Body::Form(&form))).await?).await?;
    Ok(())
}
