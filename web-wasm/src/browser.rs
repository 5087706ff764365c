//! ブラウザAPIの薄いラッパー
//!
//! キャンバス描画、ファイル入出力、音声合成、テーマ属性。

use kisan_netra_common::prediction::fit_rect;
use kisan_netra_common::{ClientConfig, Error, Result, Theme};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, File, HtmlAnchorElement, HtmlCanvasElement,
    HtmlImageElement, SpeechSynthesisUtterance, Url,
};

/// 設定を埋め込む `<script type="application/json">` のid
const CONFIG_ELEMENT_ID: &str = "kisan-netra-config";

fn js_error(e: JsValue) -> Error {
    Error::Browser(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| Error::Browser("window unavailable".into()))
}

fn document() -> Result<web_sys::Document> {
    window()?
        .document()
        .ok_or_else(|| Error::Browser("document unavailable".into()))
}

/// ページに埋め込まれた設定を読む。無ければ既定値
pub fn load_config() -> Result<ClientConfig> {
    let text = document()?
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content())
        .filter(|t| !t.trim().is_empty());
    match text {
        Some(json) => ClientConfig::from_json(&json),
        None => Ok(ClientConfig::default()),
    }
}

/// URLの `#` 以降（無ければ空）
pub fn location_hash() -> String {
    window()
        .and_then(|w| w.location().hash().map_err(js_error))
        .map(|h| h.trim_start_matches('#').to_string())
        .unwrap_or_default()
}

/// 現在時刻（UNIXミリ秒）
pub fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

/// ローカル時刻の表示文字列
pub fn local_time(ts: i64) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(ts as f64));
    String::from(date.to_locale_string("default", &JsValue::UNDEFINED))
}

/// `<html data-theme>` を切り替える
pub fn apply_theme(theme: Theme) {
    if let Ok(doc) = document() {
        if let Some(root) = doc.document_element() {
            let _ = root.set_attribute("data-theme", theme.as_str());
        }
    }
}

/// テキストをファイルとしてダウンロードさせる
pub fn download_text(text: &str, mime: &str, file_name: &str) -> Result<()> {
    let parts = js_sys::Array::of1(&JsValue::from_str(text));
    let opts = BlobPropertyBag::new();
    opts.set_type(mime);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &opts).map_err(js_error)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(js_error)?;

    let anchor: HtmlAnchorElement = document()?
        .create_element("a")
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| Error::Browser("anchor element".into()))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    let _ = Url::revoke_object_url(&url);
    Ok(())
}

/// ファイルの中身をテキストとして読む
pub async fn read_text(file: &File) -> Result<String> {
    let value = JsFuture::from(file.text()).await.map_err(js_error)?;
    Ok(value.as_string().unwrap_or_default())
}

/// 画像ファイルをキャンバスに黒背景・中央寄せで描く
///
/// 描画はimageのonloadで非同期に行われ、完了後に `on_drawn` を呼ぶ。
/// デコードできない形式なら `on_failed` を呼ぶ。どちらの場合もオブジェクトURLは解放する。
pub fn draw_preview(
    canvas: &HtmlCanvasElement,
    file: &File,
    on_drawn: impl FnOnce() + 'static,
    on_failed: impl FnOnce() + 'static,
) -> Result<()> {
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(js_error)?
        .ok_or_else(|| Error::Browser("2d context unavailable".into()))?
        .dyn_into()
        .map_err(|_| Error::Browser("2d context".into()))?;

    let img = HtmlImageElement::new().map_err(js_error)?;
    let url = Url::create_object_url_with_blob(file).map_err(js_error)?;

    let (w, h) = (canvas.width() as f64, canvas.height() as f64);
    let img_clone = img.clone();
    let url_loaded = url.clone();
    let onload = Closure::once(move || {
        ctx.set_fill_style_str("#000");
        ctx.fill_rect(0.0, 0.0, w, h);
        let rect = fit_rect(
            w,
            h,
            img_clone.natural_width() as f64,
            img_clone.natural_height() as f64,
        );
        let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &img_clone,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
        );
        let _ = Url::revoke_object_url(&url_loaded);
        on_drawn();
    });
    let url_failed = url.clone();
    let onerror = Closure::once(move || {
        let _ = Url::revoke_object_url(&url_failed);
        on_failed();
    });
    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    // どちらか一方しか呼ばれないため両方とも手放す
    onload.forget();
    onerror.forget();
    img.set_src(&url);
    Ok(())
}

/// キャンバスの内容をPNGに再エンコードする
pub async fn canvas_to_png(canvas: &HtmlCanvasElement) -> Result<Blob> {
    let canvas = canvas.clone();
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        if let Err(e) = canvas.to_blob_with_type(&resolve, "image/png") {
            let _ = reject.call1(&JsValue::NULL, &e);
        }
    });
    let value = JsFuture::from(promise).await.map_err(js_error)?;
    value
        .dyn_into::<Blob>()
        .map_err(|_| Error::Browser("canvas produced no image".into()))
}

/// 音声合成で読み上げる
pub fn speak(text: &str, lang: &str) -> Result<()> {
    let utterance = SpeechSynthesisUtterance::new_with_text(text).map_err(js_error)?;
    utterance.set_lang(lang);
    window()?.speech_synthesis().map_err(js_error)?.speak(&utterance);
    Ok(())
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn wasm_config_defaults_without_embedded_script() {
        let config = load_config().expect("読込失敗");
        assert_eq!(config, ClientConfig::default());
    }

    #[wasm_bindgen_test]
    fn wasm_config_reads_embedded_script() {
        let doc = document().expect("documentが無い");
        let script = doc.create_element("script").expect("要素作成失敗");
        script.set_id(CONFIG_ELEMENT_ID);
        script.set_text_content(Some(r#"{"api_base": "/v2/api", "toast_ms": 900}"#));
        doc.body().expect("bodyが無い").append_child(&script).expect("追加失敗");

        let config = load_config().expect("読込失敗");
        assert_eq!(config.api_base, "/v2/api");
        assert_eq!(config.toast_ms, 900);
        assert_eq!(config.cache_name, "kisan-netra-v2");
        script.remove();
    }
}
