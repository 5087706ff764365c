//! 推奨画面（入力フォーム・推奨カード・履歴保存・音声）

use crate::api;
use crate::app::AppState;
use crate::browser;
use crate::busy::Busy;
use crate::components::info_modal::InfoButton;
use crate::store::LocalStorageStore;
use kisan_netra_common::store::{load_latest_advice, save_latest_advice};
use kisan_netra_common::{
    HistoryEntry, LatestAdvice, RecommendForm, RecommendOutcome, RecommendRequest,
};
use leptos::prelude::*;

/// 推奨画面に表示する結果
#[derive(Clone, Debug, PartialEq)]
enum ResultView {
    Empty,
    Outcome(RecommendOutcome),
    Failed,
}

/// フォームの1項目（テキスト入力）
fn text_field(
    state: AppState,
    field: &'static str,
    label: &'static str,
    input_type: &'static str,
    get: fn(&RecommendForm) -> String,
    set: fn(&mut RecommendForm, String),
) -> impl IntoView {
    view! {
        <label class="field">
            <span>{label} <InfoButton field=field /></span>
            <input
                type=input_type
                prop:value=move || state.form.with(get)
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    state.form.update(|f| set(f, value));
                }
            />
        </label>
    }
}

#[component]
pub fn RecommendPanel() -> impl IntoView {
    let state = expect_context::<AppState>();
    let busy = Busy::new();
    let result = RwSignal::new(ResultView::Empty);

    let actions_enabled = move || {
        result.with(|r| matches!(r, ResultView::Outcome(o) if o.actions_enabled()))
    };

    let fill_from_prediction = move |_| {
        let top = state
            .prediction
            .with_untracked(|p| p.top().map(|t| t.label.clone()));
        match top {
            Some(label) => {
                state.fill_disease(label);
                state.notify("Filled disease from top prediction");
            }
            None => state.notify("No predictions yet"),
        }
    };

    let on_recommend = move |_| {
        let request = match state.form.with_untracked(RecommendRequest::from_form) {
            Ok(request) => request,
            Err(e) => {
                state.notify(e.to_string());
                return;
            }
        };

        let config = state.config();
        wasm_bindgen_futures::spawn_local(async move {
            let _busy = busy.acquire();
            match api::recommend(&config, &request).await {
                Ok(outcome) => {
                    if let RecommendOutcome::Advice(rec) = &outcome {
                        let advice = LatestAdvice {
                            ts: browser::now_ms(),
                            data: rec.clone(),
                        };
                        match save_latest_advice(&LocalStorageStore, &advice) {
                            Ok(()) => state.has_advice.set(true),
                            Err(e) => gloo::console::warn!(format!("advice not cached: {e}")),
                        }
                    } else {
                        state.has_advice.set(false);
                    }
                    result.set(ResultView::Outcome(outcome));
                }
                Err(e) => {
                    gloo::console::error!(format!("recommend failed: {e}"));
                    state.has_advice.set(false);
                    result.set(ResultView::Failed);
                }
            }
        });
    };

    let on_save = move |_| {
        let advisory = match result.get_untracked() {
            ResultView::Outcome(RecommendOutcome::Advice(rec)) => rec.advisory_text(),
            _ => return,
        };
        let entry = state.prediction.with_untracked(|p| HistoryEntry {
            image: p.image().cloned(),
            predictions: p.predictions().to_vec(),
            input: state.form.get_untracked(),
            advisory,
            ..Default::default()
        });
        match state.history().save(entry, browser::now_ms()) {
            Ok(_) => {
                state.history_changed();
                state.notify("Saved to history");
            }
            Err(e) => {
                gloo::console::error!(format!("history save failed: {e}"));
                state.notify("Could not save history");
            }
        }
    };

    let on_speak = move |_| {
        let Some(advice) = load_latest_advice(&LocalStorageStore) else {
            state.notify("No advisory yet");
            return;
        };
        let lang = state.prefs.with_untracked(|p| p.speech_lang());
        if let Err(e) = browser::speak(&advice.data.speech_text(), lang) {
            gloo::console::warn!(format!("speech unavailable: {e}"));
        }
    };

    let disease_options = move || {
        state
            .labels
            .get()
            .into_iter()
            .map(|label| {
                let current = label.clone();
                let text = label.clone();
                view! {
                    <option
                        value=label
                        prop:selected=move || state.form.with(|f| f.disease == current)
                    >
                        {text}
                    </option>
                }
            })
            .collect_view()
    };

    let card = move || match result.get() {
        ResultView::Empty => view! { <div class="muted">"No recommendation yet."</div> }.into_any(),
        ResultView::Failed => view! { <div class="muted">"Recommendation failed"</div> }.into_any(),
        ResultView::Outcome(RecommendOutcome::NoMatch(message)) => {
            view! { <div class="muted">{message}</div> }.into_any()
        }
        ResultView::Outcome(RecommendOutcome::Advice(rec)) => {
            let lines = rec
                .card_lines()
                .into_iter()
                .map(|(badge, text)| {
                    view! {
                        <div class="rec-line">
                            <span class="badge">{badge}</span>
                            " "
                            {text}
                        </div>
                    }
                })
                .collect_view();
            view! {
                <div class="rec-card">
                    {lines}
                    <div class="muted rationale">{rec.rationale.clone()}</div>
                </div>
            }
            .into_any()
        }
    };

    view! {
        <div class="card">
            <div class="form-grid">
                {text_field(state, "district", "District", "text", |f| f.district.clone(), |f, v| f.district = v)}
                {text_field(state, "crop", "Crop", "text", |f| f.crop.clone(), |f, v| f.crop = v)}
                <label class="field">
                    <span>"Disease" <InfoButton field="disease" /></span>
                    <select
                        prop:value=move || {
                            // 選択肢が後から届いたときも値を当て直す
                            state.labels.track();
                            state.form.with(|f| f.disease.clone())
                        }
                        on:change=move |ev| {
                            let value = event_target_value(&ev);
                            state.form.update(|f| f.disease = value);
                        }
                    >
                        <option value="">"Select disease"</option>
                        {disease_options}
                    </select>
                </label>
                {text_field(
                    state,
                    "baseline_price_per_kg",
                    "Baseline price (₹/kg)",
                    "number",
                    |f| f.baseline_price_per_kg.clone(),
                    |f, v| f.baseline_price_per_kg = v,
                )}
                {text_field(
                    state,
                    "acreage",
                    "Acreage",
                    "number",
                    |f| f.acreage.clone(),
                    |f, v| f.acreage = v,
                )}
            </div>

            <div class="row">
                <button class="btn ghost" on:click=fill_from_prediction>
                    "Fill from prediction"
                </button>
                <button class="btn primary" on:click=on_recommend>
                    "Get Recommendation"
                </button>
                <Show when=move || busy.is_busy()>
                    <span class="spinner"></span>
                </Show>
            </div>

            <div class="recommendation">{card}</div>

            <div class="row">
                <button class="btn" disabled=move || !actions_enabled() on:click=on_save>
                    "Save to History"
                </button>
                <button class="btn" disabled=move || !state.has_advice.get() on:click=on_speak>
                    "Speak"
                </button>
            </div>
        </div>
    }
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use kisan_netra_common::ClientConfig;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// 描画と副作用が一巡するのを待つ
    async fn next_tick() {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            let window = web_sys::window().expect("windowが無い");
            window
                .set_timeout_with_callback(&resolve)
                .expect("タイマー設定失敗");
        });
        JsFuture::from(promise).await.expect("待機失敗");
    }

    fn select_value(container: &web_sys::Element) -> String {
        let select = container
            .query_selector("select")
            .expect("検索失敗")
            .expect("selectが無い");
        js_sys::Reflect::get(&select, &JsValue::from_str("value"))
            .expect("value取得失敗")
            .as_string()
            .unwrap_or_default()
    }

    #[wasm_bindgen_test]
    async fn wasm_disease_select_follows_labels_that_arrive_later() {
        let doc = web_sys::window()
            .and_then(|w| w.document())
            .expect("documentが無い");
        let container = doc.create_element("div").expect("要素作成失敗");
        doc.body()
            .expect("bodyが無い")
            .append_child(&container)
            .expect("追加失敗");

        let state = AppState::new(ClientConfig::default());
        state.form.update(|f| f.disease = "blight".into());
        let _handle = leptos::mount::mount_to(container.clone().unchecked_into(), move || {
            provide_context(state);
            view! { <RecommendPanel /> }
        });
        next_tick().await;
        assert_eq!(select_value(&container), "");

        state.labels.set(vec!["rust".into(), "blight".into()]);
        next_tick().await;
        assert_eq!(select_value(&container), "blight");

        container.remove();
    }
}
