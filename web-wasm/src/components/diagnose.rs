//! 診断画面（画像の選択・プレビュー・病害判定）

use crate::api;
use crate::app::AppState;
use crate::browser;
use crate::busy::Busy;
use kisan_netra_common::{ImageMeta, PredictionState, View};
use leptos::html;
use leptos::prelude::*;
use web_sys::{DragEvent, File, HtmlInputElement};

#[component]
pub fn DiagnosePanel() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (is_dragover, set_is_dragover) = signal(false);
    let busy = Busy::new();
    let canvas_ref = NodeRef::<html::Canvas>::new();
    let input_ref = NodeRef::<html::Input>::new();
    let (canvas_width, canvas_height) = state
        .config
        .with_value(|c| (c.canvas_width, c.canvas_height));

    // 画像を選んだらキャンバスへ描く
    let select_file = move |file: File| {
        let meta = ImageMeta {
            name: file.name(),
            size: file.size() as u64,
        };
        let Some(generation) = state.prediction.try_update(|p| p.select_image(meta)) else {
            return;
        };

        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let drawn = move || state.prediction.update(|p| p.mark_previewed(generation));
        let failed = move || {
            state.prediction.update(|p| p.preview_failed(generation));
            state.notify("Could not read image");
        };
        if let Err(e) = browser::draw_preview(&canvas, &file, drawn, failed) {
            gloo::console::error!(format!("preview failed: {e}"));
            state.prediction.update(|p| p.preview_failed(generation));
            state.notify("Could not read image");
        }
    };

    let on_drop = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragover.set(false);
        if let Some(file) = ev
            .data_transfer()
            .and_then(|dt| dt.files())
            .and_then(|files| files.get(0))
        {
            select_file(file);
        }
    };

    let on_file_change = move |ev: leptos::ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        if let Some(file) = input.files().and_then(|files| files.get(0)) {
            select_file(file);
        }
    };

    let on_predict = move |_| {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let started = state.prediction.try_update(|p| p.begin_predict()).unwrap_or(false);
        if !started {
            let loading = state.prediction.with_untracked(|p| p.image().is_some());
            state.notify(if loading { "Image is still loading" } else { "Pick an image first" });
            return;
        }

        let config = state.config();
        wasm_bindgen_futures::spawn_local(async move {
            let _busy = busy.acquire();
            // 読み込んだ形式に関係なくPNGへ再エンコードして送る
            let result = match browser::canvas_to_png(&canvas).await {
                Ok(png) => api::predict(&config, &png).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(predictions) => {
                    let top = state.prediction.try_update(|p| p.finish(predictions)).flatten();
                    if let Some(label) = top {
                        state.fill_disease(label);
                    }
                    state.notify("Diagnosis complete");
                }
                Err(e) => {
                    gloo::console::error!(format!("predict failed: {e}"));
                    state.prediction.update(|p| p.fail());
                    state.notify("Prediction failed");
                }
            }
        });
    };

    let choose = move |index: usize| {
        if let Some(label) = state.prediction.with_untracked(|p| p.select(index)) {
            state.fill_disease(label);
            state.notify("Disease filled in Recommend tab");
            state.show(View::Recommend);
        }
    };

    let predictions = move || {
        let list = state.prediction.with(|p| p.predictions().to_vec());
        if list.is_empty() {
            return view! { <div class="muted">"No predictions yet."</div> }.into_any();
        }
        list.into_iter()
            .enumerate()
            .map(|(i, p)| {
                view! {
                    <div class="pred-card" on:click=move |_| choose(i)>
                        <div class="pred-main">
                            <div>{p.label.clone()}</div>
                            <div class="prob">{p.percent()}</div>
                        </div>
                    </div>
                }
            })
            .collect_view()
            .into_any()
    };

    view! {
        <div class="card">
            <div
                class="drop-zone"
                class:dragover=move || is_dragover.get()
                on:dragenter=move |ev: DragEvent| {
                    ev.prevent_default();
                    set_is_dragover.set(true);
                }
                on:dragover=move |ev: DragEvent| {
                    ev.prevent_default();
                    set_is_dragover.set(true);
                }
                on:dragleave=move |ev: DragEvent| {
                    ev.prevent_default();
                    set_is_dragover.set(false);
                }
                on:drop=on_drop
            >
                <p>"Drop a leaf photo here"</p>
                <input
                    node_ref=input_ref
                    type="file"
                    accept="image/*"
                    capture="environment"
                    on:change=on_file_change
                />
                <button
                    class="btn ghost"
                    on:click=move |_| {
                        if let Some(input) = input_ref.get_untracked() {
                            input.click();
                        }
                    }
                >
                    "Capture"
                </button>
            </div>

            <canvas node_ref=canvas_ref width=canvas_width.to_string() height=canvas_height.to_string() class="preview"></canvas>

            <div class="row">
                <button class="btn primary" on:click=on_predict>
                    {move || {
                        if state.prediction.with(|p| p.state() == PredictionState::Predicting) {
                            "Predicting..."
                        } else {
                            "Predict"
                        }
                    }}
                </button>
                <Show when=move || busy.is_busy()>
                    <span class="spinner"></span>
                </Show>
            </div>

            <div class="predictions">{predictions}</div>
        </div>
    }
}
