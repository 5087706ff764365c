//! 履歴画面

use crate::app::AppState;
use crate::browser;
use crate::busy::Busy;
use kisan_netra_common::{HistoryEntry, View};
use leptos::prelude::*;
use web_sys::HtmlInputElement;

#[component]
fn HistoryCard(entry: HistoryEntry) -> impl IntoView {
    let state = expect_context::<AppState>();
    let key = StoredValue::new(entry.key());

    // 表示時点ではなく、押した時点の保存内容から復元する
    let on_restore = move |_| {
        let Some(input) = key.with_value(|k| state.history().restore(k)) else {
            state.notify("Entry not found");
            return;
        };
        state.form.set(input);
        state.show(View::Recommend);
        state.notify("Restored inputs");
    };

    let on_delete = move |_| match key.with_value(|k| state.history().delete(k)) {
        Ok(_) => state.history_changed(),
        Err(e) => {
            gloo::console::error!(format!("history delete failed: {e}"));
            state.notify("Delete failed");
        }
    };

    view! {
        <div class="history-card">
            <div class="muted">{browser::local_time(entry.timestamp)}</div>
            <div>{entry.image_line()}</div>
            <div>{entry.inputs_line()}</div>
            <div>{entry.top_prediction_line()}</div>
            <pre class="advisory">{entry.advisory_line().to_string()}</pre>
            <div class="row">
                <button class="btn ghost" on:click=on_restore>"Restore"</button>
                <button class="btn danger" on:click=on_delete>"Delete"</button>
            </div>
        </div>
    }
}

#[component]
pub fn HistoryPanel() -> impl IntoView {
    let state = expect_context::<AppState>();
    let busy = Busy::new();

    let entries = move || {
        state.history_rev.track();
        let list = state.history().list();
        if list.is_empty() {
            return view! { <div class="muted">"No history yet"</div> }.into_any();
        }
        list.into_iter()
            .map(|entry| view! { <HistoryCard entry=entry /> })
            .collect_view()
            .into_any()
    };

    let on_export = move |_| {
        let text = state.history().export_raw();
        if let Err(e) = browser::download_text(&text, "application/json", "history.json") {
            gloo::console::error!(format!("history export failed: {e}"));
        }
    };

    let on_import = move |ev: leptos::ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        input.set_value("");
        wasm_bindgen_futures::spawn_local(async move {
            let _busy = busy.acquire();
            let result = match browser::read_text(&file).await {
                Ok(text) => state.history().import_raw(&text),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    state.history_changed();
                    state.notify("History imported");
                }
                Err(e) => {
                    gloo::console::error!(format!("history import failed: {e}"));
                    state.notify("Import failed");
                }
            }
        });
    };

    let on_clear = move |_| match state.history().clear() {
        Ok(()) => {
            state.history_changed();
            state.notify("History cleared");
        }
        Err(e) => gloo::console::error!(format!("history clear failed: {e}")),
    };

    view! {
        <div class="card">
            <div class="row">
                <button class="btn" on:click=on_export>"Export"</button>
                <label class="btn">
                    "Import"
                    <input type="file" accept="application/json" hidden on:change=on_import />
                </label>
                <button class="btn danger" on:click=on_clear>"Clear"</button>
                <Show when=move || busy.is_busy()>
                    <span class="spinner"></span>
                </Show>
            </div>
            <div class="history-list">{entries}</div>
        </div>
    }
}
