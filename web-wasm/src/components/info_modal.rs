//! 入力欄の説明ダイアログ

use crate::app::AppState;
use leptos::prelude::*;

/// 入力欄の横に置く「i」ボタン
#[component]
pub fn InfoButton(field: &'static str) -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <button
            type="button"
            class="info"
            aria-label="More info"
            on:click=move |_| state.open_help(field)
        >
            "i"
        </button>
    }
}

#[component]
pub fn InfoModal() -> impl IntoView {
    let state = expect_context::<AppState>();
    let help = move || state.help.get();

    view! {
        <Show when=move || help().is_some()>
            <div
                id="info-modal"
                class="modal"
                on:click=move |ev| {
                    // 背景をクリックしたときだけ閉じる
                    if ev.target() == ev.current_target() {
                        state.close_help();
                    }
                }
            >
                <div class="modal-card" role="dialog" aria-modal="true">
                    <div class="modal-head">
                        <h3>{move || help().map(|h| h.title).unwrap_or("Info")}</h3>
                        <button
                            class="btn ghost"
                            aria-label="Close"
                            on:click=move |_| state.close_help()
                        >
                            "×"
                        </button>
                    </div>
                    <p>{move || help().map(|h| h.body).unwrap_or_default()}</p>
                    <div class="row">
                        <button class="btn primary" on:click=move |_| state.close_help()>
                            "OK"
                        </button>
                    </div>
                </div>
            </div>
        </Show>
    }
}
