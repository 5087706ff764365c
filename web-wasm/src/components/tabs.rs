//! タブナビゲーション

use crate::app::AppState;
use kisan_netra_common::View;
use leptos::prelude::*;

#[component]
pub fn Tabs() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <nav class="tabs">
            {View::ALL
                .into_iter()
                .map(|view| {
                    view! {
                        <button
                            class="tab"
                            class:active=move || state.is_active(view)
                            data-tab=view.id()
                            on:click=move |_| state.show(view)
                        >
                            {view.title()}
                        </button>
                    }
                })
                .collect_view()}
        </nav>
    }
}
