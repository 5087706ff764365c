//! トースト通知

use crate::app::AppState;
use leptos::prelude::*;

#[component]
pub fn Toast() -> impl IntoView {
    let state = expect_context::<AppState>();
    let text = move || state.toast.get().text;

    view! {
        <div id="toast" class="toast" class:show=move || text().is_some()>
            {move || text().unwrap_or_default()}
        </div>
    }
}
