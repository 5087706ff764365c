//! ヘッダーコンポーネント

use crate::app::{AppState, HealthStatus};
use kisan_netra_common::Theme;
use leptos::prelude::*;

#[component]
pub fn Header() -> impl IntoView {
    let state = expect_context::<AppState>();

    let dot_class = move || match state.health.get() {
        HealthStatus::Unknown => "health-dot",
        HealthStatus::Reachable(h) if h.is_ok() => "health-dot status-ok",
        _ => "health-dot status-bad",
    };
    let dot_title = move || match state.health.get() {
        HealthStatus::Unknown => "Checking backend...".to_string(),
        HealthStatus::Reachable(h) => format!(
            "Status: {} / Device: {}",
            h.status,
            h.device.unwrap_or_else(|| "-".into())
        ),
        HealthStatus::Unreachable => "Backend not reachable".to_string(),
    };

    view! {
        <header class="header">
            <h1>"Kisan-Netra"</h1>
            <span class=dot_class title=dot_title></span>
            <button
                class="btn ghost"
                aria-label="Toggle theme"
                on:click=move |_| {
                    let next = state.prefs.get_untracked().theme.toggled();
                    state.set_theme(next);
                }
            >
                {move || if state.prefs.with(|p| p.theme == Theme::Dark) { "☀" } else { "☾" }}
            </button>
        </header>
    }
}
