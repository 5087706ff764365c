//! 設定パネルコンポーネント

use crate::app::{AppState, HealthStatus};
use crate::browser;
use kisan_netra_common::Theme;
use leptos::prelude::*;

const VOICE_TEST_TEXT: &str = "Hello from Kisan-Netra";

#[component]
pub fn SettingsPanel() -> impl IntoView {
    let state = expect_context::<AppState>();

    let on_voice_test = move |_| {
        let lang = state.prefs.with_untracked(|p| p.speech_lang());
        if let Err(e) = browser::speak(VOICE_TEST_TEXT, lang) {
            gloo::console::warn!(format!("speech unavailable: {e}"));
            state.notify("Speech not supported");
        }
    };

    let health_info = move || match state.health.get() {
        HealthStatus::Unknown => view! { <p class="muted">"Checking backend..."</p> }.into_any(),
        HealthStatus::Reachable(h) => view! {
            <p><b>"Status: "</b>{h.status}</p>
            <p><b>"Device: "</b>{h.device.unwrap_or_else(|| "-".into())}</p>
        }
        .into_any(),
        HealthStatus::Unreachable => view! { <p>"Backend not reachable"</p> }.into_any(),
    };

    view! {
        <div class="settings-panel">
            <div id="health-info" class="card">{health_info}</div>
            <div class="settings-grid">
                <div class="form-group">
                    <label for="theme-select">"Theme"</label>
                    <select
                        id="theme-select"
                        prop:value=move || state.prefs.with(|p| p.theme.as_str())
                        on:change=move |ev| state.set_theme(Theme::parse(&event_target_value(&ev)))
                    >
                        <option value="light">"Light"</option>
                        <option value="dark">"Dark"</option>
                    </select>
                </div>

                <div class="form-group">
                    <label for="lang-select">"Language"</label>
                    <select
                        id="lang-select"
                        prop:value=move || state.prefs.with(|p| p.lang.clone())
                        on:change=move |ev| state.set_lang(event_target_value(&ev))
                    >
                        <option value="en">"English"</option>
                        <option value="hi">"हिन्दी"</option>
                    </select>
                </div>

                <div class="form-group">
                    <button class="btn" on:click=on_voice_test>"Voice Test"</button>
                </div>
            </div>
        </div>
    }
}
