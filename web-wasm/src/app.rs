//! メインアプリケーションコンポーネント

use crate::api;
use crate::browser;
use crate::components::{
    diagnose::DiagnosePanel, header::Header, history::HistoryPanel, info_modal::InfoModal,
    prices::PricesPanel, recommend::RecommendPanel, settings_panel::SettingsPanel, tabs::Tabs,
    toast::Toast,
};
use crate::store::LocalStorageStore;
use gloo::timers::callback::Timeout;
use kisan_netra_common::store::{load_latest_advice, load_preferences, save_lang, save_theme};
use kisan_netra_common::{
    field_help, ClientConfig, FieldHelp, Health, HistoryManager, PredictionFlow, Preferences,
    RecommendForm, Theme, View, ViewController,
};
use leptos::prelude::*;

/// バックエンドの状態表示
#[derive(Clone, Debug, Default, PartialEq)]
pub enum HealthStatus {
    #[default]
    Unknown,
    Reachable(Health),
    Unreachable,
}

/// トースト（連番で古いタイマーによる消去を防ぐ）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToastMessage {
    pub seq: u32,
    pub text: Option<String>,
}

/// アプリケーションの状態
///
/// ルートコンポーネントが所有し、コンテキストで各画面に渡す。
#[derive(Clone, Copy)]
pub struct AppState {
    pub config: StoredValue<ClientConfig>,
    pub view: RwSignal<ViewController>,
    pub prefs: RwSignal<Preferences>,
    pub health: RwSignal<HealthStatus>,
    /// 病害ラベル一覧（起動時に1回取得）
    pub labels: RwSignal<Vec<String>>,
    pub prediction: RwSignal<PredictionFlow>,
    pub form: RwSignal<RecommendForm>,
    /// 履歴の再描画トリガー
    pub history_rev: RwSignal<u32>,
    /// 最新の推奨が保存済みか（音声ボタンの有効化）
    pub has_advice: RwSignal<bool>,
    pub toast: RwSignal<ToastMessage>,
    /// 開いている入力欄の説明
    pub help: RwSignal<Option<FieldHelp>>,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Self {
        let store = LocalStorageStore;
        Self {
            config: StoredValue::new(config),
            view: RwSignal::new(ViewController::new()),
            prefs: RwSignal::new(load_preferences(&store)),
            health: RwSignal::new(HealthStatus::Unknown),
            labels: RwSignal::new(Vec::new()),
            prediction: RwSignal::new(PredictionFlow::new()),
            form: RwSignal::new(RecommendForm::default()),
            history_rev: RwSignal::new(0),
            has_advice: RwSignal::new(load_latest_advice(&store).is_some()),
            toast: RwSignal::new(ToastMessage::default()),
            help: RwSignal::new(None),
        }
    }

    pub fn config(&self) -> ClientConfig {
        self.config.get_value()
    }

    pub fn show(&self, view: View) {
        self.view.update(|v| v.show(view));
    }

    pub fn is_active(&self, view: View) -> bool {
        self.view.with(|v| v.is_active(view))
    }

    pub fn history(&self) -> HistoryManager<LocalStorageStore> {
        HistoryManager::new(LocalStorageStore)
    }

    /// 履歴を変更した後に呼ぶ
    pub fn history_changed(&self) {
        self.history_rev.update(|n| *n = n.wrapping_add(1));
    }

    /// 一定時間で消えるお知らせを出す
    pub fn notify(&self, text: impl Into<String>) {
        let mut seq = 0;
        self.toast.update(|t| {
            t.seq = t.seq.wrapping_add(1);
            t.text = Some(text.into());
            seq = t.seq;
        });
        let toast = self.toast;
        let ms = self.config.with_value(|c| c.toast_ms);
        Timeout::new(ms, move || {
            toast.update(|t| {
                if t.seq == seq {
                    t.text = None;
                }
            });
        })
        .forget();
    }

    pub fn open_help(&self, field: &str) {
        match field_help(field) {
            Some(help) => self.help.set(Some(help)),
            None => gloo::console::warn!(format!("no help for {field}")),
        }
    }

    pub fn close_help(&self) {
        self.help.set(None);
    }

    /// 推奨フォームの病害欄に入れる
    pub fn fill_disease(&self, label: String) {
        self.form.update(|f| f.disease = label);
    }

    pub fn set_theme(&self, theme: Theme) {
        if let Err(e) = save_theme(&LocalStorageStore, theme) {
            gloo::console::warn!(format!("theme not saved: {e}"));
        }
        browser::apply_theme(theme);
        self.prefs.update(|p| p.theme = theme);
    }

    pub fn set_lang(&self, lang: String) {
        if let Err(e) = save_lang(&LocalStorageStore, &lang) {
            gloo::console::warn!(format!("language not saved: {e}"));
        }
        self.notify(format!("Language: {lang}"));
        self.prefs.update(|p| p.lang = lang);
    }
}

/// 起動時にヘルスチェックとラベル一覧を並行して取得
fn load_startup_data(state: AppState) {
    let config = state.config();
    wasm_bindgen_futures::spawn_local(async move {
        let (health, labels) = futures::join!(api::health(&config), api::labels(&config));
        match health {
            Ok(h) => state.health.set(HealthStatus::Reachable(h)),
            Err(e) => {
                gloo::console::warn!(format!("health check failed: {e}"));
                state.health.set(HealthStatus::Unreachable);
                state.notify(if e.is_unreachable() {
                    "Backend not reachable"
                } else {
                    "Backend health check failed"
                });
            }
        }
        match labels {
            Ok(list) => state.labels.set(list),
            Err(e) => gloo::console::warn!(format!("labels unavailable: {e}")),
        }
    });
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let config = browser::load_config().unwrap_or_else(|e| {
        gloo::console::warn!(format!("embedded config ignored: {e}"));
        ClientConfig::default()
    });
    let state = AppState::new(config);
    provide_context(state);

    // `#history` などのURLで開いた画面から始める
    let hash = browser::location_hash();
    if !hash.is_empty() {
        if let Some(Err(e)) = state.view.try_update(|v| v.show_id(&hash)) {
            gloo::console::warn!(format!("{e}"));
        }
    }

    browser::apply_theme(state.prefs.get_untracked().theme);
    load_startup_data(state);

    let visible = move |view: View| move || state.is_active(view);

    view! {
        <div class="container">
            <Header />
            <Tabs />

            <section id="view-diagnose" class="view" class:active=visible(View::Diagnose)>
                <DiagnosePanel />
            </section>
            <section id="view-recommend" class="view" class:active=visible(View::Recommend)>
                <RecommendPanel />
            </section>
            <section id="view-history" class="view" class:active=visible(View::History)>
                <HistoryPanel />
            </section>
            <section id="view-prices" class="view" class:active=visible(View::Prices)>
                <PricesPanel />
            </section>
            <section id="view-settings" class="view" class:active=visible(View::Settings)>
                <SettingsPanel />
            </section>

            <Toast />
            <InfoModal />
        </div>
    }
}
