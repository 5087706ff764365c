//! 価格表画面（リモートの価格エントリを行単位で編集）

use crate::api;
use crate::app::AppState;
use crate::browser;
use crate::busy::Busy;
use crate::components::info_modal::InfoButton;
use kisan_netra_common::prices::{DeleteTarget, PRICE_FIELDS};
use kisan_netra_common::{field_help, PriceTable};
use leptos::prelude::*;
use web_sys::HtmlInputElement;

/// 全件を取り直して表を描き直す
fn reload(state: AppState, table: RwSignal<PriceTable>, load_failed: RwSignal<bool>, busy: Busy) {
    let config = state.config();
    wasm_bindgen_futures::spawn_local(async move {
        let _busy = busy.acquire();
        match api::list_prices(&config).await {
            Ok(entries) => {
                table.update(|t| t.replace_all(&entries));
                load_failed.set(false);
            }
            Err(e) => {
                gloo::console::error!(format!("prices load failed: {e}"));
                table.update(|t| t.replace_all(&[]));
                load_failed.set(true);
            }
        }
    });
}

#[component]
pub fn PricesPanel() -> impl IntoView {
    let state = expect_context::<AppState>();
    let table = RwSignal::new(PriceTable::new());
    let load_failed = RwSignal::new(false);
    let busy = Busy::new();

    let refresh = move || reload(state, table, load_failed, busy);

    let save_row = move |key: u64| {
        let Some(row) = table.with_untracked(|t| t.row(key).cloned()) else {
            return;
        };
        let config = state.config();
        wasm_bindgen_futures::spawn_local(async move {
            let _busy = busy.acquire();
            match api::save_price(&config, &row).await {
                Ok(()) => {
                    state.notify("Saved");
                    refresh();
                }
                Err(e) => {
                    gloo::console::error!(format!("price save failed: {e}"));
                    state.notify("Save failed");
                }
            }
        });
    };

    let delete_row = move |key: u64| {
        let Some(target) = table.with_untracked(|t| t.row(key).map(|r| r.delete_target())) else {
            return;
        };
        if target == DeleteTarget::LocalOnly {
            table.update(|t| t.remove(key));
            return;
        }
        let config = state.config();
        wasm_bindgen_futures::spawn_local(async move {
            let _busy = busy.acquire();
            match api::delete_price(&config, &target).await {
                Ok(()) => {
                    table.update(|t| t.remove(key));
                    state.notify("Deleted");
                }
                Err(e) => {
                    gloo::console::error!(format!("price delete failed: {e}"));
                    state.notify("Delete failed");
                }
            }
        });
    };

    let on_export = move |_| {
        let config = state.config();
        wasm_bindgen_futures::spawn_local(async move {
            let _busy = busy.acquire();
            let result = match api::export_prices(&config).await {
                Ok(csv) => browser::download_text(&csv, "text/csv", "prices.csv"),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                gloo::console::error!(format!("prices export failed: {e}"));
                state.notify("Export failed");
            }
        });
    };

    let on_import = move |ev: leptos::ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        input.set_value("");
        let config = state.config();
        wasm_bindgen_futures::spawn_local(async move {
            let _busy = busy.acquire();
            match api::import_prices(&config, &file).await {
                Ok(()) => {
                    state.notify("Imported");
                    refresh();
                }
                Err(e) => {
                    gloo::console::error!(format!("prices import failed: {e}"));
                    state.notify("Import failed");
                }
            }
        });
    };

    // 行キー単位で描画し、入力中のセルを作り直さない
    let row_view = move |key: u64| {
        let cells = table.with_untracked(|t| {
            t.row(key)
                .map(|r| r.cells().to_vec())
                .unwrap_or_default()
        });
        let inputs = cells
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                view! {
                    <td>
                        <input
                            type="text"
                            data-field=PRICE_FIELDS[index]
                            value=value
                            on:input=move |ev| {
                                let value = event_target_value(&ev);
                                table.update(|t| t.edit(key, index, value));
                            }
                        />
                    </td>
                }
            })
            .collect_view();
        view! {
            <tr>
                {inputs}
                <td class="actions">
                    <button class="btn" on:click=move |_| save_row(key)>"Save"</button>
                    <button class="btn danger" on:click=move |_| delete_row(key)>"Delete"</button>
                </td>
            </tr>
        }
    };

    let header = PRICE_FIELDS
        .iter()
        .map(|field| {
            let info = field_help(field).map(|_| view! { <InfoButton field=*field /> });
            view! { <th>{*field} {info}</th> }
        })
        .collect_view();

    refresh();

    view! {
        <div class="card">
            <div class="row">
                <button class="btn" on:click=move |_| refresh()>"Refresh"</button>
                <button class="btn" on:click=move |_| { table.update(|t| { t.add_row(); }); }>
                    "Add Row"
                </button>
                <button class="btn" on:click=on_export>"Export CSV"</button>
                <label class="btn">
                    "Import CSV"
                    <input type="file" accept=".csv,text/csv" hidden on:change=on_import />
                </label>
                <Show when=move || busy.is_busy()>
                    <span class="spinner"></span>
                </Show>
            </div>

            <div class="table-wrap">
                <table class="prices">
                    <thead>
                        <tr>
                            {header}
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        <Show when=move || load_failed.get()>
                            <tr>
                                <td colspan=(PRICE_FIELDS.len() + 1).to_string() class="muted">
                                    "Failed to load prices"
                                </td>
                            </tr>
                        </Show>
                        <For
                            each=move || table.with(|t| t.rows().iter().map(|r| r.key).collect::<Vec<_>>())
                            key=|key| *key
                            children=row_view
                        />
                    </tbody>
                </table>
            </div>
        </div>
    }
}
