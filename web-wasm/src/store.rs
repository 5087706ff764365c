//! localStorage への束縛

use gloo::storage::{LocalStorage, Storage};
use kisan_netra_common::{Error, KeyValueStore, Result};

/// ブラウザのlocalStorageを使うストア
///
/// プライベートモード等で書き込めない場合はエラーを返す。読み込みは常に寛容。
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl KeyValueStore for LocalStorageStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| Error::Storage(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        LocalStorage::raw()
            .remove_item(key)
            .map_err(|e| Error::Storage(format!("{:?}", e)))
    }
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use kisan_netra_common::store::{keys, load_preferences, save_theme};
    use kisan_netra_common::{HistoryEntry, HistoryManager, Theme};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn wasm_theme_persists_as_raw_text() {
        let store = LocalStorageStore;
        save_theme(&store, Theme::Dark).expect("保存失敗");
        assert_eq!(store.get_raw(keys::THEME).as_deref(), Some("dark"));
        assert_eq!(load_preferences(&store).theme, Theme::Dark);
        store.remove(keys::THEME).expect("削除失敗");
    }

    #[wasm_bindgen_test]
    fn wasm_history_corrupt_value_reads_empty() {
        let store = LocalStorageStore;
        store.set_raw(keys::HISTORY, "{oops").expect("保存失敗");
        let history = HistoryManager::new(store);
        assert!(history.list().is_empty());
        assert!(history.save(HistoryEntry::default(), 1).is_err());
        history.clear().expect("削除失敗");
        history.save(HistoryEntry::default(), 1).expect("保存失敗");
        assert_eq!(history.list().len(), 1);
        history.clear().expect("削除失敗");
    }
}
