//! 履歴管理
//!
//! 履歴リストはストアの `history` キーにJSON配列として丸ごと保存される。
//! 変更系はすべて「全件読込 → 変更 → 全件書き戻し」で、操作の時点で
//! ストアから読み直したリストに対して行う。
//!
//! この読み書きはアトミックではない。UIイベントループが単一スレッドで
//! 直列化している前提で成り立つ。

use crate::error::{Error, Result};
use crate::store::{keys, save_json, KeyValueStore};
use crate::types::{HistoryEntry, HistoryInput};
use serde_json::Value;

pub struct HistoryManager<S> {
    store: S,
}

impl<S: KeyValueStore> HistoryManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 保存されている配列を要素のまま読む
    ///
    /// 読めない要素も書き戻し時に失わないよう `Value` のまま保持する。
    /// 値はあるが配列として読めない場合はエラーにし、上書きしない。
    fn raw_items(&self) -> Result<Vec<Value>> {
        match self.store.get_raw(keys::HISTORY) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|_| {
                Error::Storage("stored history is not a JSON array; clear it first".into())
            }),
        }
    }

    /// 現在の履歴（新しい順）。読めない要素は表示から除く
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.raw_items()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }

    /// 先頭に追加して保存し、採番したIDを返す
    pub fn save(&self, mut entry: HistoryEntry, now_ms: i64) -> Result<String> {
        let mut items = self.raw_items()?;
        let id = next_id(&items, now_ms);
        entry.id = Some(id.clone());
        entry.timestamp = now_ms;
        items.insert(0, serde_json::to_value(&entry)?);
        save_json(&self.store, keys::HISTORY, &items)?;
        Ok(id)
    }

    /// キーに一致するエントリを削除。見つからなければ何もせず false
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut items = self.raw_items()?;
        let Some(pos) = items.iter().position(|v| item_key(v).as_deref() == Some(key)) else {
            return Ok(false);
        };
        items.remove(pos);
        save_json(&self.store, keys::HISTORY, &items)?;
        Ok(true)
    }

    /// フォームへ書き戻す入力値を取り出す
    pub fn restore(&self, key: &str) -> Option<HistoryInput> {
        self.list()
            .into_iter()
            .find(|e| e.key() == key)
            .map(|e| e.input)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(keys::HISTORY)
    }

    /// 保存されている生テキストをそのまま返す
    pub fn export_raw(&self) -> String {
        self.store
            .get_raw(keys::HISTORY)
            .unwrap_or_else(|| "[]".to_string())
    }

    /// アップロードされたテキストで丸ごと置き換える（構造は検証しない）
    pub fn import_raw(&self, text: &str) -> Result<()> {
        self.store.set_raw(keys::HISTORY, text)
    }
}

/// 要素のキー（`HistoryEntry::key` と同じ規則を生のJSONに適用）
fn item_key(item: &Value) -> Option<String> {
    if let Some(id) = item.get("id").and_then(Value::as_str) {
        return Some(id.to_string());
    }
    let ts = item.get("ts").or_else(|| item.get("timestamp"))?;
    ts.as_i64().map(|ts| format!("ts-{ts}"))
}

fn next_id(items: &[Value], now_ms: i64) -> String {
    let mut seq = items.len();
    loop {
        let candidate = format!("h-{now_ms}-{seq}");
        if items.iter().all(|v| item_key(v).as_deref() != Some(candidate.as_str())) {
            return candidate;
        }
        seq += 1;
    }
}

impl HistoryEntry {
    /// 画像メタデータの表示行
    pub fn image_line(&self) -> String {
        match &self.image {
            Some(img) => format!("Image: {} ({} bytes)", img.name, img.size),
            None => "No image metadata".to_string(),
        }
    }

    /// 入力値の表示行
    pub fn inputs_line(&self) -> String {
        let i = &self.input;
        format!(
            "{} / {} / {} (₹{}/kg; {} acres)",
            i.district, i.crop, i.disease, i.baseline_price_per_kg, i.acreage
        )
    }

    /// 最上位の判定候補の表示行
    pub fn top_prediction_line(&self) -> String {
        match self.top_prediction() {
            Some(p) => format!(
                "{} {}",
                if p.label.is_empty() { "-" } else { &p.label },
                p.percent()
            ),
            None => "- 0.0%".to_string(),
        }
    }

    pub fn advisory_line(&self) -> &str {
        if self.advisory.is_empty() {
            "-"
        } else {
            &self.advisory
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{ImageMeta, Prediction};

    fn entry(district: &str) -> HistoryEntry {
        HistoryEntry {
            input: HistoryInput {
                district: district.to_string(),
                crop: "Tomato".to_string(),
                disease: "blight".to_string(),
                baseline_price_per_kg: "20".to_string(),
                acreage: "1".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_save_inserts_at_head() {
        let history = HistoryManager::new(MemoryStore::new());
        history.save(entry("A"), 1).expect("保存失敗");
        history.save(entry("B"), 2).expect("保存失敗");

        let list = history.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].input.district, "B");
        assert_eq!(list[0].timestamp, 2);
        assert_eq!(list[1].input.district, "A");
    }

    #[test]
    fn test_save_assigns_unique_ids_within_same_millisecond() {
        let history = HistoryManager::new(MemoryStore::new());
        let a = history.save(entry("A"), 100).expect("保存失敗");
        let b = history.save(entry("B"), 100).expect("保存失敗");
        history.delete(&a).expect("削除失敗");
        let c = history.save(entry("C"), 100).expect("保存失敗");
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_delete_by_id() {
        let history = HistoryManager::new(MemoryStore::new());
        let a = history.save(entry("A"), 1).expect("保存失敗");
        let b = history.save(entry("B"), 2).expect("保存失敗");
        let c = history.save(entry("C"), 3).expect("保存失敗");

        assert!(history.delete(&b).expect("削除失敗"));
        let keys: Vec<String> = history.list().iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec![c, a]);

        assert!(!history.delete(&b).expect("削除失敗"));
    }

    #[test]
    fn test_restore_returns_inputs() {
        let history = HistoryManager::new(MemoryStore::new());
        let id = history.save(entry("Warangal"), 1).expect("保存失敗");
        let input = history.restore(&id).expect("復元失敗");
        assert_eq!(input.district, "Warangal");
        assert_eq!(input.baseline_price_per_kg, "20");
        assert!(history.restore("missing").is_none());
    }

    #[test]
    fn test_legacy_entries_addressed_by_timestamp() {
        let history = HistoryManager::new(MemoryStore::new());
        history
            .import_raw(r#"[{"ts": 10, "input": {"district": "Old"}}, {"ts": 5}]"#)
            .expect("インポート失敗");
        assert!(history.delete("ts-10").expect("削除失敗"));
        let list = history.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].timestamp, 5);
    }

    #[test]
    fn test_clear_and_export_empty() {
        let history = HistoryManager::new(MemoryStore::new());
        assert_eq!(history.export_raw(), "[]");
        history.save(entry("A"), 1).expect("保存失敗");
        history.clear().expect("削除失敗");
        assert!(history.list().is_empty());
        assert_eq!(history.export_raw(), "[]");
    }

    #[test]
    fn test_import_malformed_lists_empty() {
        let history = HistoryManager::new(MemoryStore::new());
        history.import_raw("this is not json").expect("インポート失敗");
        assert!(history.list().is_empty());
        // 生テキストはそのまま残る
        assert_eq!(history.export_raw(), "this is not json");
    }

    #[test]
    fn test_save_refuses_to_overwrite_unparsable_history() {
        let history = HistoryManager::new(MemoryStore::new());
        history.import_raw("this is not json").expect("インポート失敗");
        assert!(matches!(history.save(entry("A"), 1), Err(Error::Storage(_))));
        assert!(matches!(history.delete("ts-1"), Err(Error::Storage(_))));
        assert_eq!(history.export_raw(), "this is not json");
    }

    #[test]
    fn test_save_keeps_unreadable_elements() {
        let history = HistoryManager::new(MemoryStore::new());
        history
            .import_raw(r#"[{"ts":1,"input":{"district":"Keep"}},{"ts":2,"preds":[{"label":"x"}]}]"#)
            .expect("インポート失敗");
        // 確率の無い判定候補は読めないので一覧には出ない
        assert_eq!(history.list().len(), 1);

        history.save(entry("New"), 3).expect("保存失敗");
        let list = history.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].input.district, "New");
        assert_eq!(list[1].input.district, "Keep");

        let stored: Vec<Value> =
            serde_json::from_str(&history.export_raw()).expect("デシリアライズ失敗");
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2]["preds"][0]["label"], "x");

        // 読めない要素もタイムスタンプのキーで削除できる
        assert!(history.delete("ts-2").expect("削除失敗"));
        let stored: Vec<Value> =
            serde_json::from_str(&history.export_raw()).expect("デシリアライズ失敗");
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_card_lines() {
        let mut e = entry("Hyderabad");
        assert_eq!(e.image_line(), "No image metadata");
        assert_eq!(e.top_prediction_line(), "- 0.0%");
        assert_eq!(e.advisory_line(), "-");
        assert_eq!(e.inputs_line(), "Hyderabad / Tomato / blight (₹20/kg; 1 acres)");

        e.image = Some(ImageMeta {
            name: "leaf.png".into(),
            size: 1234,
        });
        e.predictions = vec![Prediction {
            label: "blight".into(),
            prob: 0.82,
        }];
        e.advisory = "Product X".into();
        assert_eq!(e.image_line(), "Image: leaf.png (1234 bytes)");
        assert_eq!(e.top_prediction_line(), "blight 82.0%");
        assert_eq!(e.advisory_line(), "Product X");
    }
}
