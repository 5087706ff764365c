//! 履歴管理テスト
//!
//! 追加・削除・インポート/エクスポートの性質を検証

use kisan_netra_common::store::{keys, KeyValueStore};
use kisan_netra_common::{HistoryEntry, HistoryInput, HistoryManager, MemoryStore, Prediction};

fn entry(n: usize) -> HistoryEntry {
    HistoryEntry {
        predictions: vec![Prediction {
            label: format!("label-{n}"),
            prob: 0.5,
        }],
        input: HistoryInput {
            district: format!("district-{n}"),
            ..Default::default()
        },
        advisory: format!("advice {n}"),
        ..Default::default()
    }
}

/// 保存ごとに1件ずつ増え、最新が常に先頭
#[test]
fn test_save_grows_by_one_newest_first() {
    let history = HistoryManager::new(MemoryStore::new());
    for n in 0..20 {
        let before = history.list().len();
        history.save(entry(n), n as i64).expect("保存失敗");
        let list = history.list();
        assert_eq!(list.len(), before + 1);
        assert_eq!(list[0].input.district, format!("district-{n}"));
    }
}

/// 削除後の一覧に削除済みエントリは現れず、残りの順序は保たれる
#[test]
fn test_delete_preserves_relative_order() {
    let history = HistoryManager::new(MemoryStore::new());
    let ids: Vec<String> = (0..6)
        .map(|n| history.save(entry(n), n as i64).expect("保存失敗"))
        .collect();

    for victim in [&ids[2], &ids[5], &ids[0]] {
        let before: Vec<String> = history.list().iter().map(|e| e.key()).collect();
        history.delete(victim).expect("削除失敗");
        let after: Vec<String> = history.list().iter().map(|e| e.key()).collect();

        assert!(!after.contains(victim));
        let expected: Vec<String> = before.into_iter().filter(|k| k != victim).collect();
        assert_eq!(after, expected);
    }
}

/// 描画とアクションの間に一覧が変わっても、IDで正しいエントリを操作する
#[test]
fn test_delete_after_concurrent_insert_targets_same_entry() {
    let history = HistoryManager::new(MemoryStore::new());
    let target = history.save(entry(1), 1).expect("保存失敗");
    // 画面に表示した後で別のエントリが先頭に入る
    history.save(entry(2), 2).expect("保存失敗");

    history.delete(&target).expect("削除失敗");
    let list = history.list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].input.district, "district-2");
}

/// エクスポートしたテキストをインポートすると、保存内容がバイト単位で一致する
#[test]
fn test_export_import_roundtrip_bytes() {
    let source = HistoryManager::new(MemoryStore::new());
    for n in 0..3 {
        source.save(entry(n), 1_700_000_000_000 + n as i64).expect("保存失敗");
    }
    let exported = source.export_raw();

    let target = HistoryManager::new(MemoryStore::new());
    target.import_raw(&exported).expect("インポート失敗");
    assert_eq!(target.store().get_raw(keys::HISTORY).as_deref(), Some(exported.as_str()));
    assert_eq!(target.export_raw(), exported);
    assert_eq!(target.list(), source.list());
}

/// 旧クライアント形式のファイルもそのまま取り込める
#[test]
fn test_import_legacy_file() {
    let legacy = r#"[{"ts":1700000000000,"img":null,"preds":[{"label":"Tomato___Early_blight","prob":0.91}],"input":{"district":"Hyderabad","crop":"Tomato","disease":"Tomato___Early_blight","bp":"20","ac":"1"},"advisory":"Product Mancozeb"}]"#;
    let history = HistoryManager::new(MemoryStore::new());
    history.import_raw(legacy).expect("インポート失敗");

    let list = history.list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].top_prediction_line(), "Tomato___Early_blight 91.0%");
    assert_eq!(history.export_raw(), legacy);

    let restored = history.restore("ts-1700000000000").expect("復元失敗");
    assert_eq!(restored.baseline_price_per_kg, "20");
}
