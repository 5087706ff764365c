//! 永続ストア
//!
//! ブラウザのlocalStorageを抽象化したキー/値ストア。
//! 値はすべて文字列で、構造化データはJSONで保存する。
//! 未保存・破損データは既定値として扱い、呼び出し側にエラーを返さない。

use crate::error::Result;
use crate::types::{LatestAdvice, Preferences, Theme};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;

/// 永続化キー
pub mod keys {
    pub const THEME: &str = "theme";
    pub const LANG: &str = "lang";
    pub const HISTORY: &str = "history";
    pub const LATEST_ADVICE: &str = "latestAdvice";
}

/// キー/値ストア
///
/// 単一スレッドのUIイベントからのみ呼ばれるため `&self` で書き込む。
pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// JSON値を読む。未保存・破損時は既定値
pub fn load_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    store
        .get_raw(key)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

/// JSON値を保存
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set_raw(key, &raw)
}

/// 利用者設定を読む（テーマ・言語は生文字列で保存されている）
pub fn load_preferences<S: KeyValueStore + ?Sized>(store: &S) -> Preferences {
    let defaults = Preferences::default();
    Preferences {
        theme: store
            .get_raw(keys::THEME)
            .map(|t| Theme::parse(&t))
            .unwrap_or(defaults.theme),
        lang: store
            .get_raw(keys::LANG)
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(defaults.lang),
    }
}

pub fn save_theme<S: KeyValueStore + ?Sized>(store: &S, theme: Theme) -> Result<()> {
    store.set_raw(keys::THEME, theme.as_str())
}

pub fn save_lang<S: KeyValueStore + ?Sized>(store: &S, lang: &str) -> Result<()> {
    store.set_raw(keys::LANG, lang)
}

/// 最新の推奨結果を読む
pub fn load_latest_advice<S: KeyValueStore + ?Sized>(store: &S) -> Option<LatestAdvice> {
    load_json::<Option<LatestAdvice>, S>(store, keys::LATEST_ADVICE)
}

pub fn save_latest_advice<S: KeyValueStore + ?Sized>(store: &S, advice: &LatestAdvice) -> Result<()> {
    save_json(store, keys::LATEST_ADVICE, advice)
}

/// メモリ上のストア（テスト・非ブラウザ環境用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
