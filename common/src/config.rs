//! クライアント設定
//!
//! APIのベースパス、オフラインキャッシュのバージョンと事前キャッシュ対象、
//! UIの定数をまとめる。JSONで部分的に上書きでき、欠けた項目は既定値になる。

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// 現行のキャッシュ世代名
pub const CACHE_NAME: &str = "kisan-netra-v2";

/// 事前キャッシュする重要アセット
pub const PRECACHE_ASSETS: [&str; 4] = [
    "/",
    "/static/css/styles.css",
    "/static/js/app.js",
    "/manifest.webmanifest",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// REST APIのベースパス
    pub api_base: String,
    /// オフラインキャッシュの世代名
    pub cache_name: String,
    /// install時に事前キャッシュするURL
    pub precache: Vec<String>,
    /// オフライン時に返すシェル文書
    pub offline_shell: String,
    /// トースト表示時間（ミリ秒）
    pub toast_ms: u32,
    /// プレビューキャンバスの大きさ
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "/api".into(),
            cache_name: CACHE_NAME.into(),
            precache: PRECACHE_ASSETS.iter().map(|s| s.to_string()).collect(),
            offline_shell: "/".into(),
            toast_ms: 1600,
            canvas_width: 512,
            canvas_height: 512,
        }
    }
}

impl ClientConfig {
    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// APIのエンドポイントURLを組み立てる
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
