//! データモデルの型定義
//!
//! Web(WASM)クライアントとService Workerで共有される型:
//! - Prediction / PredictResponse: 病害判定APIの出力
//! - Recommendation / LatestAdvice: 推奨APIの出力とローカルキャッシュ
//! - HistoryEntry: ローカル履歴の1件
//! - PriceEntry: 価格表の1行（リモートが正）
//! - Preferences: テーマと言語

use serde::{Deserialize, Deserializer, Serialize};

/// nullを既定値として読む
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 文字列・数値のどちらでも文字列として読む（フォーム入力の保存値用）
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// 病害判定の1候補
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub prob: f64,
}

impl Prediction {
    /// 確率を百分率（小数1桁）で表示
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.prob * 100.0)
    }
}

/// POST /predict のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub predictions: Vec<Prediction>,
}

/// GET /health のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub device: Option<String>,
}

impl Health {
    /// モデルがロード済みでバックエンドが応答可能か
    pub fn is_ok(&self) -> bool {
        matches!(self.device.as_deref(), Some(device) if !device.is_empty() && device != "unloaded")
    }
}

/// 推奨結果（POST /recommend の2xxレスポンス）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    pub best_product: String,
    pub brand: String,
    pub dealer: String,
    pub unit_price_inr: f64,
    pub expected_yield_gain_pct: f64,
    pub expected_profit_inr: f64,
    pub rationale: String,
}

/// 非2xxレスポンスのメッセージ本体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// 最新の推奨結果（音声再生用キャッシュ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestAdvice {
    /// 取得時刻（UNIXミリ秒）
    pub ts: i64,
    pub data: Recommendation,
}

/// 履歴に記録する画像メタデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// 履歴に記録するフォーム入力（入力されたままの文字列）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryInput {
    #[serde(default, deserialize_with = "text_or_number")]
    pub district: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub crop: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub disease: String,
    #[serde(
        rename = "bp",
        alias = "baseline_price_per_kg",
        default,
        deserialize_with = "text_or_number"
    )]
    pub baseline_price_per_kg: String,
    #[serde(
        rename = "ac",
        alias = "acreage",
        default,
        deserialize_with = "text_or_number"
    )]
    pub acreage: String,
}

/// 履歴の1件
///
/// 永続化キーは旧クライアントと互換（ts / img / preds / advisory）。
/// `id` は作成時に採番され、削除・復元はこのIDで行う。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "ts", alias = "timestamp", default)]
    pub timestamp: i64,

    #[serde(rename = "img", alias = "image_metadata", default)]
    pub image: Option<ImageMeta>,

    #[serde(
        rename = "preds",
        alias = "predictions",
        default,
        deserialize_with = "null_as_default"
    )]
    pub predictions: Vec<Prediction>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub input: HistoryInput,

    #[serde(
        rename = "advisory",
        alias = "advisory_text",
        default,
        deserialize_with = "null_as_default"
    )]
    pub advisory: String,
}

impl HistoryEntry {
    /// 削除・復元に使うキー
    ///
    /// IDを持たない（旧形式からインポートされた）エントリはタイムスタンプで代替する。
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("ts-{}", self.timestamp),
        }
    }

    /// 先頭（最上位）の判定候補
    pub fn top_prediction(&self) -> Option<&Prediction> {
        self.predictions.first()
    }
}

/// 価格表の1行
///
/// `id` が無い行はまだリモートに作成されていない新規行。
/// 送信時は `id` を含めない（パスで指定する）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    #[serde(default, skip_serializing)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub district: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dealer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub crop: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disease: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit_price_inr: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expected_yield_gain_pct: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

/// 表示テーマ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// 保存値から読む（不明な値はLight）
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// 利用者設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub lang: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            lang: "en".to_string(),
        }
    }
}

impl Preferences {
    /// 音声合成に使う言語タグ
    pub fn speech_lang(&self) -> &'static str {
        if self.lang == "hi" {
            "hi-IN"
        } else {
            "en-IN"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // Prediction / Health テスト
    // =============================================

    #[test]
    fn test_prediction_percent() {
        let p = Prediction {
            label: "blight".to_string(),
            prob: 0.82,
        };
        assert_eq!(p.percent(), "82.0%");
    }

    #[test]
    fn test_predict_response_null_predictions() {
        let res: PredictResponse =
            serde_json::from_str(r#"{"predictions": null}"#).expect("デシリアライズ失敗");
        assert!(res.predictions.is_empty());

        let res: PredictResponse = serde_json::from_str("{}").expect("デシリアライズ失敗");
        assert!(res.predictions.is_empty());
    }

    #[test]
    fn test_health_is_ok() {
        let ok: Health =
            serde_json::from_str(r#"{"status":"ok","device":"cpu"}"#).expect("デシリアライズ失敗");
        assert!(ok.is_ok());

        let unloaded: Health = serde_json::from_str(r#"{"status":"ok","device":"unloaded"}"#)
            .expect("デシリアライズ失敗");
        assert!(!unloaded.is_ok());

        let missing: Health = serde_json::from_str(r#"{"status":"ok"}"#).expect("デシリアライズ失敗");
        assert!(!missing.is_ok());
    }

    // =============================================
    // HistoryEntry テスト
    // =============================================

    #[test]
    fn test_history_entry_legacy_format() {
        // 旧クライアントが書いた形式（id無し、preds=null、入力は文字列）
        let json = r#"{
            "ts": 1700000000000,
            "img": {"name": "leaf.jpg", "size": 2048},
            "preds": null,
            "input": {"district":"Hyderabad","crop":"Tomato","disease":"blight","bp":"20","ac":"1.5"},
            "advisory": "Product X"
        }"#;

        let entry: HistoryEntry = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(entry.id, None);
        assert_eq!(entry.timestamp, 1_700_000_000_000);
        assert_eq!(entry.image.as_ref().map(|i| i.size), Some(2048));
        assert!(entry.predictions.is_empty());
        assert_eq!(entry.input.baseline_price_per_kg, "20");
        assert_eq!(entry.input.acreage, "1.5");
        assert_eq!(entry.key(), "ts-1700000000000");
    }

    #[test]
    fn test_history_entry_numeric_inputs_become_text() {
        let json = r#"{"ts": 1, "input": {"baseline_price_per_kg": 20.5, "acreage": 2}}"#;
        let entry: HistoryEntry = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(entry.input.baseline_price_per_kg, "20.5");
        assert_eq!(entry.input.acreage, "2");
    }

    #[test]
    fn test_history_entry_serialize_keys() {
        let entry = HistoryEntry {
            id: Some("h-1".to_string()),
            timestamp: 5,
            ..Default::default()
        };
        let json = serde_json::to_string(&entry).expect("シリアライズ失敗");
        assert!(json.contains("\"id\":\"h-1\""));
        assert!(json.contains("\"ts\":5"));
        assert!(json.contains("\"preds\":[]"));
        assert!(json.contains("\"bp\":\"\""));
        assert!(json.contains("\"advisory\":\"\""));
        assert_eq!(entry.key(), "h-1");
    }

    // =============================================
    // PriceEntry テスト
    // =============================================

    #[test]
    fn test_price_entry_payload_omits_id() {
        let entry = PriceEntry {
            id: Some(7),
            district: "Hyderabad".to_string(),
            unit_price_inr: 450.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&entry).expect("シリアライズ失敗");
        assert!(!json.contains("\"id\""));
        assert!(json.contains("\"unit_price_inr\":450.0"));
    }

    #[test]
    fn test_price_entry_deserialize_nulls() {
        let json = r#"{"id": 3, "district": "Pune", "notes": null, "unit_price_inr": null}"#;
        let entry: PriceEntry = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(entry.id, Some(3));
        assert_eq!(entry.notes, "");
        assert_eq!(entry.unit_price_inr, 0.0);
    }

    // =============================================
    // Theme / Preferences テスト
    // =============================================

    #[test]
    fn test_theme_parse_and_toggle() {
        assert_eq!(Theme::parse("dark"), Theme::Dark);
        assert_eq!(Theme::parse("solarized"), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().as_str(), "light");
    }

    #[test]
    fn test_preferences_speech_lang() {
        let mut prefs = Preferences::default();
        assert_eq!(prefs.speech_lang(), "en-IN");
        prefs.lang = "hi".to_string();
        assert_eq!(prefs.speech_lang(), "hi-IN");
    }
}
