//! 推奨フロー
//!
//! フォームの文字列を型付きリクエストに変換し、レスポンスを
//! 成功（推奨カード）と失敗（サーバーメッセージ）に振り分ける。

use crate::error::{Result, ValidationError};
use crate::types::{HistoryInput, MessageBody, Recommendation};
use serde::Serialize;

/// 推奨フォームの入力値（入力されたままの文字列）
pub type RecommendForm = HistoryInput;

/// 一致する価格エントリが無いときの既定メッセージ
pub const NO_MATCH_MESSAGE: &str = "No local price entries found";

/// POST /recommend のリクエスト本体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendRequest {
    pub district: String,
    pub crop: String,
    pub disease: String,
    pub baseline_price_per_kg: f64,
    pub acreage: f64,
}

fn parse_number(field: &'static str, value: &str) -> std::result::Result<f64, ValidationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError {
            field,
            value: value.to_string(),
        })
}

impl RecommendRequest {
    /// フォーム入力を検証して組み立てる
    pub fn from_form(form: &RecommendForm) -> std::result::Result<Self, ValidationError> {
        Ok(Self {
            district: form.district.trim().to_string(),
            crop: form.crop.trim().to_string(),
            disease: form.disease.trim().to_string(),
            baseline_price_per_kg: parse_number("baseline_price_per_kg", &form.baseline_price_per_kg)?,
            acreage: parse_number("acreage", &form.acreage)?,
        })
    }
}

/// 推奨APIの結果
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendOutcome {
    Advice(Recommendation),
    NoMatch(String),
}

impl RecommendOutcome {
    /// HTTPステータスと本文から振り分ける
    ///
    /// 2xxで本文が壊れている場合はエラー。非2xxの本文は寛容に読む。
    pub fn from_response(status: u16, body: &str) -> Result<Self> {
        if (200..300).contains(&status) {
            let rec: Recommendation = serde_json::from_str(body)?;
            return Ok(RecommendOutcome::Advice(rec));
        }
        let message = serde_json::from_str::<MessageBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| NO_MATCH_MESSAGE.to_string());
        Ok(RecommendOutcome::NoMatch(message))
    }

    /// 履歴保存・音声再生ボタンを有効にするか
    pub fn actions_enabled(&self) -> bool {
        matches!(self, RecommendOutcome::Advice(_))
    }
}

/// 0.5を切り上げる丸め（ブラウザのMath.roundと同じ）
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

impl Recommendation {
    /// 推奨カードの行（バッジ, 本文）
    pub fn card_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "Product",
                format!("{} ({}) via {}", self.best_product, self.brand, self.dealer),
            ),
            ("Price", format!("₹{}", self.unit_price_inr)),
            ("Yield +%", format!("{}%", self.expected_yield_gain_pct)),
            ("Est. Profit", format!("₹{}", round_half_up(self.expected_profit_inr))),
        ]
    }

    /// 履歴に保存する助言テキスト
    pub fn advisory_text(&self) -> String {
        let mut lines: Vec<String> = self
            .card_lines()
            .into_iter()
            .map(|(badge, text)| format!("{badge} {text}"))
            .collect();
        lines.push(self.rationale.clone());
        lines.join("\n")
    }

    /// 音声読み上げ用の文
    pub fn speech_text(&self) -> String {
        format!(
            "Recommended {} by {} via {}. Price rupees {}. Estimated profit rupees {}.",
            self.best_product,
            self.brand,
            self.dealer,
            round_half_up(self.unit_price_inr),
            round_half_up(self.expected_profit_inr)
        )
    }
}
