//! エラー型定義

use thiserror::Error;

/// 入力フォームの検証エラー
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field} is not a valid number: {value:?}")]
pub struct ValidationError {
    /// フォーム上のフィールド名
    pub field: &'static str,
    /// 入力されたままの文字列
    pub value: String,
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend not reachable: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Cache error: {0}")]
    Cache(String),

    /// キャンバス・音声・ファイル読込などブラウザAPIの失敗
    #[error("Browser API error: {0}")]
    Browser(String),
}

impl Error {
    /// バックエンドに到達できなかったエラーか
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        let display = format!("{}", error);
        assert!(display.contains("JSON error"));
    }

    #[test]
    fn test_error_display_http() {
        let error = Error::Http {
            status: 404,
            message: "no local price entries found".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP 404: no local price entries found");
    }

    #[test]
    fn test_error_display_validation() {
        let error: Error = ValidationError {
            field: "acreage",
            value: "two".to_string(),
        }
        .into();
        assert_eq!(error.to_string(), "acreage is not a valid number: \"two\"");
        assert!(matches!(error, Error::Validation(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_error_is_unreachable() {
        assert!(Error::Network("connection refused".into()).is_unreachable());
        assert!(!Error::Storage("quota".into()).is_unreachable());
        assert!(!Error::Browser("no 2d context".into()).is_unreachable());
        let http = Error::Http {
            status: 503,
            message: String::new(),
        };
        assert!(!http.is_unreachable());
    }

    #[test]
    fn test_error_display_browser() {
        let error = Error::Browser("speechSynthesis unavailable".to_string());
        assert_eq!(error.to_string(), "Browser API error: speechSynthesis unavailable");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::UnknownView("settingz".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("UnknownView"));
        assert!(debug.contains("settingz"));
    }
}
