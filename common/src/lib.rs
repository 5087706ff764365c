//! Kisan-Netra Common Library
//!
//! Web(WASM)クライアントとService Workerで共有される型とロジック。
//! ブラウザAPIには依存せず、ストアとキャッシュはトレイト越しに扱う。

pub mod api;
pub mod config;
pub mod error;
pub mod help;
pub mod history;
pub mod offline;
pub mod prediction;
pub mod prices;
pub mod recommend;
pub mod store;
pub mod types;
pub mod view;

pub use api::{Method, Route};
pub use config::{ClientConfig, CACHE_NAME, PRECACHE_ASSETS};
pub use error::{Error, Result, ValidationError};
pub use help::{field_help, FieldHelp};
pub use history::HistoryManager;
pub use offline::{AssetBackend, AssetRequest, MemoryBackend, OfflineCache};
pub use prediction::{PredictionFlow, PredictionState};
pub use prices::{PriceRow, PriceTable};
pub use recommend::{RecommendForm, RecommendOutcome, RecommendRequest};
pub use store::{KeyValueStore, MemoryStore};
pub use types::{
    Health, HistoryEntry, HistoryInput, ImageMeta, LatestAdvice, PredictResponse, Prediction,
    Preferences, PriceEntry, Recommendation, Theme,
};
pub use view::{View, ViewController};
