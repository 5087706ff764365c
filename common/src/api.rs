//! REST API のルート定義
//!
//! すべて `ClientConfig::api_base`（既定 `/api`）配下。

use crate::prices::{DeleteTarget, SaveTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Labels,
    Predict,
    Recommend,
    ListPrices,
    CreatePrice,
    UpdatePrice(i64),
    DeletePrice(i64),
    ExportPrices,
    ImportPrices,
}

impl Route {
    pub fn method(&self) -> Method {
        match self {
            Route::Health | Route::Labels | Route::ListPrices | Route::ExportPrices => Method::Get,
            Route::Predict | Route::Recommend | Route::CreatePrice | Route::ImportPrices => {
                Method::Post
            }
            Route::UpdatePrice(_) => Method::Put,
            Route::DeletePrice(_) => Method::Delete,
        }
    }

    /// ベースパスからの相対パス
    pub fn path(&self) -> String {
        match self {
            Route::Health => "health".into(),
            Route::Labels => "labels".into(),
            Route::Predict => "predict".into(),
            Route::Recommend => "recommend".into(),
            Route::ListPrices | Route::CreatePrice => "prices".into(),
            Route::UpdatePrice(id) | Route::DeletePrice(id) => format!("prices/{id}"),
            Route::ExportPrices => "prices/export".into(),
            Route::ImportPrices => "prices/import".into(),
        }
    }
}

impl From<&SaveTarget> for Route {
    fn from(target: &SaveTarget) -> Self {
        match target {
            SaveTarget::Create => Route::CreatePrice,
            SaveTarget::Update(id) => Route::UpdatePrice(*id),
        }
    }
}

impl DeleteTarget {
    /// リモート削除が必要な場合のルート
    pub fn route(&self) -> Option<Route> {
        match self {
            DeleteTarget::LocalOnly => None,
            DeleteTarget::Remote(id) => Some(Route::DeletePrice(*id)),
        }
    }
}

/// multipartのフィールド名
pub const PREDICT_FIELD: &str = "image";
pub const PREDICT_FILE_NAME: &str = "upload.png";
pub const IMPORT_FIELD: &str = "file";
