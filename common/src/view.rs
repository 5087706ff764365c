//! 画面（タブ）切り替え
//!
//! 常にちょうど1つの画面がアクティブ。どの画面からどの画面へも遷移でき、
//! 初期状態は `diagnose`。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Diagnose,
    Recommend,
    History,
    Prices,
    Settings,
}

impl View {
    /// タブの表示順
    pub const ALL: [View; 5] = [
        View::Diagnose,
        View::Recommend,
        View::History,
        View::Prices,
        View::Settings,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            View::Diagnose => "diagnose",
            View::Recommend => "recommend",
            View::History => "history",
            View::Prices => "prices",
            View::Settings => "settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Diagnose => "Diagnose",
            View::Recommend => "Recommend",
            View::History => "History",
            View::Prices => "Prices",
            View::Settings => "Settings",
        }
    }

    pub fn parse(id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.id() == id)
            .ok_or_else(|| Error::UnknownView(id.to_string()))
    }
}

/// アクティブな画面を保持する状態機械
#[derive(Debug, Clone, Default)]
pub struct ViewController {
    active: View,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> View {
        self.active
    }

    pub fn is_active(&self, view: View) -> bool {
        self.active == view
    }

    pub fn show(&mut self, view: View) {
        self.active = view;
    }

    /// id文字列で切り替え。不明なidは状態を変えずにエラー
    pub fn show_id(&mut self, id: &str) -> Result<View> {
        let view = View::parse(id)?;
        self.show(view);
        Ok(view)
    }
}
