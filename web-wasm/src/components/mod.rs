//! UIコンポーネント

pub mod diagnose;
pub mod header;
pub mod history;
pub mod info_modal;
pub mod prices;
pub mod recommend;
pub mod settings_panel;
pub mod tabs;
pub mod toast;
