//! バックエンドREST API呼び出し

pub mod client;

pub use client::*;
