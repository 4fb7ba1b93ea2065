//! qml-i18n-language-server
//!
//! Qt Linguist の ID ベース翻訳カタログ（`.ts`）を扱う QML/JavaScript
//! プロジェクト向けの Language Server Protocol (LSP) 実装

pub mod config;
pub mod db;
pub mod ide;
pub mod indexer;
pub mod input;
pub mod interned;
pub mod ir;
pub mod placeholder;
pub mod resolve;
pub mod syntax;
mod test_utils;
pub mod types;

// Backend を再エクスポート
pub use ide::backend::Backend;
