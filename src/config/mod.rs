//! サーバー設定（`.qml-i18n.json`）の型・読み込み・管理

mod loader;
mod manager;
mod types;

pub use manager::ConfigManager;
pub use types::{
    CatalogFilesConfig,
    ConfigError,
    DiagnosticsConfig,
    LinguistSettings,
    ServerSettings,
    ValidationError,
};
