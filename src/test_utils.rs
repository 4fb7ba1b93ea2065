//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]

use std::collections::HashMap;

use crate::db::LinguistDatabaseImpl;
use crate::input::catalog::Catalog;
use crate::input::linguist::{
    MessageEntry,
    TranslationStatus,
};

/// テスト用の Catalog を作成する
///
/// # Arguments
/// * `db` - Salsa データベース
/// * `locale` - ロケールコード（例: "be_by", "id_id"）
/// * `file_path` - カタログファイルのパス
/// * `entries` - メッセージ ID → (source, translation, status)
pub(crate) fn create_catalog(
    db: &LinguistDatabaseImpl,
    locale: &str,
    file_path: &str,
    entries: &[(&str, &str, &str, TranslationStatus)],
) -> Catalog {
    let entries: HashMap<String, MessageEntry> = entries
        .iter()
        .map(|(id, source, translation, status)| {
            (
                (*id).to_string(),
                MessageEntry {
                    source: (*source).to_string(),
                    translation: (*translation).to_string(),
                    status: *status,
                    extracomment: None,
                    oldsource: None,
                },
            )
        })
        .collect();

    Catalog::new(
        db,
        locale.to_string(),
        file_path.to_string(),
        entries,
        HashMap::new(),
        HashMap::new(),
        Vec::new(),
    )
}
