//! Salsa データベース定義

/// Linguist LSP のデータベーストレイト
#[salsa::db]
pub trait LinguistDatabase: salsa::Database {}

/// Linguist データベースの実装
#[salsa::db]
#[derive(Default, Clone)]
pub struct LinguistDatabaseImpl {
    /// Salsa のストレージ
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for LinguistDatabaseImpl {}

#[salsa::db]
impl LinguistDatabase for LinguistDatabaseImpl {}
