//! LSP サーバーの共有状態

use std::collections::{
    HashMap,
    HashSet,
};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{
    Mutex,
    MutexGuard,
};

use crate::db::LinguistDatabaseImpl;
use crate::input::catalog::Catalog;
use crate::input::source::SourceFile;

/// LSP サーバーの共有状態
///
/// `Backend` から状態管理の責務を分離し、ハンドラー間で共有可能にします。
///
/// # ロック順序
///
/// 複数のロックを同時に取得する場合は、以下の順序を厳守してください：
/// 1. `db`
/// 2. `source_files` / `catalogs` / `opened_files` / `current_language`
#[derive(Clone)]
pub struct ServerState {
    /// Salsa データベース
    pub db: Arc<Mutex<LinguistDatabaseImpl>>,
    /// `SourceFile` 管理（ファイルパス → `SourceFile`）
    pub source_files: Arc<Mutex<HashMap<PathBuf, SourceFile>>>,
    /// ロケールカタログ
    pub catalogs: Arc<Mutex<Vec<Catalog>>>,
    /// 現在開いているファイルの URI
    pub opened_files: Arc<Mutex<HashSet<tower_lsp::lsp_types::Url>>>,
    /// ホバー等で優先表示するロケール（`setCurrentLanguage` で変更）
    pub current_language: Arc<Mutex<Option<String>>>,
}

impl ServerState {
    /// 新しい `ServerState` を作成
    pub fn new(db: LinguistDatabaseImpl) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            source_files: Arc::new(Mutex::new(HashMap::new())),
            catalogs: Arc::new(Mutex::new(Vec::new())),
            opened_files: Arc::new(Mutex::new(HashSet::new())),
            current_language: Arc::new(Mutex::new(None)),
        }
    }

    /// `db` と `catalogs` のロックを一括取得
    ///
    /// ロック順序（`db` → `catalogs`）を保証します。
    pub async fn lock_db_and_catalogs(
        &self,
    ) -> (MutexGuard<'_, LinguistDatabaseImpl>, MutexGuard<'_, Vec<Catalog>>) {
        let db = self.db.lock().await;
        let catalogs = self.catalogs.lock().await;
        (db, catalogs)
    }

    /// `db` と `source_files` のロックを一括取得
    ///
    /// ロック順序（`db` → `source_files`）を保証します。
    pub async fn lock_db_and_source_files(
        &self,
    ) -> (MutexGuard<'_, LinguistDatabaseImpl>, MutexGuard<'_, HashMap<PathBuf, SourceFile>>) {
        let db = self.db.lock().await;
        let source_files = self.source_files.lock().await;
        (db, source_files)
    }

    /// `db`, `source_files`, `catalogs` のロックを一括取得
    ///
    /// ロック順序（`db` → `source_files` → `catalogs`）を保証します。
    pub async fn lock_all(
        &self,
    ) -> (
        MutexGuard<'_, LinguistDatabaseImpl>,
        MutexGuard<'_, HashMap<PathBuf, SourceFile>>,
        MutexGuard<'_, Vec<Catalog>>,
    ) {
        let db = self.db.lock().await;
        let source_files = self.source_files.lock().await;
        let catalogs = self.catalogs.lock().await;
        (db, source_files, catalogs)
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("db", &"<LinguistDatabaseImpl>")
            .field("source_files", &"<HashMap<PathBuf, SourceFile>>")
            .field("catalogs", &"<Vec<Catalog>>")
            .field("opened_files", &"<HashSet<Url>>")
            .field("current_language", &"<Option<String>>")
            .finish()
    }
}
