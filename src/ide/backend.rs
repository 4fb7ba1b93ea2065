//! LSP Backend 実装

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use salsa::Setter;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionParams,
    CompletionResponse,
    DidChangeConfigurationParams,
    DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams,
    DidChangeWorkspaceFoldersParams,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
    DidSaveTextDocumentParams,
    ExecuteCommandParams,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverParams,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    Location,
    MessageType,
    ReferenceParams,
    Url,
    WorkspaceFolder,
};
use tower_lsp::{
    Client,
    LanguageServer,
};

use crate::config::{
    ConfigManager,
    LinguistSettings,
};
use crate::db::LinguistDatabaseImpl;
use crate::ide::diagnostics;
use crate::ide::handlers;
use crate::ide::state::ServerState;
use crate::indexer::{
    IndexedWorkspace,
    WorkspaceIndexer,
};
use crate::input::catalog::Catalog;
use crate::input::linguist;
use crate::input::source::{
    ProgrammingLanguage,
    SourceFile,
};
use crate::syntax::analyze_source;
use crate::types::SourcePosition;

/// ワークスペース設定ファイル名
const CONFIG_FILE_NAME: &str = ".qml-i18n.json";

/// LSP Backend
#[derive(Clone)]
pub struct Backend {
    /// LSP クライアント
    pub client: Client,
    /// 設定管理
    pub config_manager: Arc<Mutex<ConfigManager>>,
    /// ワークスペースインデクサー
    pub workspace_indexer: Arc<WorkspaceIndexer>,
    /// 共有状態（Salsa データベース、ソースファイル、カタログ）
    pub state: ServerState,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("workspace_indexer", &"<WorkspaceIndexer>")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// 新しい Backend を作成
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            workspace_indexer: Arc::new(WorkspaceIndexer::new()),
            state: ServerState::new(LinguistDatabaseImpl::default()),
        }
    }

    /// URI をファイルパスへ変換
    pub(crate) fn uri_to_path(uri: &Url) -> Option<PathBuf> {
        uri.to_file_path().map_or_else(
            |()| {
                tracing::warn!("Failed to convert URI to file path: {}", uri);
                None
            },
            Some,
        )
    }

    /// ワークスペース設定ファイルかどうか
    pub(crate) fn is_config_file(file_path: &Path) -> bool {
        file_path.file_name().is_some_and(|name| name == CONFIG_FILE_NAME)
    }

    /// 現在の設定のスナップショットを取得
    pub(crate) async fn settings(&self) -> LinguistSettings {
        self.config_manager.lock().await.get_settings().clone()
    }

    /// カタログファイル（`catalogFiles.filePattern` に一致）かどうか
    pub(crate) async fn is_catalog_file(&self, file_path: &Path) -> bool {
        let config = self.config_manager.lock().await;
        let settings = config.get_settings();

        let Ok(glob) = globset::Glob::new(&settings.catalog_files.file_pattern) else {
            return false;
        };
        let matcher = glob.compile_matcher();

        // パターンはワークスペース相対で照合する
        let relative = config
            .workspace_root()
            .and_then(|root| file_path.strip_prefix(root).ok())
            .unwrap_or(file_path);

        matcher.is_match(relative)
    }

    /// ワークスペースフォルダを取得
    ///
    /// # Errors
    /// クライアントとの通信に失敗した場合
    pub(crate) async fn get_workspace_folders(&self) -> Result<Vec<WorkspaceFolder>> {
        self.client.workspace_folders().await.map(Option::unwrap_or_default)
    }

    /// 全ワークスペースフォルダをインデックス
    pub(crate) async fn index_workspace_folders(&self) {
        let Ok(workspace_folders) = self.get_workspace_folders().await else {
            return;
        };

        for folder in workspace_folders {
            let Ok(workspace_path) = folder.uri.to_file_path() else {
                continue;
            };

            let config_manager = self.config_manager.lock().await;
            let index_result =
                self.workspace_indexer.index_workspace(&workspace_path, &config_manager).await;
            drop(config_manager);

            match index_result {
                Ok(indexed) => {
                    self.apply_indexed(indexed).await;
                    self.client
                        .log_message(MessageType::INFO, "Workspace indexing complete")
                        .await;
                }
                Err(error) => {
                    self.client
                        .log_message(
                            MessageType::ERROR,
                            format!("error indexing workspace: {error}"),
                        )
                        .await;
                }
            }
        }
    }

    /// インデックス結果を Salsa 入力へ変換して保存
    async fn apply_indexed(&self, indexed: IndexedWorkspace) {
        let (db, mut source_files, mut catalogs) = self.state.lock_all().await;

        for (path, content) in indexed.catalog_files {
            match linguist::parse_catalog(&content) {
                Ok(parsed) => {
                    catalogs.push(Catalog::from_parsed(&*db, &path.to_string_lossy(), parsed));
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Skipping unparsable catalog");
                }
            }
        }

        for (uri, content) in indexed.source_files {
            let Some(language) = ProgrammingLanguage::from_uri(uri.as_str()) else {
                continue;
            };
            let Ok(path) = uri.to_file_path() else {
                continue;
            };
            let source_file = SourceFile::new(&*db, uri.to_string(), content, language);
            source_files.insert(path, source_file);
        }
    }

    /// ワークスペースを再インデックス
    ///
    /// 新しい Salsa データベースを作成して、全ファイルを再インデックスします。
    /// これにより、設定変更が反映され、古いキャッシュがクリアされます。
    pub(crate) async fn reindex_workspace(&self) {
        self.client.log_message(MessageType::INFO, "Reindexing workspace...").await;

        {
            let (mut db, mut source_files, mut catalogs) = self.state.lock_all().await;
            *db = LinguistDatabaseImpl::default();
            source_files.clear();
            catalogs.clear();
        }

        self.index_workspace_folders().await;
        self.publish_catalog_diagnostics().await;
        self.send_diagnostics_to_opened_files().await;
    }

    /// ドキュメントの内容を更新して診断を送信
    ///
    /// カタログファイルは再パースし、ソースファイルは `SourceFile` 入力を
    /// 更新します（Salsa が依存クエリを自動的に無効化）。
    pub(crate) async fn update_and_diagnose(&self, uri: Url, text: String) {
        let Some(file_path) = Self::uri_to_path(&uri) else {
            return;
        };

        if self.is_catalog_file(&file_path).await {
            self.update_catalog(&file_path, text).await;
            self.publish_catalog_diagnostics().await;
            // カタログの変更はソースファイルの未知 ID 診断にも影響する
            self.send_diagnostics_to_opened_files().await;
            return;
        }

        let settings = self.settings().await;
        let diagnostics = {
            let (mut db, mut source_files, catalogs) = self.state.lock_all().await;

            let source_file = if let Some(existing) = source_files.get(&file_path) {
                existing.set_text(&mut *db).to(text);
                *existing
            } else {
                let Some(language) = ProgrammingLanguage::from_uri(uri.as_str()) else {
                    return;
                };
                let source_file = SourceFile::new(&*db, uri.to_string(), text, language);
                source_files.insert(file_path.clone(), source_file);
                source_file
            };

            diagnostics::generate_source_diagnostics(
                &*db,
                source_file,
                &catalogs,
                &settings.trans_fn_names,
            )
        };

        self.client.publish_diagnostics(uri.clone(), diagnostics, None).await;
        tracing::debug!(uri = %uri, "File changed and diagnostics sent");
    }

    /// カタログファイルを再パースして入力を更新
    pub(crate) async fn update_catalog(&self, file_path: &Path, text: String) {
        let parsed = match linguist::parse_catalog(&text) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(path = %file_path.display(), %error, "Failed to parse catalog");
                return;
            }
        };

        let (mut db, mut catalogs) = self.state.lock_db_and_catalogs().await;
        let path_str = file_path.to_string_lossy();

        let existing = catalogs.iter().copied().find(|c| c.file_path(&*db) == path_str.as_ref());
        if let Some(catalog) = existing {
            catalog.set_entries(&mut *db).to(parsed.entries);
            catalog.set_id_ranges(&mut *db).to(parsed.id_ranges);
            catalog.set_translation_ranges(&mut *db).to(parsed.translation_ranges);
            catalog.set_problems(&mut *db).to(parsed.problems);
        } else {
            catalogs.push(Catalog::from_parsed(&*db, &path_str, parsed));
        }
    }

    /// カタログをリストから削除
    pub(crate) async fn remove_catalog(&self, file_path: &Path) {
        let (db, mut catalogs) = self.state.lock_db_and_catalogs().await;
        let path_str = file_path.to_string_lossy();
        catalogs.retain(|c| c.file_path(&*db) != path_str.as_ref());
    }

    /// 全カタログの診断を生成して送信
    pub(crate) async fn publish_catalog_diagnostics(&self) {
        let settings = self.settings().await;

        let to_publish = {
            let (db, source_files, catalogs) = self.state.lock_all().await;

            // ソースコードで参照されている ID の集合（未使用メッセージ診断用）
            let used_ids: HashSet<String> = source_files
                .values()
                .flat_map(|file| {
                    analyze_source(&*db, *file, settings.trans_fn_names.clone())
                })
                .map(|usage| usage.id(&*db).text(&*db).clone())
                .collect();

            let mut to_publish = Vec::new();
            for catalog in catalogs.iter() {
                let diags = diagnostics::generate_catalog_diagnostics(
                    &*db,
                    *catalog,
                    &catalogs,
                    Some(&used_ids),
                    &settings,
                );

                if let Ok(uri) = Url::from_file_path(catalog.file_path(&*db)) {
                    to_publish.push((uri, diags));
                } else {
                    tracing::warn!(
                        "Failed to create URI from file path: {}",
                        catalog.file_path(&*db)
                    );
                }
            }
            to_publish
        };

        for (uri, diags) in to_publish {
            self.client.publish_diagnostics(uri, diags, None).await;
        }
    }

    /// 開いている全ソースファイルに診断を送信
    pub(crate) async fn send_diagnostics_to_opened_files(&self) {
        let opened: Vec<Url> = {
            let opened_files = self.state.opened_files.lock().await;
            opened_files.iter().cloned().collect()
        };
        let settings = self.settings().await;

        let mut to_publish = Vec::new();
        {
            let (db, source_files, catalogs) = self.state.lock_all().await;

            for uri in opened {
                let Some(file_path) = Self::uri_to_path(&uri) else {
                    continue;
                };
                let Some(source_file) = source_files.get(&file_path) else {
                    continue;
                };

                let diags = diagnostics::generate_source_diagnostics(
                    &*db,
                    *source_file,
                    &catalogs,
                    &settings.trans_fn_names,
                );
                to_publish.push((uri, diags));
            }
        }

        for (uri, diags) in to_publish {
            self.client.publish_diagnostics(uri, diags, None).await;
        }
    }

    /// カーソル位置のメッセージ ID を取得
    ///
    /// ソースファイルでは `qsTrId("...")` の文字列引数上、カタログファイル
    /// では `<message>` タグまたは `<translation>` 本文上で有効です。
    pub(crate) async fn message_id_text_at(
        &self,
        file_path: &Path,
        position: SourcePosition,
    ) -> Option<String> {
        let settings = self.settings().await;
        let (db, source_files, catalogs) = self.state.lock_all().await;

        if let Some(source_file) = source_files.get(file_path) {
            let usage = crate::syntax::message_use_at_position(
                &*db,
                *source_file,
                position,
                settings.trans_fn_names,
            )?;
            return Some(usage.id(&*db).text(&*db).clone());
        }

        let path_str = file_path.to_string_lossy();
        let catalog = catalogs.iter().find(|c| c.file_path(&*db) == path_str.as_ref())?;
        let id = catalog.message_id_at_position(&*db, position)?;
        Some(id.text(&*db).clone())
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::lifecycle::handle_initialize(self, params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        handlers::lifecycle::handle_initialized(self, params).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::lifecycle::handle_shutdown().await
    }

    async fn did_change_workspace_folders(&self, _: DidChangeWorkspaceFoldersParams) {
        self.client.log_message(MessageType::INFO, "workspace folders changed!").await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handlers::workspace::handle_did_change_configuration(self, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handlers::workspace::handle_did_change_watched_files(self, params).await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        handlers::document_sync::handle_did_open(self, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        handlers::document_sync::handle_did_change(self, params).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        handlers::document_sync::handle_did_save(self, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handlers::document_sync::handle_did_close(self, params).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        handlers::features::handle_hover(self, params).await
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        handlers::features::handle_completion(self, params).await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        handlers::features::handle_goto_definition(self, params).await
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        handlers::features::handle_references(self, params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        handlers::execute_command::handle_execute_command(self, params).await
    }
}
