//! ワークスペース走査とファイル読み込み

use std::path::{
    Path,
    PathBuf,
};

use futures::StreamExt;
use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;
use tower_lsp::lsp_types::Url;

use crate::config::ConfigManager;
use crate::indexer::types::{
    IndexedWorkspace,
    IndexerError,
};

/// Discovers and reads catalog and source files in a workspace.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceIndexer;

/// 走査結果の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Catalog,
    Source,
}

impl WorkspaceIndexer {
    /// 新しいインデクサーを作成
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// ワークスペースをインデックス
    ///
    /// カタログファイル（`catalogFiles.filePattern`）とソースファイル
    /// （`includePatterns` − `excludePatterns`）を収集し、設定された並列数
    /// （デフォルトは CPU コアの 80%）で読み込む。
    ///
    /// # Errors
    /// Returns [`IndexerError`] if a glob pattern fails to build. Unreadable
    /// files are logged and skipped.
    pub async fn index_workspace(
        &self,
        workspace_path: &Path,
        config_manager: &ConfigManager,
    ) -> Result<IndexedWorkspace, IndexerError> {
        tracing::debug!(workspace_path = %workspace_path.display(), "Indexing workspace");
        let settings = config_manager.get_settings();

        let include_set = build_glob_set(&settings.include_patterns, "include")?;
        let exclude_set = build_glob_set(&settings.exclude_patterns, "exclude")?;
        let catalog_set =
            build_glob_set(std::slice::from_ref(&settings.catalog_files.file_pattern), "catalog")?;

        let files =
            Self::find_files(workspace_path, &include_set, &exclude_set, &catalog_set);

        let num_threads = settings
            .indexing
            .num_threads
            .unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1));

        let mut indexed = IndexedWorkspace::default();
        let mut reads = futures::stream::iter(files)
            .map(|(path, kind)| async move {
                let content = tokio::fs::read_to_string(&path).await;
                (path, kind, content)
            })
            .buffer_unordered(num_threads);

        while let Some((path, kind, content)) = reads.next().await {
            let content = match content {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Failed to read file {:?}: {}", path, e);
                    continue;
                }
            };

            match kind {
                FileKind::Catalog => indexed.catalog_files.push((path, content)),
                FileKind::Source => {
                    let Ok(uri) = Url::from_file_path(&path) else {
                        tracing::warn!("Failed to create URI for file {:?}", path);
                        continue;
                    };
                    indexed.source_files.push((uri, content));
                }
            }
        }

        // 読み込みは並列なので、決定的な順序に揃えてから返す
        indexed.catalog_files.sort_by(|a, b| a.0.cmp(&b.0));
        indexed.source_files.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::info!(
            catalogs = indexed.catalog_files.len(),
            sources = indexed.source_files.len(),
            "Workspace indexed"
        );

        Ok(indexed)
    }

    /// 対象ファイルを検索して分類
    fn find_files(
        workspace_path: &Path,
        include_set: &GlobSet,
        exclude_set: &GlobSet,
        catalog_set: &GlobSet,
    ) -> Vec<(PathBuf, FileKind)> {
        let mut found_files = Vec::new();

        // ignore クレートでファイルを走査
        for result in WalkBuilder::new(workspace_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            // ファイルのみを対象
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();

            // workspace からの相対パスで照合
            let Ok(relative_path) = path.strip_prefix(workspace_path) else {
                continue;
            };
            if exclude_set.is_match(relative_path) {
                continue;
            }

            if catalog_set.is_match(relative_path) {
                found_files.push((path.to_path_buf(), FileKind::Catalog));
            } else if include_set.is_match(relative_path) {
                found_files.push((path.to_path_buf(), FileKind::Source));
            }
        }

        found_files
    }
}

fn build_glob_set(patterns: &[String], label: &str) -> Result<GlobSet, IndexerError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            IndexerError::Error(format!("Invalid {label} pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| IndexerError::Error(format!("Failed to build {label} patterns: {e}")))
}
