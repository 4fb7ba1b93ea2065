//! Workspace-related handlers.

use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    DidChangeWatchedFilesParams,
    FileChangeType,
};

use super::super::backend::Backend;

pub async fn handle_did_change_configuration(
    backend: &Backend,
    params: DidChangeConfigurationParams,
) {
    tracing::info!(settings = %params.settings, "didChangeConfiguration received");

    let new_settings = serde_json::from_value::<crate::config::LinguistSettings>(
        params.settings.clone(),
    )
    .or_else(|_| {
        serde_json::from_value::<crate::config::ServerSettings>(params.settings)
            .map(|wrapped| wrapped.qml_i18n)
    });

    if let Ok(new_settings) = new_settings {
        let mut config_manager = backend.config_manager.lock().await;
        match config_manager.update_settings(new_settings) {
            Ok(()) => {
                drop(config_manager);
                tracing::info!("configuration updated successfully");

                backend.reindex_workspace().await;
            }
            Err(error) => {
                tracing::error!(%error, "configuration validation error");
            }
        }
    }
}

pub async fn handle_did_change_watched_files(
    backend: &Backend,
    params: DidChangeWatchedFilesParams,
) {
    let mut catalogs_changed = false;

    for change in params.changes {
        let Some(file_path) = Backend::uri_to_path(&change.uri) else {
            continue;
        };

        // 設定ファイルの変更は読み直して再インデックス
        if Backend::is_config_file(&file_path) {
            let workspace_root = {
                let mut config_manager = backend.config_manager.lock().await;
                let root = config_manager.workspace_root().cloned();
                if let Err(error) = config_manager.load_settings(root.clone()) {
                    tracing::error!(%error, "failed to reload configuration");
                    continue;
                }
                root
            };
            tracing::info!(?workspace_root, "configuration file changed, reindexing");
            backend.reindex_workspace().await;
            continue;
        }

        if backend.is_catalog_file(&file_path).await {
            tracing::debug!("Catalog file changed: {:?}, type: {:?}", file_path, change.typ);

            match change.typ {
                FileChangeType::CREATED | FileChangeType::CHANGED => {
                    match tokio::fs::read_to_string(&file_path).await {
                        Ok(text) => {
                            backend.update_catalog(&file_path, text).await;
                            catalogs_changed = true;
                        }
                        Err(error) => {
                            tracing::warn!(path = %file_path.display(), %error, "Failed to read catalog file");
                        }
                    }
                }
                FileChangeType::DELETED => {
                    backend.remove_catalog(&file_path).await;
                    catalogs_changed = true;
                }
                _ => {}
            }
        }
    }

    if catalogs_changed {
        backend.publish_catalog_diagnostics().await;
        backend.send_diagnostics_to_opened_files().await;
    }
}
