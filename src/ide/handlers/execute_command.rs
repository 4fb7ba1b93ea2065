//! Execute Command ハンドラー
//!
//! `workspace/executeCommand` リクエストを処理し、
//! カスタムコマンドを実行します。

use serde::Deserialize;
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    ExecuteCommandParams,
    MessageType,
};

use super::super::backend::Backend;
use crate::input::catalog::normalize_locale;

/// `workspace/executeCommand` リクエストを処理
pub async fn handle_execute_command(
    backend: &Backend,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    tracing::debug!(command = %params.command, "Execute Command request");

    match params.command.as_str() {
        "qmlI18n.resolveMessage" => handle_resolve_message(backend, Some(params.arguments)).await,
        "qmlI18n.getCurrentLanguage" => handle_get_current_language(backend).await,
        "qmlI18n.setCurrentLanguage" => {
            handle_set_current_language(backend, Some(params.arguments)).await
        }
        _ => {
            tracing::warn!("Unknown command: {}", params.command);
            Ok(None)
        }
    }
}

/// `qmlI18n.resolveMessage` コマンドの引数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveMessageArgs {
    /// 対象ロケール（例: "be_BY"）
    locale: String,
    /// メッセージ ID
    message_id: String,
    /// `%1`, `%2`, ... を置き換える引数
    #[serde(default)]
    args: Vec<String>,
    /// `%n` を置き換える数値
    #[serde(default)]
    count: Option<i64>,
}

/// `qmlI18n.resolveMessage` コマンドを実行
///
/// 実行時と同じフォールバック規則で表示文字列を解決して返す。
/// どのカタログも ID を知らない場合は `null`。
///
/// # Arguments
/// * `arguments[0]` - `ResolveMessageArgs` オブジェクト
async fn handle_resolve_message(
    backend: &Backend,
    arguments: Option<Vec<Value>>,
) -> Result<Option<Value>> {
    let args = arguments.unwrap_or_default();

    let Some(first_arg) = args.first().cloned() else {
        tracing::warn!("Missing arguments for qmlI18n.resolveMessage");
        return Ok(Some(Value::Null));
    };

    let parsed_args: ResolveMessageArgs = match serde_json::from_value(first_arg) {
        Ok(args) => args,
        Err(e) => {
            tracing::warn!("Invalid arguments for qmlI18n.resolveMessage: {}", e);
            return Ok(Some(Value::Null));
        }
    };

    tracing::debug!(
        locale = %parsed_args.locale,
        message_id = %parsed_args.message_id,
        "Executing qmlI18n.resolveMessage"
    );

    let resolved = {
        let (db, catalogs) = backend.state.lock_db_and_catalogs().await;
        crate::resolve::resolve(
            &*db,
            &catalogs,
            &parsed_args.locale,
            &parsed_args.message_id,
            &parsed_args.args,
            parsed_args.count,
        )
    };

    Ok(Some(resolved.map_or(Value::Null, Value::String)))
}

/// `qmlI18n.getCurrentLanguage` コマンドを実行
async fn handle_get_current_language(backend: &Backend) -> Result<Option<Value>> {
    let current = backend.state.current_language.lock().await.clone();
    Ok(Some(current.map_or(Value::Null, Value::String)))
}

/// `qmlI18n.setCurrentLanguage` コマンドの引数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetCurrentLanguageArgs {
    /// 設定するロケール（null でリセット）
    language: Option<String>,
}

/// `qmlI18n.setCurrentLanguage` コマンドを実行
///
/// ホバーや補完で優先表示するロケールを変更する。
///
/// # Arguments
/// * `arguments[0]` - `SetCurrentLanguageArgs` オブジェクト
///
/// # Returns
/// 成功時は `null`
async fn handle_set_current_language(
    backend: &Backend,
    arguments: Option<Vec<Value>>,
) -> Result<Option<Value>> {
    let args = arguments.unwrap_or_default();

    let parsed_args: SetCurrentLanguageArgs = if let Some(first_arg) = args.first().cloned() {
        match serde_json::from_value(first_arg) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!("Invalid arguments for qmlI18n.setCurrentLanguage: {}", e);
                return Ok(None);
            }
        }
    } else {
        // 引数なしの場合はリセット
        SetCurrentLanguageArgs { language: None }
    };

    tracing::debug!(
        language = ?parsed_args.language,
        "Executing qmlI18n.setCurrentLanguage"
    );

    // カタログのロケールと同じ正規化形で保持する
    let normalized = parsed_args.language.as_deref().map(normalize_locale);

    let mut current_language = backend.state.current_language.lock().await;
    current_language.clone_from(&normalized);
    drop(current_language);

    backend
        .client
        .log_message(MessageType::INFO, format!("Current language set to: {normalized:?}"))
        .await;

    Ok(None)
}
