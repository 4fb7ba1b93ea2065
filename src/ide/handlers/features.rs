//! LSP 機能ハンドラー
//!
//! `completion`, `hover`, `goto_definition`, `references` の処理を担当します。

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionParams,
    CompletionResponse,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverContents,
    HoverParams,
    Location,
    MarkupContent,
    MarkupKind,
    ReferenceParams,
};

use super::super::backend::Backend;
use crate::input::catalog::normalize_locale;

/// `textDocument/hover` リクエストを処理
pub async fn handle_hover(backend: &Backend, params: HoverParams) -> Result<Option<Hover>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Hover request");

    let Some(file_path) = Backend::uri_to_path(&uri) else {
        return Ok(None);
    };

    let source_position = crate::types::SourcePosition::from(position);

    // メッセージ ID を取得
    let Some(id_text) = backend.message_id_text_at(&file_path, source_position).await else {
        tracing::debug!("No message id found at position");
        return Ok(None);
    };

    let hover_text = {
        let settings = backend.settings().await;
        let primary_locales: Option<Vec<String>> = settings
            .primary_locales
            .as_ref()
            .map(|locales| locales.iter().map(|l| normalize_locale(l)).collect());

        let current_language = backend.state.current_language.lock().await.clone();
        let db = backend.state.db.lock().await;
        let catalogs = backend.state.catalogs.lock().await;
        let id = crate::interned::MessageId::new(&*db, id_text.clone());

        crate::ide::hover::generate_hover_content(
            &*db,
            id,
            &catalogs,
            &settings.source_language,
            current_language.as_deref(),
            primary_locales.as_deref(),
        )
    };

    let Some(hover_text) = hover_text else {
        tracing::debug!("No catalog entries found for id: {}", id_text);
        return Ok(None);
    };

    tracing::debug!("Generated hover content for id: {}", id_text);

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover_text,
        }),
        range: None,
    }))
}

/// `textDocument/completion` リクエストを処理
pub async fn handle_completion(
    backend: &Backend,
    params: CompletionParams,
) -> Result<Option<CompletionResponse>> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Completion request");

    let Some(file_path) = Backend::uri_to_path(&uri) else {
        return Ok(None);
    };

    let source_file = {
        let source_files = backend.state.source_files.lock().await;
        source_files.get(&file_path).copied()
    };

    let Some(source_file) = source_file else {
        tracing::debug!("Source file not found: {}", file_path.display());
        return Ok(None);
    };

    let settings = backend.settings().await;

    // ファイルの内容を取得してコンテキストを抽出
    let db = backend.state.db.lock().await;
    let text = source_file.text(&*db);
    let language = source_file.language(&*db);

    let completion_context = crate::ide::completion::extract_completion_context(
        text,
        language,
        position.line,
        position.character,
        &settings.trans_fn_names,
    );

    let Some(context) = completion_context else {
        tracing::debug!("Not in a message-id argument context");
        return Ok(None);
    };

    tracing::debug!(
        partial_id = ?context.partial_id,
        quote_context = ?context.quote_context,
        "Extracted completion context"
    );

    // 有効な言語を決定（currentLanguage → primaryLocales の先頭）
    let current_language = backend.state.current_language.lock().await.clone();
    let effective_language = current_language.or_else(|| {
        settings
            .primary_locales
            .as_ref()
            .and_then(|locales| locales.first())
            .map(|l| normalize_locale(l))
    });

    let catalogs = backend.state.catalogs.lock().await;
    let partial_id_opt =
        if context.partial_id.is_empty() { None } else { Some(context.partial_id.as_str()) };

    let items = crate::ide::completion::generate_completions(
        &*db,
        &catalogs,
        partial_id_opt,
        &context.quote_context,
        effective_language.as_deref(),
    );
    drop(catalogs);
    drop(db);

    tracing::debug!("Generated {} completion items", items.len());

    if items.is_empty() { Ok(None) } else { Ok(Some(CompletionResponse::Array(items))) }
}

/// `textDocument/definition` リクエストを処理
pub async fn handle_goto_definition(
    backend: &Backend,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Goto Definition request");

    let Some(file_path) = Backend::uri_to_path(&uri) else {
        return Ok(None);
    };

    let source_position = crate::types::SourcePosition::from(position);

    let Some(id_text) = backend.message_id_text_at(&file_path, source_position).await else {
        tracing::debug!("No message id found at position");
        return Ok(None);
    };

    // カタログ内の <message> 定義を検索
    let locations = {
        let (db, catalogs) = backend.state.lock_db_and_catalogs().await;
        let id = crate::interned::MessageId::new(&*db, id_text);
        crate::ide::goto_definition::find_definitions(&*db, id, &catalogs)
    };

    tracing::debug!("Found {} definitions for id", locations.len());

    if locations.is_empty() { Ok(None) } else { Ok(Some(GotoDefinitionResponse::Array(locations))) }
}

/// `textDocument/references` リクエストを処理
pub async fn handle_references(
    backend: &Backend,
    params: ReferenceParams,
) -> Result<Option<Vec<Location>>> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "References request");

    let Some(file_path) = Backend::uri_to_path(&uri) else {
        return Ok(None);
    };

    let source_position = crate::types::SourcePosition::from(position);

    let Some(id_text) = backend.message_id_text_at(&file_path, source_position).await else {
        tracing::debug!("No message id found at position");
        return Ok(None);
    };

    // 全ソースファイルから参照を検索
    let locations = {
        let settings = backend.settings().await;
        let (db, source_files) = backend.state.lock_db_and_source_files().await;
        let id = crate::interned::MessageId::new(&*db, id_text.clone());
        crate::ide::references::find_references(
            &*db,
            id,
            &source_files,
            &settings.trans_fn_names,
        )
    };

    tracing::debug!("Found {} references for id: {}", locations.len(), id_text);

    if locations.is_empty() { Ok(None) } else { Ok(Some(locations)) }
}
