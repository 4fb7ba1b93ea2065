pub mod analyzer;

use crate::db::LinguistDatabase;
use crate::input::source::SourceFile;
use crate::interned::MessageId;
use crate::ir::message_use::MessageUse;
use crate::types::{
    SourcePosition,
    SourceRange,
};

/// Analyzes a source file and extracts message-id usages.
#[salsa::tracked]
#[allow(clippy::needless_pass_by_value)]
pub fn analyze_source(
    db: &dyn LinguistDatabase,
    file: SourceFile,
    trans_fn_names: Vec<String>,
) -> Vec<MessageUse<'_>> {
    let text = file.text(db);
    let language = file.language(db);
    let tree_sitter_lang = language.tree_sitter_language();
    let queries = analyzer::query_loader::load_queries(language);

    let calls = analyzer::extractor::analyze_tr_id_calls(
        text,
        &tree_sitter_lang,
        queries,
        &trans_fn_names,
    )
    .unwrap_or_default();

    calls
        .into_iter()
        .map(|call| {
            let id = MessageId::new(db, call.id);
            let range: SourceRange = call.id_node.into();
            let arg_range: SourceRange = call.id_arg_node.into();
            MessageUse::new(db, id, range, arg_range)
        })
        .collect()
}

/// Finds a message use at a specific position.
#[salsa::tracked]
#[allow(clippy::needless_pass_by_value)]
pub fn message_use_at_position(
    db: &dyn LinguistDatabase,
    file: SourceFile,
    position: SourcePosition,
    trans_fn_names: Vec<String>,
) -> Option<MessageUse<'_>> {
    let usages = analyze_source(db, file, trans_fn_names);
    usages.into_iter().find(|usage| usage.arg_range(db).contains(position))
}
