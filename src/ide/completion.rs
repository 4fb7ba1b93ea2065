//! Completion implementation

use std::collections::HashMap;

use tower_lsp::lsp_types::{
    CompletionItem,
    CompletionItemKind,
    CompletionTextEdit,
    Documentation,
    MarkupContent,
    MarkupKind,
    Position,
    Range,
    TextEdit,
};
use tree_sitter::Parser;

use crate::db::LinguistDatabase;
use crate::input::catalog::Catalog;
use crate::input::source::ProgrammingLanguage;

/// Quote context for completion
#[derive(Debug, Clone)]
pub enum QuoteContext {
    /// No quotes - cursor at argument start (e.g., `qsTrId(|)`)
    NoQuotes { position: Position },

    /// Inside quotes (e.g., `qsTrId("|")` or `qsTrId("general-|")`)
    InsideQuotes { id_start: Position, id_end: Position },
}

#[derive(Debug, Clone)]
pub struct CompletionContext {
    pub partial_id: String,
    pub quote_context: QuoteContext,
}

/// Generates completion items for message ids.
///
/// 各 ID につき 1 件。documentation には全ロケールの翻訳
/// （未確定はソーステキストへのフォールバック値）を列挙します。
pub fn generate_completions(
    db: &dyn LinguistDatabase,
    catalogs: &[Catalog],
    partial_id: Option<&str>,
    quote_context: &QuoteContext,
    effective_language: Option<&str>,
) -> Vec<CompletionItem> {
    let mut completion_items = Vec::new();
    let mut id_translations: HashMap<String, Vec<(String, String)>> = HashMap::new();

    // Collect the display value for each id per locale
    for catalog in catalogs {
        let locale = catalog.locale(db);

        for (id, entry) in catalog.entries(db) {
            if let Some(partial) = partial_id
                && !partial.is_empty()
                && !id.contains(partial)
            {
                continue;
            }

            let display = entry.translated().unwrap_or(&entry.source).to_string();
            id_translations.entry(id.clone()).or_default().push((locale.clone(), display));
        }
    }

    for (id, locale_values) in id_translations {
        if locale_values.is_empty() {
            continue;
        }

        let mut doc_lines = Vec::new();
        for (locale, value) in &locale_values {
            doc_lines.push(format!("- **{locale}**: {value}"));
        }
        let documentation_text = doc_lines.join("\n");

        let detail = effective_language.and_then(|eff_lang| {
            locale_values
                .iter()
                .find(|(locale, _)| locale == eff_lang)
                .map(|(_, value)| value.clone())
        });

        let mut item = CompletionItem {
            label: id.clone(),
            kind: Some(CompletionItemKind::CONSTANT),
            detail,
            documentation: Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: documentation_text,
            })),
            ..Default::default()
        };

        match quote_context {
            QuoteContext::NoQuotes { position } => {
                let new_text = format!("\"{id}\"");
                item.text_edit = Some(CompletionTextEdit::Edit(TextEdit {
                    range: Range::new(*position, *position),
                    new_text,
                }));
            }
            QuoteContext::InsideQuotes { id_start, id_end } => {
                item.text_edit = Some(CompletionTextEdit::Edit(TextEdit {
                    range: Range::new(*id_start, *id_end),
                    new_text: id,
                }));
            }
        }

        completion_items.push(item);
    }

    completion_items.sort_by(|a, b| a.label.cmp(&b.label));

    completion_items
}

/// Extracts completion context at a cursor position using tree-sitter.
///
/// キャプチャクエリは空文字列（`qsTrId("")` の `string_fragment` なし）や
/// 引数なし（`qsTrId()`）にマッチしないため、ここではカーソル位置のノード
/// から `call_expression` まで遡って判定します。
#[must_use]
pub fn extract_completion_context(
    text: &str,
    language: ProgrammingLanguage,
    line: u32,
    character: u32,
    trans_fn_names: &[String],
) -> Option<CompletionContext> {
    let mut parser = Parser::new();
    parser.set_language(&language.tree_sitter_language()).ok()?;
    let tree = parser.parse(text, None)?;

    let point = tree_sitter::Point { row: line as usize, column: character as usize };
    let mut node = tree.root_node().descendant_for_point_range(point, point)?;

    let call = loop {
        if node.kind() == "call_expression" {
            break node;
        }
        node = node.parent()?;
    };

    let fn_node = call.child_by_field_name("function")?;
    if fn_node.kind() != "identifier" {
        return None;
    }
    let fn_name = fn_node.utf8_text(text.as_bytes()).ok()?;
    if !trans_fn_names.iter().any(|name| name == fn_name) {
        return None;
    }

    let arguments = call.child_by_field_name("arguments")?;

    // qsTrId(|) - no arguments yet
    let Some(first_arg) = arguments.named_child(0) else {
        #[allow(clippy::cast_possible_truncation)] // Column count won't exceed u32::MAX
        let insert_position =
            Position::new(line, (arguments.start_position().column + 1) as u32);

        return Some(CompletionContext {
            partial_id: String::new(),
            quote_context: QuoteContext::NoQuotes { position: insert_position },
        });
    };

    if first_arg.kind() != "string" {
        return None;
    }

    // 複数行文字列は対象外
    if first_arg.start_position().row != first_arg.end_position().row {
        return None;
    }

    let id_start_char = first_arg.start_position().column + 1;
    let id_end_char = first_arg.end_position().column.saturating_sub(1);

    let cursor_char = character as usize;
    if cursor_char < id_start_char || cursor_char > id_end_char {
        return None;
    }

    let line_text = text.lines().nth(line as usize)?;
    if id_start_char > line_text.len() || cursor_char > line_text.len() {
        return None;
    }
    let partial_id = line_text.get(id_start_char..cursor_char)?.to_string();

    #[allow(clippy::cast_possible_truncation)] // Column count won't exceed u32::MAX
    let id_start = Position::new(line, id_start_char as u32);
    #[allow(clippy::cast_possible_truncation)] // Column count won't exceed u32::MAX
    let id_end = Position::new(line, id_end_char as u32);

    Some(CompletionContext {
        partial_id,
        quote_context: QuoteContext::InsideQuotes { id_start, id_end },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::input::linguist::TranslationStatus;
    use crate::test_utils::create_catalog;

    fn fn_names() -> Vec<String> {
        vec!["qsTrId".to_string(), "QT_TRID_NOOP".to_string()]
    }

    fn inside_quotes() -> QuoteContext {
        QuoteContext::InsideQuotes {
            id_start: Position::new(0, 0),
            id_end: Position::new(0, 0),
        }
    }

    #[rstest]
    fn generate_completions_all_ids() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[
                ("general-ok", "Ok", "Так", TranslationStatus::Finished),
                ("general-cancel", "Cancel", "Адмяніць", TranslationStatus::Finished),
                ("wallet-send", "Send", "Адправіць", TranslationStatus::Finished),
            ],
        );

        let items = generate_completions(&db, &[catalog], None, &inside_quotes(), None);

        assert_that!(items.len(), eq(3));
        assert_that!(items[0].label, eq("general-cancel"));
        assert_that!(items[1].label, eq("general-ok"));
        assert_that!(items[2].label, eq("wallet-send"));
    }

    #[rstest]
    fn generate_completions_with_partial_id() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[
                ("general-ok", "Ok", "Так", TranslationStatus::Finished),
                ("general-cancel", "Cancel", "Адмяніць", TranslationStatus::Finished),
                ("wallet-send", "Send", "Адправіць", TranslationStatus::Finished),
            ],
        );

        let items =
            generate_completions(&db, &[catalog], Some("general-"), &inside_quotes(), None);

        assert_that!(items.len(), eq(2));
        assert_that!(items[0].label, eq("general-cancel"));
        assert_that!(items[1].label, eq("general-ok"));
    }

    #[rstest]
    fn generate_completions_multiple_locales() {
        let db = LinguistDatabaseImpl::default();

        let be_by = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[("general-ok", "Ok", "Так", TranslationStatus::Finished)],
        );
        let id_id = create_catalog(
            &db,
            "id_id",
            "/proj/i18n/id_ID.ts",
            &[("general-ok", "Ok", "Oke", TranslationStatus::Finished)],
        );

        let items = generate_completions(&db, &[be_by, id_id], None, &inside_quotes(), None);

        // 両ロケールが 1 件の documentation にまとまる
        assert_that!(items.len(), eq(1));
        assert_that!(items[0].label, eq("general-ok"));

        if let Some(Documentation::MarkupContent(content)) = &items[0].documentation {
            assert_that!(content.value, contains_substring("be_by"));
            assert_that!(content.value, contains_substring("id_id"));
            assert_that!(content.value, contains_substring("Так"));
            assert_that!(content.value, contains_substring("Oke"));
        } else {
            panic!("Expected markdown documentation");
        }
    }

    #[rstest]
    fn generate_completions_unfinished_falls_back_to_source() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "id_id",
            "/proj/i18n/id_ID.ts",
            &[("general-groth", "GROTH", "", TranslationStatus::Unfinished)],
        );

        let items = generate_completions(&db, &[catalog], None, &inside_quotes(), None);

        assert_that!(items.len(), eq(1));
        if let Some(Documentation::MarkupContent(content)) = &items[0].documentation {
            // 実行時に表示される値（ソーステキスト）を見せる
            assert_that!(content.value, contains_substring("**id_id**: GROTH"));
        } else {
            panic!("Expected markdown documentation");
        }
    }

    #[rstest]
    fn generate_completions_with_effective_language() {
        let db = LinguistDatabaseImpl::default();

        let be_by = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[("general-ok", "Ok", "Так", TranslationStatus::Finished)],
        );
        let id_id = create_catalog(
            &db,
            "id_id",
            "/proj/i18n/id_ID.ts",
            &[("general-ok", "Ok", "Oke", TranslationStatus::Finished)],
        );

        let items =
            generate_completions(&db, &[be_by, id_id], None, &inside_quotes(), Some("id_id"));

        assert_that!(items.len(), eq(1));
        assert_that!(items[0].detail, some(eq("Oke")));
    }

    #[rstest]
    fn generate_completions_effective_language_not_found() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[("general-ok", "Ok", "Так", TranslationStatus::Finished)],
        );

        let items =
            generate_completions(&db, &[catalog], None, &inside_quotes(), Some("fr_fr"));

        assert_that!(items.len(), eq(1));
        assert_that!(items[0].detail, none());
    }

    #[rstest]
    fn generate_completions_no_quotes_text_edit() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[("general-ok", "Ok", "Так", TranslationStatus::Finished)],
        );

        let position = Position::new(1, 5);
        let quote_context = QuoteContext::NoQuotes { position };

        let items = generate_completions(&db, &[catalog], None, &quote_context, None);

        assert_that!(items.len(), eq(1));

        // NoQuotes は引用符付きで挿入する
        if let Some(CompletionTextEdit::Edit(edit)) = &items[0].text_edit {
            assert_that!(edit.new_text, eq("\"general-ok\""));
            assert_that!(edit.range.start, eq(position));
            assert_that!(edit.range.end, eq(position));
        } else {
            panic!("Expected TextEdit");
        }
    }

    #[rstest]
    fn generate_completions_inside_quotes_text_edit() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[("general-ok", "Ok", "Так", TranslationStatus::Finished)],
        );

        let id_start = Position::new(1, 5);
        let id_end = Position::new(1, 13);
        let quote_context = QuoteContext::InsideQuotes { id_start, id_end };

        let items =
            generate_completions(&db, &[catalog], Some("general"), &quote_context, None);

        assert_that!(items.len(), eq(1));

        // InsideQuotes は引用符なしで置き換える
        if let Some(CompletionTextEdit::Edit(edit)) = &items[0].text_edit {
            assert_that!(edit.new_text, eq("general-ok"));
            assert_that!(edit.range.start, eq(id_start));
            assert_that!(edit.range.end, eq(id_end));
        } else {
            panic!("Expected TextEdit");
        }
    }

    #[rstest]
    fn generate_completions_empty_catalogs() {
        let db = LinguistDatabaseImpl::default();

        let items = generate_completions(&db, &[], None, &inside_quotes(), None);

        assert_that!(items, is_empty());
    }

    // カーソル位置からのコンテキスト抽出

    #[rstest]
    fn extract_context_inside_quotes_with_partial() {
        let text = r#"Text { text: qsTrId("general-ok") }"#;
        // Position 20 = " (opening quote)
        // Position 21 = g (id starts)
        // Position 29 = o ("general-" まで入力済み)
        let context =
            extract_completion_context(text, ProgrammingLanguage::Qml, 0, 29, &fn_names())
                .unwrap();

        assert_that!(context.partial_id, eq("general-"));
        if let QuoteContext::InsideQuotes { id_start, id_end } = context.quote_context {
            assert_that!(id_start, eq(Position::new(0, 21)));
            assert_that!(id_end, eq(Position::new(0, 31)));
        } else {
            panic!("Expected InsideQuotes");
        }
    }

    #[rstest]
    fn extract_context_empty_string() {
        let text = r#"const a = qsTrId("");"#;
        // Position 17 = " (opening quote), 18 = " (closing quote)
        let context = extract_completion_context(
            text,
            ProgrammingLanguage::JavaScript,
            0,
            18,
            &fn_names(),
        )
        .unwrap();

        assert_that!(context.partial_id, eq(""));
        assert_that!(
            matches!(context.quote_context, QuoteContext::InsideQuotes { .. }),
            eq(true)
        );
    }

    #[rstest]
    fn extract_context_no_arguments() {
        let text = r"const a = qsTrId();";
        // Position 16 = ( , 17 = )
        let context = extract_completion_context(
            text,
            ProgrammingLanguage::JavaScript,
            0,
            17,
            &fn_names(),
        )
        .unwrap();

        assert_that!(context.partial_id, eq(""));
        if let QuoteContext::NoQuotes { position } = context.quote_context {
            assert_that!(position, eq(Position::new(0, 17)));
        } else {
            panic!("Expected NoQuotes");
        }
    }

    #[rstest]
    fn extract_context_other_function_is_ignored() {
        let text = r#"const a = console.log("general-ok");"#;

        let context = extract_completion_context(
            text,
            ProgrammingLanguage::JavaScript,
            0,
            25,
            &fn_names(),
        );

        assert_that!(context.is_none(), eq(true));
    }

    #[rstest]
    fn extract_context_in_comment_does_not_trigger() {
        let text = "// qsTrId(\"general-ok\")\nconst a = 1;";

        let context = extract_completion_context(
            text,
            ProgrammingLanguage::JavaScript,
            0,
            15,
            &fn_names(),
        );

        assert_that!(context.is_none(), eq(true));
    }

    #[rstest]
    fn extract_context_respects_configured_fn_names() {
        let text = r#"const a = myTrId("general-ok");"#;
        let names = vec!["myTrId".to_string()];
        // Position 17 = " (opening quote), 18 = g
        let context =
            extract_completion_context(text, ProgrammingLanguage::JavaScript, 0, 20, &names)
                .unwrap();

        assert_that!(context.partial_id, eq("ge"));
    }
}
