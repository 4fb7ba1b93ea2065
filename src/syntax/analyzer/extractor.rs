//! Extracts `qsTrId`-style function calls from source code using Tree-sitter.

use std::string::ToString;

use tower_lsp::lsp_types::{
    Position,
    Range,
};
use tree_sitter::{
    Language,
    Node,
    Parser,
    Query,
    QueryCursor,
    StreamingIteratorMut,
};

use crate::syntax::analyzer::types::{
    AnalyzerError,
    CaptureName,
    TrIdCall,
};

/// Extracts text content from a tree-sitter node
fn extract_node_text(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    node.utf8_text(source_bytes).ok().map(ToString::to_string)
}

/// Gets the range of a tree-sitter node
#[allow(clippy::cast_possible_truncation)] // ソースファイルの行・列が42億を超えることはない
fn get_node_range(node: Node<'_>) -> Range {
    let start_pos = node.start_position();
    let end_pos = node.end_position();
    Range::new(
        Position::new(start_pos.row as u32, start_pos.column as u32),
        Position::new(end_pos.row as u32, end_pos.column as u32),
    )
}

/// Extracts message-id function calls from a source file.
///
/// Only calls whose function name appears in `trans_fn_names` are returned
/// (`qsTrId` and `QT_TRID_NOOP` by default, configurable). QML files are
/// parsed with the JavaScript grammar; property bindings come out as
/// labeled statements and the call expressions inside them are intact.
///
/// # Errors
/// Returns `AnalyzerError` if language setup or parsing fails.
pub fn analyze_tr_id_calls(
    source: &str,
    language: &Language,
    queries: &[Query],
    trans_fn_names: &[String],
) -> Result<Vec<TrIdCall>, AnalyzerError> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(AnalyzerError::LanguageSetup)?;
    let tree = parser.parse(source, None).ok_or(AnalyzerError::ParseFailed)?;

    let source_bytes = source.as_bytes();
    let root_node = tree.root_node();

    let mut calls = Vec::new();

    for query in queries {
        let cap_names = query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, root_node, source_bytes);

        while let Some(match_) = matches.next_mut() {
            let mut fn_name: Option<String> = None;
            let mut id: Option<String> = None;
            let mut id_node: Option<Node<'_>> = None;
            let mut id_arg_node: Option<Node<'_>> = None;

            for capture in match_.captures {
                let Some(cap_name) = cap_names.get(capture.index as usize) else {
                    continue;
                };
                let Ok(capture_name) = cap_name.parse::<CaptureName>() else {
                    continue;
                };

                match capture_name {
                    CaptureName::CallFnName => {
                        fn_name = extract_node_text(capture.node, source_bytes);
                    }
                    CaptureName::MessageId => {
                        id = extract_node_text(capture.node, source_bytes);
                        id_node = Some(capture.node);
                    }
                    CaptureName::MessageIdArg => {
                        id_arg_node = Some(capture.node);
                    }
                    CaptureName::Call => {}
                }
            }

            let (Some(fn_name), Some(id), Some(id_node), Some(id_arg_node)) =
                (fn_name, id, id_node, id_arg_node)
            else {
                continue;
            };

            if !trans_fn_names.iter().any(|name| name == &fn_name) {
                continue;
            }

            calls.push(TrIdCall {
                id,
                id_node: get_node_range(id_node),
                id_arg_node: get_node_range(id_arg_node),
                fn_name,
            });
        }
    }

    // クエリが複数ある場合に備えて位置順に揃える
    calls.sort_by_key(|call| (call.id_node.start.line, call.id_node.start.character));

    Ok(calls)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;
    use tree_sitter::{
        Language,
        Query,
    };

    use super::*;

    /// JavaScript 言語パーサー
    #[fixture]
    fn js_lang() -> Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    /// Tree-sitter クエリ
    #[fixture]
    fn queries(js_lang: Language) -> Vec<Query> {
        let content = include_str!("../../../queries/javascript/qt-trid.scm");
        vec![Query::new(&js_lang, content).unwrap_or_else(|e| panic!("invalid query: {e}"))]
    }

    fn default_fn_names() -> Vec<String> {
        vec!["qsTrId".to_string(), "QT_TRID_NOOP".to_string()]
    }

    #[rstest]
    fn test_simple_call(queries: Vec<Query>, js_lang: Language) {
        let code = r#"const message = qsTrId("general-ok");"#;

        let calls = analyze_tr_id_calls(code, &js_lang, &queries, &default_fn_names()).unwrap();

        assert_that!(
            calls,
            elements_are![all![
                field!(TrIdCall.id, eq("general-ok")),
                field!(TrIdCall.fn_name, eq("qsTrId"))
            ]]
        );
    }

    #[rstest]
    fn test_qml_property_binding(queries: Vec<Query>, js_lang: Language) {
        // QML のプロパティバインディングは JS のラベル付き文として解析される
        let code = r#"
            Button {
                text: qsTrId("general-cancel")
                palette.buttonText: qsTrId("general-ok")
            }
            "#;

        let calls = analyze_tr_id_calls(code, &js_lang, &queries, &default_fn_names()).unwrap();

        assert_that!(
            calls,
            elements_are![
                field!(TrIdCall.id, eq("general-cancel")),
                field!(TrIdCall.id, eq("general-ok"))
            ]
        );
    }

    #[rstest]
    fn test_noop_macro(queries: Vec<Query>, js_lang: Language) {
        let code = r#"const id = QT_TRID_NOOP("settings-title");"#;

        let calls = analyze_tr_id_calls(code, &js_lang, &queries, &default_fn_names()).unwrap();

        assert_that!(calls, elements_are![field!(TrIdCall.id, eq("settings-title"))]);
    }

    #[rstest]
    fn test_other_functions_are_ignored(queries: Vec<Query>, js_lang: Language) {
        let code = r#"
            const a = qsTr("not id based");
            const b = console.log("nope");
            const c = qsTrId("the-one");
            "#;

        let calls = analyze_tr_id_calls(code, &js_lang, &queries, &default_fn_names()).unwrap();

        assert_that!(calls, elements_are![field!(TrIdCall.id, eq("the-one"))]);
    }

    #[rstest]
    fn test_configured_fn_names(queries: Vec<Query>, js_lang: Language) {
        let code = r#"const message = trId("custom-id");"#;

        let calls =
            analyze_tr_id_calls(code, &js_lang, &queries, &["trId".to_string()]).unwrap();

        assert_that!(calls, elements_are![field!(TrIdCall.id, eq("custom-id"))]);
    }

    #[rstest]
    // 引用符のパターン
    #[case::double_quotes(r#"qsTrId("general-ok")"#, "general-ok")]
    #[case::single_quotes(r"qsTrId('general-ok')", "general-ok")]
    // 空白のパターン
    #[case::spaces_around(r#"qsTrId( "general-ok" )"#, "general-ok")]
    #[case::newlines("qsTrId(\n  \"general-ok\"\n)", "general-ok")]
    // 実際の ID 形式
    #[case::hyphenated(r#"qsTrId("atomic-swap-accept")"#, "atomic-swap-accept")]
    #[case::numbered(r#"qsTrId("wallet-txs-copy-addr-cm")"#, "wallet-txs-copy-addr-cm")]
    fn test_various_argument_patterns(
        queries: Vec<Query>,
        js_lang: Language,
        #[case] call: &str,
        #[case] expected_id: &str,
    ) {
        let code = format!("const message = {call};");

        let calls = analyze_tr_id_calls(&code, &js_lang, &queries, &default_fn_names()).unwrap();

        assert_that!(calls, elements_are![field!(TrIdCall.id, eq(expected_id))]);
    }

    /// 文字列リテラル以外の引数は検出されない
    #[rstest]
    #[case::template_literal(r"qsTrId(`template-${variable}`)")]
    #[case::variable(r"qsTrId(someVariable)")]
    #[case::number(r"qsTrId(123)")]
    #[case::no_args(r"qsTrId()")]
    fn test_invalid_first_argument_patterns(
        queries: Vec<Query>,
        js_lang: Language,
        #[case] call: &str,
    ) {
        let code = format!("const message = {call};");

        let calls = analyze_tr_id_calls(&code, &js_lang, &queries, &default_fn_names()).unwrap();

        assert_that!(calls, is_empty());
    }

    /// 置換引数付きの呼び出しも ID は検出される
    #[rstest]
    fn test_call_with_arg_substitution(queries: Vec<Query>, js_lang: Language) {
        let code = r#"const label = qsTrId("settings-fee-rate").arg(feeRate);"#;

        let calls = analyze_tr_id_calls(code, &js_lang, &queries, &default_fn_names()).unwrap();

        assert_that!(calls, elements_are![field!(TrIdCall.id, eq("settings-fee-rate"))]);
    }

    #[rstest]
    fn test_empty_code(queries: Vec<Query>, js_lang: Language) {
        let calls = analyze_tr_id_calls("", &js_lang, &queries, &default_fn_names()).unwrap();

        assert_that!(calls, is_empty());
    }

    #[rstest]
    #[googletest::test]
    fn test_id_node_range_excludes_quotes(queries: Vec<Query>, js_lang: Language) {
        let code = r#"qsTrId("general-ok")"#;

        let calls = analyze_tr_id_calls(code, &js_lang, &queries, &default_fn_names()).unwrap();

        let call = &calls[0];
        expect_that!(call.id_node.start.character, eq(8));
        expect_that!(call.id_node.end.character, eq(18));
        // 引数ノードは引用符を含む
        expect_that!(call.id_arg_node.start.character, eq(7));
        expect_that!(call.id_arg_node.end.character, eq(19));
    }
}
