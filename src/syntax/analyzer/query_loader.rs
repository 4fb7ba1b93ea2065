//! Load Tree-sitter queries from files.

use std::sync::OnceLock;

use tree_sitter::Query;

use crate::input::source::ProgrammingLanguage;

struct QueryFile {
    content: &'static str,
    name: &'static str,
}

/// QML も JavaScript 文法で解析するため、クエリは一種類で足りる
const JS_QUERIES: &[QueryFile] = &[QueryFile {
    content: include_str!("../../../queries/javascript/qt-trid.scm"),
    name: "qt-trid",
}];

static JS_QUERY_CACHE: OnceLock<Vec<Query>> = OnceLock::new();

fn parse_queries(language: ProgrammingLanguage) -> Vec<Query> {
    let tree_sitter_lang = language.tree_sitter_language();

    JS_QUERIES
        .iter()
        .filter_map(|qf| {
            Query::new(&tree_sitter_lang, qf.content)
                .map_err(|e| tracing::error!("Failed to parse {} query: {e:?}", qf.name))
                .ok()
        })
        .collect()
}

/// Loads cached queries for a language. Queries are parsed once.
#[must_use]
pub fn load_queries(language: ProgrammingLanguage) -> &'static [Query] {
    match language {
        ProgrammingLanguage::Qml | ProgrammingLanguage::JavaScript => {
            JS_QUERY_CACHE.get_or_init(|| parse_queries(ProgrammingLanguage::JavaScript))
        }
    }
}
