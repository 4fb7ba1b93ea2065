//! References implementation

use std::collections::HashMap;
use std::path::PathBuf;

use tower_lsp::lsp_types::Location;

use crate::db::LinguistDatabase;
use crate::input::source::SourceFile;
use crate::interned::MessageId;
use crate::syntax::analyze_source;

/// Find all `qsTrId`/`QT_TRID_NOOP` call sites for a message id
///
/// # Arguments
/// * `db` - Salsa database
/// * `id` - The message id to search for
/// * `source_files` - Map of all source files (`PathBuf` -> `SourceFile`)
/// * `trans_fn_names` - 検出対象の関数名
///
/// # Returns
/// List of locations where the id is used
pub fn find_references<S: std::hash::BuildHasher>(
    db: &dyn LinguistDatabase,
    id: MessageId<'_>,
    source_files: &HashMap<PathBuf, SourceFile, S>,
    trans_fn_names: &[String],
) -> Vec<Location> {
    let id_text = id.text(db);
    let mut locations = Vec::new();

    for source_file in source_files.values() {
        // Salsa がキャッシュするので再解析は差分のみ
        let usages = analyze_source(db, *source_file, trans_fn_names.to_vec());

        for usage in usages {
            let usage_id = usage.id(db);
            if usage_id.text(db) == id_text {
                let range = usage.range(db);
                let uri = source_file.uri(db);

                // URI のパースに失敗した場合はスキップ
                let Ok(parsed_uri) = uri.parse() else {
                    tracing::warn!("Failed to parse URI: {}", uri);
                    continue;
                };

                locations.push(Location { uri: parsed_uri, range: range.into() });
            }
        }
    }

    locations
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use googletest::prelude::*;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::input::source::{
        ProgrammingLanguage,
        SourceFile,
    };
    use crate::interned::MessageId;

    fn fn_names() -> Vec<String> {
        vec!["qsTrId".to_string(), "QT_TRID_NOOP".to_string()]
    }

    #[googletest::test]
    fn test_find_references_single_file() {
        let db = LinguistDatabaseImpl::default();

        // 同じ ID を複数回使用
        let source_code = r#"
            Text { text: qsTrId("general-ok") }
            Text { text: qsTrId("general-cancel") }
            Button { text: qsTrId("general-ok") }
        "#;
        let source_file = SourceFile::new(
            &db,
            "file:///test.qml".to_string(),
            source_code.to_string(),
            ProgrammingLanguage::Qml,
        );

        let mut source_files = HashMap::new();
        source_files.insert(PathBuf::from("/test.qml"), source_file);

        let id = MessageId::new(&db, "general-ok".to_string());

        let locations = find_references(&db, id, &source_files, &fn_names());

        // "general-ok" は2回使用されている
        expect_that!(locations.len(), eq(2));

        for location in &locations {
            expect_that!(location.uri.path(), eq("/test.qml"));
        }
    }

    #[googletest::test]
    fn test_find_references_multiple_files() {
        let db = LinguistDatabaseImpl::default();

        let source_file1 = SourceFile::new(
            &db,
            "file:///test1.qml".to_string(),
            r#"Text { text: qsTrId("general-ok") }"#.to_string(),
            ProgrammingLanguage::Qml,
        );
        let source_file2 = SourceFile::new(
            &db,
            "file:///test2.js".to_string(),
            r#"const label = qsTrId("general-ok");"#.to_string(),
            ProgrammingLanguage::JavaScript,
        );

        let mut source_files = HashMap::new();
        source_files.insert(PathBuf::from("/test1.qml"), source_file1);
        source_files.insert(PathBuf::from("/test2.js"), source_file2);

        let id = MessageId::new(&db, "general-ok".to_string());

        let locations = find_references(&db, id, &source_files, &fn_names());

        // 両方のファイルで使用されている
        expect_that!(locations.len(), eq(2));
    }

    #[googletest::test]
    fn test_find_references_no_match() {
        let db = LinguistDatabaseImpl::default();

        let source_file = SourceFile::new(
            &db,
            "file:///test.qml".to_string(),
            r#"Text { text: qsTrId("general-ok") }"#.to_string(),
            ProgrammingLanguage::Qml,
        );

        let mut source_files = HashMap::new();
        source_files.insert(PathBuf::from("/test.qml"), source_file);

        let id = MessageId::new(&db, "no-such-id".to_string());

        let locations = find_references(&db, id, &source_files, &fn_names());

        expect_that!(locations, is_empty());
    }

    #[googletest::test]
    fn test_find_references_empty_files() {
        let db = LinguistDatabaseImpl::default();

        let source_files = HashMap::new();

        let id = MessageId::new(&db, "general-ok".to_string());

        let locations = find_references(&db, id, &source_files, &fn_names());

        expect_that!(locations, is_empty());
    }
}
