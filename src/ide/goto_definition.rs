//! Go to Definition implementation

use tower_lsp::lsp_types::{
    Location,
    Range,
};

use crate::db::LinguistDatabase;
use crate::input::catalog::Catalog;
use crate::interned::MessageId;
use crate::types::SourceRange;

/// Find message id definitions
///
/// # Arguments
/// * `db` - Salsa database
/// * `id` - Message id
/// * `catalogs` - All loaded locale catalogs
///
/// # Returns
/// All `<message>` elements that declare the id (one per catalog that has it)
pub fn find_definitions(
    db: &dyn LinguistDatabase,
    id: MessageId<'_>,
    catalogs: &[Catalog],
) -> Vec<Location> {
    let id_text = id.text(db);
    let mut locations = Vec::new();

    for catalog in catalogs {
        let id_ranges = catalog.id_ranges(db);

        if let Some(range) = id_ranges.get(id_text.as_str()) {
            let file_path = catalog.file_path(db);
            let Ok(uri) = tower_lsp::lsp_types::Url::from_file_path(file_path) else {
                tracing::warn!("Failed to create URI from file path: {}", file_path);
                continue;
            };

            locations.push(Location { uri, range: lsp_range_from_source_range(*range) });
        }
    }

    locations
}

/// Convert `SourceRange` to LSP `Range`
const fn lsp_range_from_source_range(range: SourceRange) -> Range {
    Range {
        start: tower_lsp::lsp_types::Position {
            line: range.start.line,
            character: range.start.character,
        },
        end: tower_lsp::lsp_types::Position {
            line: range.end.line,
            character: range.end.character,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;

    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::types::{
        SourcePosition,
        SourceRange,
    };

    fn catalog_with_range(
        db: &LinguistDatabaseImpl,
        locale: &str,
        file_path: &str,
        id: &str,
        range: SourceRange,
    ) -> Catalog {
        let mut id_ranges = HashMap::new();
        id_ranges.insert(id.to_string(), range);

        Catalog::new(
            db,
            locale.to_string(),
            file_path.to_string(),
            HashMap::new(),
            id_ranges,
            HashMap::new(),
            Vec::new(),
        )
    }

    #[rstest]
    fn find_definitions_single_catalog() {
        let db = LinguistDatabaseImpl::default();

        let catalog = catalog_with_range(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            "general-ok",
            SourceRange {
                start: SourcePosition { line: 4, character: 4 },
                end: SourcePosition { line: 7, character: 14 },
            },
        );

        let id = MessageId::new(&db, "general-ok".to_string());

        let locations = find_definitions(&db, id, &[catalog]);

        assert_that!(locations.len(), eq(1));
        assert_that!(locations[0].uri.path(), ends_with("be_BY.ts"));
        assert_that!(locations[0].range.start.line, eq(4));
        assert_that!(locations[0].range.start.character, eq(4));
    }

    #[rstest]
    fn find_definitions_multiple_catalogs() {
        let db = LinguistDatabaseImpl::default();

        let be_by = catalog_with_range(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            "general-ok",
            SourceRange {
                start: SourcePosition { line: 4, character: 4 },
                end: SourcePosition { line: 7, character: 14 },
            },
        );
        let id_id = catalog_with_range(
            &db,
            "id_id",
            "/proj/i18n/id_ID.ts",
            "general-ok",
            SourceRange {
                start: SourcePosition { line: 9, character: 4 },
                end: SourcePosition { line: 12, character: 14 },
            },
        );

        let id = MessageId::new(&db, "general-ok".to_string());

        let locations = find_definitions(&db, id, &[be_by, id_id]);

        // 両方のカタログで定義が見つかる
        assert_that!(locations.len(), eq(2));

        let paths: Vec<&str> = locations.iter().map(|loc| loc.uri.path()).collect();
        assert_that!(paths, contains(ends_with("be_BY.ts")));
        assert_that!(paths, contains(ends_with("id_ID.ts")));
    }

    #[rstest]
    fn find_definitions_not_found() {
        let db = LinguistDatabaseImpl::default();

        let catalog = catalog_with_range(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            "general-ok",
            SourceRange {
                start: SourcePosition { line: 4, character: 4 },
                end: SourcePosition { line: 7, character: 14 },
            },
        );

        let id = MessageId::new(&db, "no-such-id".to_string());

        let locations = find_definitions(&db, id, &[catalog]);

        assert_that!(locations, is_empty());
    }

    #[rstest]
    fn lsp_range_conversion() {
        let source_range = SourceRange {
            start: SourcePosition { line: 5, character: 10 },
            end: SourcePosition { line: 5, character: 25 },
        };

        let lsp_range = lsp_range_from_source_range(source_range);

        assert_that!(lsp_range.start.line, eq(5));
        assert_that!(lsp_range.start.character, eq(10));
        assert_that!(lsp_range.end.line, eq(5));
        assert_that!(lsp_range.end.character, eq(25));
    }
}
