//! Hover implementation

use std::fmt::Write as _;

use crate::db::LinguistDatabase;
use crate::input::catalog::Catalog;
use crate::interned::MessageId;

/// Generate hover content for a message id
///
/// # ソート順
/// ロケールは以下の順序でソートされます：
/// 1. `current_language`（設定されている場合）
/// 2. `primary_locales`（設定順）
/// 3. その他（アルファベット順）
///
/// 未確定（unfinished 等）の翻訳は、実行時に表示されるフォールバック値
/// （ソーステキスト）とともにマークされます。
pub fn generate_hover_content(
    db: &dyn LinguistDatabase,
    id: MessageId<'_>,
    catalogs: &[Catalog],
    source_language: &str,
    current_language: Option<&str>,
    primary_locales: Option<&[String]>,
) -> Option<String> {
    let id_text = id.text(db);

    let mut source_text: Option<String> = None;
    let mut translations_found = Vec::new();

    for catalog in catalogs {
        let Some(entry) = catalog.entry(db, id_text) else {
            continue;
        };
        let locale = catalog.locale(db);

        if source_text.is_none() && !entry.source.is_empty() {
            source_text = Some(entry.source.clone());
        }

        let display = entry.translated().map_or_else(
            // 実行時はソーステキストにフォールバックする
            || format!("{} *(unfinished)*", entry.source),
            ToString::to_string,
        );
        translations_found.push((locale.clone(), display));
    }

    // No catalog knows this id
    if translations_found.is_empty() {
        return None;
    }

    // Format as markdown
    let mut content = format!("**Message ID:** `{id_text}`\n\n");
    if let Some(source) = source_text {
        let _ = writeln!(content, "**{source_language} (source)**: {source}\n");
    }

    // Sort by priority: current_language → primary_locales → alphabetical
    sort_locales_by_priority(&mut translations_found, current_language, primary_locales);

    for (locale, value) in translations_found {
        let _ = writeln!(content, "**{locale}**: {value}");
    }

    Some(content)
}

/// ロケールを優先度順にソート
fn sort_locales_by_priority(
    translations: &mut [(String, String)],
    current_language: Option<&str>,
    primary_locales: Option<&[String]>,
) {
    translations.sort_by(|a, b| {
        let priority_a = get_locale_priority(&a.0, current_language, primary_locales);
        let priority_b = get_locale_priority(&b.0, current_language, primary_locales);

        match (priority_a, priority_b) {
            (LocalePriority::Current, LocalePriority::Current) => std::cmp::Ordering::Equal,
            (LocalePriority::Current, _) => std::cmp::Ordering::Less,
            (_, LocalePriority::Current) => std::cmp::Ordering::Greater,
            (LocalePriority::Primary(a_idx), LocalePriority::Primary(b_idx)) => a_idx.cmp(&b_idx),
            (LocalePriority::Primary(_), _) => std::cmp::Ordering::Less,
            (_, LocalePriority::Primary(_)) => std::cmp::Ordering::Greater,
            (LocalePriority::Other(a_locale), LocalePriority::Other(b_locale)) => {
                a_locale.cmp(b_locale)
            }
        }
    });
}

/// Locale priority for sorting
#[derive(Debug, Clone, PartialEq, Eq)]
enum LocalePriority<'a> {
    /// Current language (highest priority)
    Current,
    /// Primary locale with its position index
    Primary(usize),
    /// Other locale (sorted alphabetically)
    Other(&'a str),
}

/// ロケールの優先度を計算
fn get_locale_priority<'a>(
    locale: &'a str,
    current_language: Option<&str>,
    primary_locales: Option<&[String]>,
) -> LocalePriority<'a> {
    // current_language は最高優先度
    if current_language.is_some_and(|c| c == locale) {
        return LocalePriority::Current;
    }

    // primary_locales は設定順
    if let Some(primaries) = primary_locales
        && let Some(pos) = primaries.iter().position(|p| p == locale)
    {
        return LocalePriority::Primary(pos);
    }

    // その他はアルファベット順
    LocalePriority::Other(locale)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::db::LinguistDatabaseImpl;
    use crate::input::linguist::TranslationStatus;
    use crate::test_utils::create_catalog;

    #[rstest]
    fn generate_hover_content_with_single_catalog() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[("general-ok", "Ok", "Так", TranslationStatus::Finished)],
        );

        let id = MessageId::new(&db, "general-ok".to_string());

        let content = generate_hover_content(&db, id, &[catalog], "en", None, None);

        assert_that!(content, some(contains_substring("**Message ID:** `general-ok`")));
        let content = content.unwrap();
        assert_that!(content, contains_substring("**en (source)**: Ok"));
        assert_that!(content, contains_substring("**be_by**: Так"));
    }

    #[rstest]
    fn generate_hover_content_marks_unfinished_with_fallback() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "id_id",
            "/proj/i18n/id_ID.ts",
            &[("general-groth", "GROTH", "", TranslationStatus::Unfinished)],
        );

        let id = MessageId::new(&db, "general-groth".to_string());

        let content =
            generate_hover_content(&db, id, &[catalog], "en", None, None).unwrap();

        // フォールバック値とマークの両方が表示される
        assert_that!(content, contains_substring("**id_id**: GROTH *(unfinished)*"));
    }

    #[rstest]
    fn generate_hover_content_with_unknown_id() {
        let db = LinguistDatabaseImpl::default();

        let catalog = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[("general-ok", "Ok", "Так", TranslationStatus::Finished)],
        );

        let id = MessageId::new(&db, "no-such-id".to_string());

        let content = generate_hover_content(&db, id, &[catalog], "en", None, None);

        assert_that!(content, none());
    }

    #[rstest]
    fn generate_hover_content_with_no_catalogs() {
        let db = LinguistDatabaseImpl::default();

        let id = MessageId::new(&db, "general-ok".to_string());

        let content = generate_hover_content(&db, id, &[], "en", None, None);

        assert_that!(content, none());
    }

    #[rstest]
    fn generate_hover_content_sorts_locales_alphabetically() {
        let db = LinguistDatabaseImpl::default();

        // 意図的にソート順と異なる順序で追加（id_id → be_by）
        let id_id = create_catalog(
            &db,
            "id_id",
            "/proj/i18n/id_ID.ts",
            &[("general-ok", "Ok", "Oke", TranslationStatus::Finished)],
        );
        let be_by = create_catalog(
            &db,
            "be_by",
            "/proj/i18n/be_BY.ts",
            &[("general-ok", "Ok", "Так", TranslationStatus::Finished)],
        );

        let id = MessageId::new(&db, "general-ok".to_string());

        let content =
            generate_hover_content(&db, id, &[id_id, be_by], "en", None, None).unwrap();

        let be_pos = content.find("**be_by**").unwrap();
        let id_pos = content.find("**id_id**").unwrap();
        assert_that!(be_pos, lt(id_pos));
    }

    #[rstest]
    fn generate_hover_content_with_current_language_priority() {
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
        let nl_nl = create_catalog(
            &db,
            "nl_nl",
            "/proj/i18n/nl_NL.ts",
            &[("general-ok", "Ok", "Oké", TranslationStatus::Finished)],
        );

        let id = MessageId::new(&db, "general-ok".to_string());

        // current_language = "id_id" を指定
        let content =
            generate_hover_content(&db, id, &[be_by, id_id, nl_nl], "en", Some("id_id"), None)
                .unwrap();

        let id_pos = content.find("**id_id**").unwrap();
        let be_pos = content.find("**be_by**").unwrap();
        let nl_pos = content.find("**nl_nl**").unwrap();
        assert_that!(id_pos, lt(be_pos));
        // 残りはアルファベット順
        assert_that!(be_pos, lt(nl_pos));
    }

    #[rstest]
    fn generate_hover_content_with_primary_locales() {
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
        let nl_nl = create_catalog(
            &db,
            "nl_nl",
            "/proj/i18n/nl_NL.ts",
            &[("general-ok", "Ok", "Oké", TranslationStatus::Finished)],
        );

        let id = MessageId::new(&db, "general-ok".to_string());

        // primary_locales = ["nl_nl", "id_id"] を指定
        let primary = vec!["nl_nl".to_string(), "id_id".to_string()];
        let content =
            generate_hover_content(&db, id, &[be_by, id_id, nl_nl], "en", None, Some(&primary))
                .unwrap();

        let nl_pos = content.find("**nl_nl**").unwrap();
        let id_pos = content.find("**id_id**").unwrap();
        let be_pos = content.find("**be_by**").unwrap();
        assert_that!(nl_pos, lt(id_pos));
        assert_that!(id_pos, lt(be_pos));
    }

    #[rstest]
    fn generate_hover_content_current_overrides_primary() {
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

        let id = MessageId::new(&db, "general-ok".to_string());

        let primary = vec!["be_by".to_string()];
        let content = generate_hover_content(
            &db,
            id,
            &[be_by, id_id],
            "en",
            Some("id_id"),
            Some(&primary),
        )
        .unwrap();

        let id_pos = content.find("**id_id**").unwrap();
        let be_pos = content.find("**be_by**").unwrap();
        assert_that!(id_pos, lt(be_pos));
    }

    #[rstest]
    fn generate_hover_content_skips_catalogs_without_id() {
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
            &[("general-cancel", "Cancel", "Batal", TranslationStatus::Finished)],
        );

        let id = MessageId::new(&db, "general-ok".to_string());

        let content =
            generate_hover_content(&db, id, &[be_by, id_id], "en", None, None).unwrap();

        assert_that!(content, contains_substring("**be_by**"));
        assert_that!(content, not(contains_substring("**id_id**")));
    }
}
