//! 診断メッセージ生成モジュール

use std::collections::{
    BTreeSet,
    HashSet,
};

use tower_lsp::lsp_types::{
    Diagnostic,
    DiagnosticSeverity,
    DiagnosticTag,
    Range,
};

use crate::config::LinguistSettings;
use crate::db::LinguistDatabase;
use crate::input::catalog::{
    normalize_locale,
    Catalog,
};
use crate::input::source::SourceFile;
use crate::placeholder;
use crate::syntax::analyze_source;
use crate::types::SourceRange;

/// 欠落 ID の診断で列挙する最大数
const MAX_MISSING_IDS_LISTED: usize = 5;

fn diagnostic(
    range: Range,
    severity: DiagnosticSeverity,
    message: String,
    tags: Option<Vec<DiagnosticTag>>,
) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(severity),
        code: None,
        code_description: None,
        source: Some("qml-i18n".to_string()),
        message,
        related_information: None,
        tags,
        data: None,
    }
}

/// ソースファイルの診断メッセージを生成
///
/// ソースコード内で使用されているメッセージ ID が、
/// いずれかのカタログに存在するかをチェックし、
/// 存在しない場合は診断メッセージを生成します。
pub fn generate_source_diagnostics(
    db: &dyn LinguistDatabase,
    source_file: SourceFile,
    catalogs: &[Catalog],
    trans_fn_names: &[String],
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    tracing::debug!("Generating diagnostics for source file '{}'", source_file.uri(db));
    let usages = analyze_source(db, source_file, trans_fn_names.to_vec());

    // 全カタログから既知の ID を収集
    let mut all_ids = HashSet::new();
    for catalog in catalogs {
        all_ids.extend(catalog.entries(db).keys().cloned());
    }

    for usage in usages {
        let id = usage.id(db).text(db);

        // 空の ID はスキップ（補完中の状態）
        if id.is_empty() {
            continue;
        }

        if !all_ids.contains(id) {
            let range: SourceRange = usage.range(db);
            diagnostics.push(diagnostic(
                range.into(),
                DiagnosticSeverity::WARNING,
                format!("Message id '{id}' not found in any catalog"),
                None,
            ));
        }
    }

    diagnostics
}

/// このロケールに翻訳が要求されるかどうか
fn locale_is_required(locale: &str, settings: &LinguistSettings) -> bool {
    if let Some(required) = &settings.required_locales {
        return required.iter().any(|r| normalize_locale(r) == locale);
    }
    if let Some(optional) = &settings.optional_locales {
        return !optional.iter().any(|o| normalize_locale(o) == locale);
    }
    true
}

/// カタログファイルの診断メッセージを生成
///
/// チェック内容（それぞれ設定でオン・オフ可能）：
/// - 構造的な問題（id なし・source なし・id 重複）
/// - 他カタログにあってこのカタログにない ID（ファイル先頭にまとめて報告）
/// - 未確定または空の翻訳
/// - ソーステキストと翻訳の `%N`/`%n` マーカー集合の不一致
/// - 同じ ID のソーステキストがカタログ間で食い違う場合
/// - ソースコードから参照されていないメッセージ（`used_ids` がある場合）
pub fn generate_catalog_diagnostics(
    db: &dyn LinguistDatabase,
    catalog: Catalog,
    catalogs: &[Catalog],
    used_ids: Option<&HashSet<String>>,
    settings: &LinguistSettings,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let locale = catalog.locale(db);
    let entries = catalog.entries(db);
    let id_ranges = catalog.id_ranges(db);
    let translation_ranges = catalog.translation_ranges(db);
    let required = locale_is_required(locale, settings);

    tracing::debug!("Generating diagnostics for catalog '{}'", catalog.file_path(db));

    // 構造的な問題
    for problem in catalog.problems(db) {
        diagnostics.push(diagnostic(
            problem.range().into(),
            DiagnosticSeverity::ERROR,
            problem.to_string(),
            None,
        ));
    }

    let id_range_of = |id: &str| -> Range {
        id_ranges.get(id).copied().map_or_else(Range::default, Into::into)
    };

    // 欠落 ID（他カタログとの差分、ファイル先頭にまとめて報告）
    if settings.diagnostics.unfinished && required {
        let mut missing: BTreeSet<&str> = BTreeSet::new();
        for other in catalogs {
            for id in other.entries(db).keys() {
                if !entries.contains_key(id) {
                    missing.insert(id);
                }
            }
        }

        if !missing.is_empty() {
            let listed: Vec<&str> = missing.iter().take(MAX_MISSING_IDS_LISTED).copied().collect();
            let suffix = if missing.len() > MAX_MISSING_IDS_LISTED { ", ..." } else { "" };
            diagnostics.push(diagnostic(
                Range::default(),
                DiagnosticSeverity::WARNING,
                format!(
                    "Catalog is missing {} message id(s): {}{suffix}",
                    missing.len(),
                    listed.join(", "),
                ),
                None,
            ));
        }
    }

    for (id, entry) in entries {
        // 未確定・空の翻訳
        if settings.diagnostics.unfinished && required && entry.translated().is_none() {
            let range = translation_ranges
                .get(id)
                .copied()
                .map_or_else(|| id_range_of(id), Into::into);
            let detail =
                if entry.translation.is_empty() { "empty" } else { "marked unfinished" };
            diagnostics.push(diagnostic(
                range,
                DiagnosticSeverity::WARNING,
                format!("Translation for '{id}' is {detail}; source text will be shown"),
                None,
            ));
        }

        // マーカー集合の不一致
        if settings.diagnostics.placeholders && !entry.translation.is_empty() {
            let (missing, extra) = placeholder::marker_diff(&entry.source, &entry.translation);
            if !missing.is_empty() || !extra.is_empty() {
                let mut parts = Vec::new();
                if !missing.is_empty() {
                    parts.push(format!("missing {}", placeholder::format_markers(&missing)));
                }
                if !extra.is_empty() {
                    parts.push(format!("unexpected {}", placeholder::format_markers(&extra)));
                }
                let range = translation_ranges
                    .get(id)
                    .copied()
                    .map_or_else(|| id_range_of(id), Into::into);
                diagnostics.push(diagnostic(
                    range,
                    DiagnosticSeverity::WARNING,
                    format!("Translation for '{id}' changes placeholder markers: {}", parts.join("; ")),
                    None,
                ));
            }
        }

        // カタログ間のソーステキスト不一致
        if settings.diagnostics.source_consistency && !entry.source.is_empty() {
            for other in catalogs {
                if other.file_path(db) == catalog.file_path(db) {
                    continue;
                }
                if let Some(other_entry) = other.entry(db, id)
                    && !other_entry.source.is_empty()
                    && other_entry.source != entry.source
                {
                    diagnostics.push(diagnostic(
                        id_range_of(id),
                        DiagnosticSeverity::WARNING,
                        format!(
                            "Source text for '{id}' differs from {} catalog: '{}' vs '{}'",
                            other.locale(db),
                            entry.source,
                            other_entry.source,
                        ),
                    None,
                    ));
                    break;
                }
            }
        }

        // 未使用メッセージ
        if settings.diagnostics.unused_messages
            && let Some(used) = used_ids
            && !used.contains(id)
        {
            diagnostics.push(diagnostic(
                id_range_of(id),
                DiagnosticSeverity::HINT,
                format!("Message '{id}' is never referenced from source code"),
                Some(vec![DiagnosticTag::UNNECESSARY]),
            ));
        }
    }

    diagnostics
}
