//! Message resolution: locale + message id → display string.
//!
//! Mirrors what `QTranslator` does at runtime so IDE features (hover
//! previews, the `resolveMessage` command) show exactly what the
//! application would render:
//!
//! 1. the locale's catalog is consulted for the id;
//! 2. the translation is used only when it is finished and non-empty;
//! 3. otherwise the entry's source text is used;
//! 4. a locale without the id falls back to the source text from any
//!    catalog that declares it;
//! 5. an id unknown to every catalog resolves to nothing.
//!
//! Positional arguments are then substituted with `QString::arg` semantics:
//! each successive argument replaces every occurrence of the
//! lowest-numbered remaining `%N` marker, and `%n` is replaced by the
//! plural count.

use crate::db::LinguistDatabase;
use crate::input::catalog::{
    normalize_locale,
    Catalog,
};

/// Replaces every occurrence of `%<number>` in `text`.
///
/// Markers are matched greedily up to two digits, so replacing `%1` leaves
/// `%12` untouched.
fn replace_positional(text: &str, number: u8, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while digits.len() < 2
            && let Some(&(_, d)) = chars.peek()
            && d.is_ascii_digit()
        {
            digits.push(d);
            let _ = chars.next();
        }

        if digits.parse::<u8>() == Ok(number) && number > 0 {
            out.push_str(replacement);
        } else {
            out.push('%');
            out.push_str(&digits);
        }
    }

    out
}

/// Replaces every `%n` marker with the plural count.
fn replace_count(text: &str, count: i64) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%' && chars.peek() == Some(&'n') {
            let _ = chars.next();
            out.push_str(&count.to_string());
        } else {
            out.push(c);
        }
    }

    out
}

/// Lowest-numbered positional marker still present in `text`.
fn lowest_marker(text: &str) -> Option<u8> {
    crate::placeholder::placeholders(text)
        .into_iter()
        .filter_map(|marker| match marker {
            crate::placeholder::Placeholder::Positional(n) => Some(n),
            crate::placeholder::Placeholder::Count => None,
        })
        .min()
}

/// Substitutes arguments into a message template with `QString::arg`
/// semantics.
#[must_use]
pub fn apply_args(template: &str, args: &[String], count: Option<i64>) -> String {
    let mut text = match count {
        Some(n) => replace_count(template, n),
        None => template.to_string(),
    };

    for arg in args {
        let Some(number) = lowest_marker(&text) else {
            // Qt warns and drops surplus arguments; so do we
            tracing::warn!("argument '{arg}' has no marker to replace");
            break;
        };
        text = replace_positional(&text, number, arg);
    }

    text
}

/// Finds the display template for a message id in a locale.
///
/// Returns `None` only when no catalog knows the id at all.
#[must_use]
pub fn lookup_template(
    db: &dyn LinguistDatabase,
    catalogs: &[Catalog],
    locale: &str,
    message_id: &str,
) -> Option<String> {
    let locale = normalize_locale(locale);

    if let Some(catalog) = catalogs.iter().find(|c| c.locale(db) == &locale)
        && let Some(entry) = catalog.entry(db, message_id)
    {
        return Some(entry.translated().unwrap_or(&entry.source).to_string());
    }

    // ロケールに ID がない場合、他のカタログのソーステキストへフォールバック
    catalogs
        .iter()
        .find_map(|catalog| catalog.entry(db, message_id))
        .map(|entry| entry.source.clone())
}

/// Resolves a message id to its display string for a locale.
///
/// This is the contract a QML runtime holds for `qsTrId(id).arg(...)`:
/// translation text when trustworthy, source text otherwise, `None` when
/// the id is unknown everywhere.
#[must_use]
pub fn resolve(
    db: &dyn LinguistDatabase,
    catalogs: &[Catalog],
    locale: &str,
    message_id: &str,
    args: &[String],
    count: Option<i64>,
) -> Option<String> {
    lookup_template(db, catalogs, locale, message_id)
        .map(|template| apply_args(&template, args, count))
}
