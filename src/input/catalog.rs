//! Catalog file input definitions.

use std::collections::HashMap;
use std::path::Path;

use crate::input::linguist::{
    self,
    CatalogError,
    CatalogProblem,
    MessageEntry,
    ParsedCatalog,
};
use crate::types::{
    SourcePosition,
    SourceRange,
};

/// Normalize a locale code (lowercase and replace - with _).
///
/// Qt tooling writes both `es-ES` and `es_ES` in the wild; comparisons
/// always go through this form.
#[must_use]
pub fn normalize_locale(code: &str) -> String {
    code.to_lowercase().replace('-', "_")
}

/// Whether a path component plausibly names a locale.
///
/// Accepts `be`, `be_BY`, `es-ES`, `zh_Hans_CN` style codes: 2-3 letter
/// language, optionally followed by script/region subtags.
fn looks_like_locale(part: &str) -> bool {
    let mut subtags = part.split(['-', '_']);

    let Some(language) = subtags.next() else {
        return false;
    };
    if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_lowercase()) {
        return false;
    }

    let mut count = 0;
    for subtag in subtags {
        count += 1;
        if count > 2
            || !(2..=4).contains(&subtag.len())
            || !subtag.chars().all(|c| c.is_ascii_alphabetic())
        {
            return false;
        }
    }
    true
}

/// Detect the locale from a catalog file path.
///
/// The file stem is the convention in Qt projects (`i18n/be_BY.ts`), so it
/// wins over parent directories.
///
/// # Examples
/// - `i18n/be_BY.ts` → `be_BY`
/// - `translations/app.ts` → None
#[must_use]
pub fn detect_locale_from_path(file_path: &Path) -> Option<String> {
    let stem = file_path.file_stem()?.to_string_lossy().to_string();
    if looks_like_locale(&stem) {
        return Some(stem);
    }

    let parent = file_path.parent()?.file_name()?.to_string_lossy().to_string();
    if looks_like_locale(&parent) { Some(parent) } else { None }
}

/// Salsa input representing one parsed catalog file.
#[salsa::input(debug)]
pub struct Catalog {
    /// Normalized locale (e.g. `be_by`, `id_id`).
    #[returns(ref)]
    pub locale: String,

    #[returns(ref)]
    pub file_path: String,

    /// `message_id` → entry, flattened across contexts.
    #[returns(ref)]
    pub entries: HashMap<String, MessageEntry>,

    /// `message_id` → range of the `<message>` start tag, for
    /// go-to-definition.
    #[returns(ref)]
    pub id_ranges: HashMap<String, SourceRange>,

    /// `message_id` → range of the `<translation>` body, for hover targets
    /// inside catalog files.
    #[returns(ref)]
    pub translation_ranges: HashMap<String, SourceRange>,

    /// Structural problems found while parsing.
    #[returns(ref)]
    pub problems: Vec<CatalogProblem>,
}

impl Catalog {
    /// Builds a catalog input from a parsed document.
    ///
    /// The locale is taken from the file path when it names one, falling
    /// back to the `<TS language>` attribute. Beam-style projects encode
    /// the full `be_BY` in the filename while the attribute only carries
    /// `be`, so the path wins.
    pub fn from_parsed(
        db: &dyn crate::db::LinguistDatabase,
        file_path: &str,
        parsed: ParsedCatalog,
    ) -> Self {
        let locale = detect_locale_from_path(Path::new(file_path))
            .or(parsed.language)
            .map_or_else(|| "unknown".to_string(), |code| normalize_locale(&code));

        Self::new(
            db,
            locale,
            file_path.to_string(),
            parsed.entries,
            parsed.id_ranges,
            parsed.translation_ranges,
            parsed.problems,
        )
    }

    /// Looks up an entry by message id.
    pub fn entry<'db>(
        self,
        db: &'db dyn crate::db::LinguistDatabase,
        message_id: &str,
    ) -> Option<&'db MessageEntry> {
        self.entries(db).get(message_id)
    }

    /// Get the message id at a cursor position in the catalog file.
    ///
    /// Returns the id when the cursor is on a `<message>` tag or inside its
    /// `<translation>` body.
    pub fn message_id_at_position(
        self,
        db: &dyn crate::db::LinguistDatabase,
        position: SourcePosition,
    ) -> Option<crate::interned::MessageId<'_>> {
        for (id, range) in self.id_ranges(db) {
            if range.contains(position) {
                return Some(crate::interned::MessageId::new(db, id.clone()));
            }
        }

        for (id, range) in self.translation_ranges(db) {
            if range.contains(position) {
                return Some(crate::interned::MessageId::new(db, id.clone()));
            }
        }

        None
    }
}

/// Load a catalog file and create a [`Catalog`] input.
///
/// # Errors
/// Returns [`CatalogError`] if the file cannot be read or is not a valid
/// Qt Linguist document.
pub fn load_catalog_file(
    db: &dyn crate::db::LinguistDatabase,
    file_path: &Path,
) -> Result<Catalog, CatalogError> {
    let content = std::fs::read_to_string(file_path)?;
    let parsed = linguist::parse_catalog(&content)?;
    Ok(Catalog::from_parsed(db, &file_path.to_string_lossy(), parsed))
}
