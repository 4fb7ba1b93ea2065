//! Positional-argument markers embedded in message strings.
//!
//! Qt messages carry `%1`..`%99` positional markers (substituted by
//! `QString::arg` at display time) and `%n` for the plural count. A `%`
//! followed by anything else is literal text. Translations may reorder or
//! repeat markers, but the *set* of markers must match the source string.

use std::collections::BTreeSet;

/// One marker occurrence kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    /// `%1` .. `%99`
    Positional(u8),
    /// `%n` (plural count)
    Count,
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positional(n) => write!(f, "%{n}"),
            Self::Count => write!(f, "%n"),
        }
    }
}

/// Extracts the set of markers appearing in `text`.
///
/// Order and multiplicity are deliberately dropped: locales reorder and
/// repeat markers freely.
#[must_use]
pub fn placeholders(text: &str) -> BTreeSet<Placeholder> {
    let mut found = BTreeSet::new();
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.peek() {
            Some(&(_, 'n')) => {
                found.insert(Placeholder::Count);
                let _ = chars.next();
            }
            Some(&(_, d)) if d.is_ascii_digit() => {
                let mut value = d.to_digit(10).unwrap_or(0);
                let _ = chars.next();
                // 2桁目 (%10 .. %99)
                if let Some(&(_, d2)) = chars.peek()
                    && d2.is_ascii_digit()
                {
                    value = value * 10 + d2.to_digit(10).unwrap_or(0);
                    let _ = chars.next();
                }
                if value > 0 {
                    #[allow(clippy::cast_possible_truncation)]
                    found.insert(Placeholder::Positional(value as u8));
                }
            }
            _ => {}
        }
    }

    found
}

/// Markers present in the source string but absent from the translation,
/// and vice versa. Both sets empty means the translation preserves the
/// source's markers.
#[must_use]
pub fn marker_diff(
    source: &str,
    translation: &str,
) -> (BTreeSet<Placeholder>, BTreeSet<Placeholder>) {
    let source_set = placeholders(source);
    let translation_set = placeholders(translation);

    let missing = source_set.difference(&translation_set).copied().collect();
    let extra = translation_set.difference(&source_set).copied().collect();
    (missing, extra)
}

/// Formats a marker set for diagnostics (e.g. `%1, %n`).
#[must_use]
pub fn format_markers(markers: &BTreeSet<Placeholder>) -> String {
    markers.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
