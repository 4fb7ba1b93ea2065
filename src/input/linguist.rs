//! Qt Linguist TS catalog format.
//!
//! A catalog is an XML document with a `<TS>` root carrying `language` and
//! `sourcelanguage` attributes, `<context>` blocks and id-keyed `<message>`
//! elements:
//!
//! ```xml
//! <TS version="2.1" language="be" sourcelanguage="en">
//! <context>
//!     <name></name>
//!     <message id="general-cancel">
//!         <source>Cancel</source>
//!         <extracomment>Edit addres dialog, cancel button</extracomment>
//!         <translation>Адмяніць</translation>
//!     </message>
//! </context>
//! </TS>
//! ```
//!
//! The parser flattens all contexts into one id-keyed table (ids are global
//! in id-based projects) and keeps byte-derived ranges so IDE features can
//! point back into the file. Structural oddities (message without id,
//! missing `<source>`, duplicate ids) are collected as problems instead of
//! aborting: translators ship imperfect files and the server must keep
//! working with the rest of the catalog.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{
    BytesStart,
    Event,
};
use thiserror::Error;

use crate::types::{
    LineIndex,
    SourceRange,
};

/// Completion state of a single translation, from the `type` attribute of
/// the `<translation>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TranslationStatus {
    /// No `type` attribute: reviewed and usable.
    #[default]
    Finished,
    /// `type="unfinished"`: missing, stale, or not yet reviewed.
    Unfinished,
    /// `type="vanished"`: the source string no longer exists.
    Vanished,
    /// `type="obsolete"`: kept only for translator reference.
    Obsolete,
}

impl TranslationStatus {
    /// Maps the `type` attribute value. Unknown values are treated as
    /// unfinished rather than trusted.
    #[must_use]
    pub fn from_type_attr(value: Option<&str>) -> Self {
        match value {
            None => Self::Finished,
            Some("vanished") => Self::Vanished,
            Some("obsolete") => Self::Obsolete,
            Some(_) => Self::Unfinished,
        }
    }

    /// Whether a translation with this status may be shown to users.
    #[must_use]
    pub const fn is_reliable(self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// One `<message>` element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageEntry {
    /// Canonical source-language text (`<source>`).
    pub source: String,
    /// Localized text (`<translation>`), possibly empty or stale.
    pub translation: String,
    pub status: TranslationStatus,
    /// Translator guidance (`<extracomment>`), never used at runtime.
    pub extracomment: Option<String>,
    /// Previous source text (`<oldsource>`), never used at runtime.
    pub oldsource: Option<String>,
}

impl MessageEntry {
    /// The translation text, but only when it is trustworthy: non-empty and
    /// not marked unfinished/vanished/obsolete. Callers fall back to
    /// [`MessageEntry::source`] otherwise.
    #[must_use]
    pub fn translated(&self) -> Option<&str> {
        if self.status.is_reliable() && !self.translation.is_empty() {
            Some(&self.translation)
        } else {
            None
        }
    }
}

/// Structural problem found while parsing a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogProblem {
    /// `<message>` without a non-empty `id` attribute.
    MissingId { range: SourceRange },
    /// `<message>` without a `<source>` child.
    MissingSource { id: String, range: SourceRange },
    /// Same id declared twice; the first occurrence wins.
    DuplicateId { id: String, range: SourceRange },
}

impl CatalogProblem {
    /// Range of the offending `<message>` tag.
    #[must_use]
    pub const fn range(&self) -> SourceRange {
        match self {
            Self::MissingId { range }
            | Self::MissingSource { range, .. }
            | Self::DuplicateId { range, .. } => *range,
        }
    }
}

impl std::fmt::Display for CatalogProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId { .. } => write!(f, "<message> without a non-empty 'id' attribute"),
            Self::MissingSource { id, .. } => {
                write!(f, "message '{id}' has no <source> element")
            }
            Self::DuplicateId { id, .. } => write!(f, "message id '{id}' is declared twice"),
        }
    }
}

/// Fully parsed catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCatalog {
    /// `language` attribute of `<TS>` (e.g. `be`, `es-ES`).
    pub language: Option<String>,
    /// `sourcelanguage` attribute of `<TS>` (conventionally `en`).
    pub source_language: Option<String>,
    /// `message_id` → entry, flattened across all contexts.
    pub entries: HashMap<String, MessageEntry>,
    /// `message_id` → range of the `<message ...>` start tag.
    pub id_ranges: HashMap<String, SourceRange>,
    /// `message_id` → range of the `<translation>` element body.
    pub translation_ranges: HashMap<String, SourceRange>,
    pub problems: Vec<CatalogProblem>,
}

/// Errors that abort catalog parsing entirely.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("invalid XML escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("not a Qt Linguist catalog (no <TS> root element)")]
    NotLinguist,
}

/// Which `<message>` child element text is currently being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Source,
    Translation,
    ExtraComment,
    OldSource,
}

impl Field {
    /// Maps a tag name inside `<message>`.
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"source" => Some(Self::Source),
            b"translation" => Some(Self::Translation),
            b"extracomment" => Some(Self::ExtraComment),
            b"oldsource" => Some(Self::OldSource),
            _ => None,
        }
    }
}

/// In-flight state for the `<message>` element being parsed.
#[derive(Debug, Default)]
struct PendingMessage {
    id: Option<String>,
    id_range: Option<SourceRange>,
    entry: MessageEntry,
    has_source: bool,
    translation_range: Option<SourceRange>,
}

/// Reads an attribute as an unescaped string.
fn attr_value(tag: &BytesStart<'_>, name: &str) -> Result<Option<String>, CatalogError> {
    let Some(attribute) = tag.try_get_attribute(name)? else {
        return Ok(None);
    };
    let raw = String::from_utf8_lossy(attribute.value.as_ref()).into_owned();
    Ok(Some(quick_xml::escape::unescape(&raw)?.into_owned()))
}

/// Finalizes a `<message>` once its end tag (or self-closing tag) is seen.
fn finish_message(message: PendingMessage, out: &mut ParsedCatalog) {
    let range = message.id_range.unwrap_or(SourceRange {
        start: crate::types::SourcePosition { line: 0, character: 0 },
        end: crate::types::SourcePosition { line: 0, character: 0 },
    });

    let Some(id) = message.id.filter(|id| !id.is_empty()) else {
        out.problems.push(CatalogProblem::MissingId { range });
        return;
    };

    if out.entries.contains_key(&id) {
        out.problems.push(CatalogProblem::DuplicateId { id, range });
        return;
    }

    if !message.has_source {
        out.problems.push(CatalogProblem::MissingSource { id: id.clone(), range });
    }

    out.id_ranges.insert(id.clone(), range);
    out.translation_ranges.insert(id.clone(), message.translation_range.unwrap_or(range));
    out.entries.insert(id, message.entry);
}

/// Parses a Qt Linguist TS document.
///
/// Parsing is a pure function of `text`: parsing the same text twice yields
/// an identical [`ParsedCatalog`].
///
/// # Errors
/// Returns [`CatalogError`] for malformed XML or a non-`<TS>` root.
#[allow(clippy::too_many_lines)]
pub fn parse_catalog(text: &str) -> Result<ParsedCatalog, CatalogError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let index = LineIndex::new(text);
    let mut out = ParsedCatalog::default();

    let mut seen_ts = false;
    let mut message: Option<PendingMessage> = None;
    let mut field: Option<Field> = None;
    let mut field_text = String::new();
    let mut field_start = 0usize;

    loop {
        let event_start = usize::try_from(reader.buffer_position()).unwrap_or(0);
        let event = reader.read_event()?;
        let event_end = usize::try_from(reader.buffer_position()).unwrap_or(0);

        match event {
            Event::Start(tag) => match tag.local_name().as_ref() {
                b"TS" => {
                    seen_ts = true;
                    out.language = attr_value(&tag, "language")?;
                    out.source_language = attr_value(&tag, "sourcelanguage")?;
                }
                b"message" => {
                    // trim_text はタグ間の空白を黙って飛ばすので、タグの開始
                    // 位置は終了位置から長さを引いて求める (`<` + 中身 + `>`)
                    let tag_start = event_end.saturating_sub(tag.len() + 2);
                    message = Some(PendingMessage {
                        id: attr_value(&tag, "id")?,
                        id_range: Some(index.range(tag_start, event_end)),
                        ..PendingMessage::default()
                    });
                }
                name => {
                    if let Some(pending) = message.as_mut()
                        && let Some(found) = Field::from_tag(name)
                    {
                        field = Some(found);
                        field_text.clear();
                        field_start = event_end;
                        if found == Field::Translation {
                            pending.entry.status = TranslationStatus::from_type_attr(
                                attr_value(&tag, "type")?.as_deref(),
                            );
                        }
                    }
                }
            },
            Event::Empty(tag) => {
                // 自己終了タグは `<` + 中身 + `/>`
                let tag_start = event_end.saturating_sub(tag.len() + 3);
                match tag.local_name().as_ref() {
                    b"message" => {
                        // <message .../> — 中身なし、問題として記録される
                        finish_message(
                            PendingMessage {
                                id: attr_value(&tag, "id")?,
                                id_range: Some(index.range(tag_start, event_end)),
                                ..PendingMessage::default()
                            },
                            &mut out,
                        );
                    }
                    name => {
                        if let Some(pending) = message.as_mut()
                            && let Some(found) = Field::from_tag(name)
                        {
                            match found {
                                Field::Source => pending.has_source = true,
                                Field::Translation => {
                                    pending.entry.status = TranslationStatus::from_type_attr(
                                        attr_value(&tag, "type")?.as_deref(),
                                    );
                                    pending.translation_range =
                                        Some(index.range(tag_start, event_end));
                                }
                                Field::ExtraComment | Field::OldSource => {}
                            }
                        }
                    }
                }
            }
            Event::Text(text_event) => {
                if field.is_some() {
                    let raw = String::from_utf8_lossy(text_event.as_ref()).into_owned();
                    field_text.push_str(&quick_xml::escape::unescape(&raw)?);
                }
            }
            Event::CData(cdata) => {
                if field.is_some() {
                    field_text.push_str(&String::from_utf8_lossy(cdata.as_ref()));
                }
            }
            Event::End(tag) => {
                if tag.local_name().as_ref() == b"message" {
                    if let Some(pending) = message.take() {
                        finish_message(pending, &mut out);
                    }
                    field = None;
                } else if let Some(current) = field
                    && Field::from_tag(tag.local_name().as_ref()) == Some(current)
                    && let Some(pending) = message.as_mut()
                {
                    match current {
                        Field::Source => {
                            pending.entry.source = field_text.clone();
                            pending.has_source = true;
                        }
                        Field::Translation => {
                            pending.entry.translation = field_text.clone();
                            pending.translation_range = Some(index.range(field_start, event_start));
                        }
                        Field::ExtraComment => {
                            pending.entry.extracomment = Some(field_text.clone());
                        }
                        Field::OldSource => {
                            pending.entry.oldsource = Some(field_text.clone());
                        }
                    }
                    field = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if seen_ts { Ok(out) } else { Err(CatalogError::NotLinguist) }
}
