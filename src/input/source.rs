//! Source file input definitions.

use std::path::Path;

#[salsa::input]
pub struct SourceFile {
    #[returns(ref)]
    pub uri: String,

    #[returns(ref)]
    pub text: String,

    pub language: ProgrammingLanguage,
}

/// Supported programming languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgrammingLanguage {
    /// QML documents. Parsed with the JavaScript grammar: expressions and
    /// call sites come out intact, and `qsTrId` never appears in the parts
    /// the grammar stumbles over.
    Qml,
    JavaScript,
}

impl ProgrammingLanguage {
    /// Infers the programming language from file extension.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let file_path = Path::new(uri);
        match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("qml") => Some(Self::Qml),
            Some("js" | "mjs") => Some(Self::JavaScript),
            _ => None,
        }
    }

    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Self::Qml | Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::qml("Wallet.qml", Some(ProgrammingLanguage::Qml))]
    #[case::js("utils.js", Some(ProgrammingLanguage::JavaScript))]
    #[case::mjs("module.mjs", Some(ProgrammingLanguage::JavaScript))]
    #[case::multiple_dots("view.ui.qml", Some(ProgrammingLanguage::Qml))]
    #[case::catalog("be_BY.ts", None)]
    #[case::no_ext("file", None)]
    #[case::unknown_ext("file.txt", None)]
    fn test_from_uri(#[case] uri: &str, #[case] expected: Option<ProgrammingLanguage>) {
        let lang = ProgrammingLanguage::from_uri(uri);
        assert_eq!(lang, expected);
    }
}
