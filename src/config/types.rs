use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub qml_i18n: LinguistSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinguistSettings {
    pub catalog_files: CatalogFilesConfig,

    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    /// Language the `<source>` texts are written in.
    pub source_language: String,

    /// Function names whose first string argument is a message id.
    pub trans_fn_names: Vec<String>,

    pub indexing: IndexingConfig,

    /// Locales that require translations.
    ///
    /// - `None`: All detected locales are required (default)
    /// - `Some([...])`: Only specified locales are required
    ///
    /// Mutually exclusive with `optional_locales`.
    pub required_locales: Option<Vec<String>>,

    /// Locales where missing translations are ignored.
    ///
    /// Mutually exclusive with `required_locales`.
    pub optional_locales: Option<Vec<String>>,

    pub diagnostics: DiagnosticsConfig,

    /// Locale priority for hover previews when `currentLanguage` is unset.
    pub primary_locales: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Parallel thread count for indexing.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    /// Report message ids whose translation is missing or unfinished.
    pub unfinished: bool,
    /// Report translations whose `%N`/`%n` marker set differs from the
    /// source text.
    pub placeholders: bool,
    /// Report ids whose `<source>` text differs between locale catalogs.
    pub source_consistency: bool,
    /// Report catalog messages never referenced from source code.
    pub unused_messages: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { unfinished: true, placeholders: true, source_consistency: true, unused_messages: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFilesConfig {
    pub file_pattern: String,
}

impl LinguistSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Conflicting locale lists
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.source_language.is_empty() {
            errors.push(ValidationError::new(
                "sourceLanguage",
                "The source language cannot be empty. Example: \"en\"",
            ));
        }

        if self.trans_fn_names.is_empty() {
            errors.push(ValidationError::new(
                "transFnNames",
                "At least one function name is required. Example: [\"qsTrId\"]",
            ));
        }

        if self.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "includePatterns",
                "At least one pattern is required. Example: [\"**/*.{qml,js}\"]",
            ));
        }

        for (index, pattern) in self.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.catalog_files.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "catalogFiles.filePattern",
                "The pattern cannot be empty. Example: \"**/{i18n,translations}/**/*.ts\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.catalog_files.file_pattern) {
            errors.push(ValidationError::new(
                "catalogFiles.filePattern",
                format!("Invalid glob pattern '{}': {e}", self.catalog_files.file_pattern),
            ));
        }

        if self.required_locales.is_some() && self.optional_locales.is_some() {
            errors.push(ValidationError::new(
                "requiredLocales/optionalLocales",
                "Cannot specify both 'requiredLocales' and 'optionalLocales'. Please use only one",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for CatalogFilesConfig {
    fn default() -> Self {
        Self { file_pattern: "**/{i18n,translations}/**/*.ts".to_string() }
    }
}

impl Default for LinguistSettings {
    fn default() -> Self {
        Self {
            catalog_files: CatalogFilesConfig::default(),
            include_patterns: vec!["**/*.{qml,js}".to_string()],
            exclude_patterns: vec!["build/**".to_string()],
            source_language: "en".to_string(),
            trans_fn_names: vec!["qsTrId".to_string(), "QT_TRID_NOOP".to_string()],
            indexing: IndexingConfig::default(),
            required_locales: None,
            optional_locales: None,
            diagnostics: DiagnosticsConfig::default(),
            primary_locales: None,
        }
    }
}
