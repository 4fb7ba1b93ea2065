//! Indexer type definitions.

use std::path::PathBuf;

use thiserror::Error;
use tower_lsp::lsp_types::Url;

/// Workspace files discovered and read by the indexer.
///
/// The indexer only does IO; turning these into salsa inputs is the
/// server state's job.
#[derive(Debug, Default)]
pub struct IndexedWorkspace {
    /// Catalog files (`.ts`) with their raw XML.
    pub catalog_files: Vec<(PathBuf, String)>,
    /// QML/JS source files with their content.
    pub source_files: Vec<(Url, String)>,
}

#[derive(Error, Debug)]
pub enum IndexerError {
    /// Error when failing to read a file
    #[error("Failed to read file: {0}")]
    InvalidPath(String),
    /// Other generic error
    #[error("An error occurred: {0}")]
    Error(String),
}
