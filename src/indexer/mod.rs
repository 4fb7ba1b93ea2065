//! ワークスペースのインデックス作成

pub mod types;
pub mod workspace;

pub use types::{
    IndexedWorkspace,
    IndexerError,
};
pub use workspace::WorkspaceIndexer;
