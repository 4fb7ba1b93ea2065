//! Tree-sitter ベースのソースコード解析

pub mod extractor;
pub mod query_loader;
pub mod types;
