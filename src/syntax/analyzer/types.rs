//! Types for the analyzer module

use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use tower_lsp::lsp_types::Range;

/// Tree-sitter クエリで使用するキャプチャ名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureName {
    /// `qsTrId("...")` 呼び出し全体
    Call,
    /// 呼び出しの関数名 (e.g., `qsTrId`)
    CallFnName,
    /// メッセージ ID の文字列リテラル部分（引用符を除く）
    MessageId,
    /// メッセージ ID の引数ノード（引用符を含む）
    MessageIdArg,
}

impl CaptureName {
    /// Tree-sitter クエリで使用する文字列表現を取得
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "i18n.call",
            Self::CallFnName => "i18n.call_fn_name",
            Self::MessageId => "i18n.message_id",
            Self::MessageIdArg => "i18n.message_id_arg",
        }
    }
}

/// 文字列から `CaptureName` への変換エラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCaptureNameError;

impl FromStr for CaptureName {
    type Err = ParseCaptureNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i18n.call" => Ok(Self::Call),
            "i18n.call_fn_name" => Ok(Self::CallFnName),
            "i18n.message_id" => Ok(Self::MessageId),
            "i18n.message_id_arg" => Ok(Self::MessageIdArg),
            _ => Err(ParseCaptureNameError),
        }
    }
}

/// Information about a message-id function call found in source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrIdCall {
    /// Message id (string literal content)
    pub id: String,
    /// Range of the id string fragment (without quotes)
    pub id_node: Range,
    /// Range of the id argument (including quotes)
    pub id_arg_node: Range,
    /// Function name at the call site (e.g., `qsTrId`)
    pub fn_name: String,
}

/// Defines errors that may occur during the analysis process
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Error when failing to set the language for the parser
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    /// Error when failing to parse source code
    #[error("Failed to parse source code")]
    ParseFailed,
}
