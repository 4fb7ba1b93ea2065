//! メッセージ ID 使用箇所の中間表現

use crate::interned::MessageId;
use crate::types::SourceRange;

/// ソースコード内での `qsTrId("...")` 呼び出し箇所
#[salsa::interned(debug)]
pub struct MessageUse {
    /// メッセージ ID（インターン化）
    pub id: MessageId<'db>,

    /// ID 文字列リテラルのソースコード上の範囲（引用符を除く）
    pub range: SourceRange,

    /// ID 引数のソースコード上の範囲（引用符を含む、補完の置換範囲）
    pub arg_range: SourceRange,
}
