//! 入力定義 (カタログファイルとソースファイル)

pub mod catalog;
pub mod linguist;
pub mod source;
