//! 中間表現

pub mod message_use;
