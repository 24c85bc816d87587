pub mod error;
pub mod format;
pub mod singer;
pub mod source;
pub mod storage;
