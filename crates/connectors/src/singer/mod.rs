//! Line-delimited Singer messages as a record source.

pub mod message;
pub mod reader;

pub use message::SingerMessage;
pub use reader::SingerReader;
