pub mod identifiers;
pub mod sanitize;
pub mod value;
