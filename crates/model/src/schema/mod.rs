pub mod error;
pub mod field;
