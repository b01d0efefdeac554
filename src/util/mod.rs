pub mod cursor;
pub mod file;
