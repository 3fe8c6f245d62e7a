//! Whitelist persistence backends.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileBackend;
pub use memory::InMemoryBackend;
