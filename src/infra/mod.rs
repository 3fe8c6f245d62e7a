//! Infrastructure adapters for whitelist persistence.

pub mod store;

pub use store::{InMemoryBackend, JsonFileBackend};
