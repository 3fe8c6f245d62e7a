//! Configuration models for the whitelist and the compute worker.

pub mod gate;
pub mod serializer;

pub use gate::{ConfigError, GateConfig};
pub use serializer::SerializerConfig;
