//! Compute worker configuration.

use serde::{Deserialize, Serialize};

/// Smallest stack accepted for the compute worker.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Settings for the serializer's dedicated compute thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// OS thread name of the compute worker.
    pub thread_name: String,
    /// Stack size of the compute worker in bytes.
    pub thread_stack_size: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            thread_name: "imagine-compute".to_string(),
            thread_stack_size: 8 * 1024 * 1024,
        }
    }
}

impl SerializerConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the worker stack size in bytes.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!(
                "thread_stack_size must be at least {MIN_STACK_SIZE} bytes"
            ));
        }
        Ok(())
    }
}
