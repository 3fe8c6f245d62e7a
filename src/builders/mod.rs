//! Builders to assemble the gate from configuration.

pub mod gate_builder;

pub use gate_builder::{build_gate, build_gate_with_backend, Gate};
