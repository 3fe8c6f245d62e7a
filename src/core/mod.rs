//! Core admission abstractions: the tiered whitelist and the job serializer.

pub mod audit;
pub mod error;
pub mod executor;
pub mod job;
pub mod serializer;
pub mod whitelist;

pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, ComputeError, JobError, StoreError, WhitelistError};
pub use executor::ImageGenerator;
pub use job::{DisplayParameters, Image, Job, Preset, RedoToken};
pub use serializer::{ExecutionPermit, JobSerializer, JobStatus, SerializerStats, SYSTEM_ACTOR};
pub use whitelist::{AuthorizationStore, WhitelistBackend, WhitelistEntry, WhitelistOutcome};
