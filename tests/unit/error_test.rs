//! Tests for error types

use imagine_gate::core::{ComputeError, JobError, StoreError, WhitelistError};

#[test]
fn test_whitelist_error_messages() {
    assert_eq!(WhitelistError::ActingUserNotFound.to_string(), "acting user not found");
    assert_eq!(WhitelistError::NotPermitted.to_string(), "operation not permitted");
    assert_eq!(WhitelistError::AlreadyWhitelisted.to_string(), "user already whitelisted");
    assert_eq!(WhitelistError::NotWhitelisted.to_string(), "user not whitelisted");
    assert_eq!(WhitelistError::UserNotFound.to_string(), "user not found");
}

#[test]
fn test_store_error_becomes_persistence() {
    let err: WhitelistError = StoreError::DuplicateEntry(7).into();
    assert_eq!(
        err,
        WhitelistError::Persistence(
            "whitelist document holds more than one entry for actor 7".to_string()
        )
    );
}

#[test]
fn test_compute_error_becomes_compute_failed() {
    let err: JobError = ComputeError::new("out of memory").into();
    assert_eq!(err, JobError::ComputeFailed("out of memory".to_string()));
    assert_eq!(err.to_string(), "compute failed: out of memory");
}

#[test]
fn test_shutdown_error() {
    assert_eq!(JobError::Shutdown.to_string(), "job serializer has been shut down");
}
