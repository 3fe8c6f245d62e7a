//! Tests for utility functions

use imagine_gate::util::{now_ms, now_secs, InvalidTier, PermissionTier};

#[test]
fn test_tier_levels() {
    let levels: Vec<u8> = PermissionTier::all().iter().map(|t| t.level()).collect();
    assert_eq!(levels, vec![1, 2, 3]);
}

#[test]
fn test_tier_from_u8() {
    assert_eq!(PermissionTier::try_from(2), Ok(PermissionTier::Moderator));
    assert_eq!(PermissionTier::try_from(0), Err(InvalidTier(0)));
}

#[test]
fn test_tier_display() {
    assert_eq!(PermissionTier::Sudo.to_string(), "3");
}

#[test]
fn test_clock_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
    assert!(now_secs() > 1_577_836_800.0);
}

#[test]
fn test_init_tracing_is_idempotent() {
    imagine_gate::util::init_tracing();
    imagine_gate::util::init_tracing();
    imagine_gate::util::init_tracing_debug();
    tracing::info!("tracing initialized");
}
