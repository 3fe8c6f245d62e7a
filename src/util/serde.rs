//! Shared identifier and value types that cross the persistence boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque actor identifier (a chat-platform user id).
pub type ActorId = u64;

/// Unix timestamp in seconds, fractional part allowed.
pub type UnixSeconds = f64;

/// Permission tier of a whitelisted actor.
///
/// Tiers are totally ordered: `User < Moderator < Sudo`. On disk a tier is the
/// bare integer `1`, `2` or `3`; anything else is rejected when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PermissionTier {
    /// May invoke the guarded operation.
    User = 1,
    /// May additionally add, remove and update tier-1 actors.
    Moderator = 2,
    /// May administer actors up to tier 2 as well.
    Sudo = 3,
}

impl PermissionTier {
    /// Highest tier, held by the bootstrap owner.
    pub const MAX: Self = Self::Sudo;

    /// Numeric level of the tier.
    #[must_use]
    pub const fn level(self) -> u8 {
        self as u8
    }

    /// Whether this tier may administer other actors at all.
    #[must_use]
    pub fn can_manage(self) -> bool {
        self >= Self::Moderator
    }

    /// All tiers in ascending order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::User, Self::Moderator, Self::Sudo]
    }
}

impl TryFrom<u8> for PermissionTier {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::User),
            2 => Ok(Self::Moderator),
            3 => Ok(Self::Sudo),
            other => Err(InvalidTier(other)),
        }
    }
}

impl From<PermissionTier> for u8 {
    fn from(tier: PermissionTier) -> Self {
        tier.level()
    }
}

impl fmt::Display for PermissionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Rejected tier value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid permission tier {0}, expected 1, 2 or 3")]
pub struct InvalidTier(pub u8);
