//! Channel policy.

use std::time::Duration;

/// Capacity and timing configuration bound to a channel at creation.
/// Read-only afterwards; the registry applies the same policy to every
/// channel it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPolicy {
    /// Decoration-store capacity; beyond it the oldest-inserted entry is
    /// evicted.
    pub max_objects: usize,
    /// Roster capacity.
    pub max_ccu: usize,
    /// Deadline for acquiring the channel guard.
    pub lock_timeout: Duration,
    /// Minimum interval between two pushes by the same user. Zero disables
    /// the check.
    pub cooldown: Duration,
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self {
            max_objects: 30,
            max_ccu: 10,
            lock_timeout: Duration::from_secs(1),
            cooldown: Duration::ZERO,
        }
    }
}
