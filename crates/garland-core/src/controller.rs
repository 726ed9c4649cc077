//! Channel registry.
//!
//! The controller is the sole owner of channel creation and destruction. It
//! is constructed once at process start and injected into the connection
//! handlers; a channel never destroys itself.

use crate::channel::{Channel, ChannelId, LeaveOutcome};
use crate::policy::ChannelPolicy;
use crate::user::User;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of live channels, all bound to the same policy.
pub struct ChannelController {
    channels: DashMap<ChannelId, Arc<Channel>>,
    policy: ChannelPolicy,
}

impl ChannelController {
    /// Create a new controller. Every channel it creates is bound to
    /// `policy`.
    #[must_use]
    pub fn new(policy: ChannelPolicy) -> Self {
        info!(?policy, "Creating channel controller");
        Self {
            channels: DashMap::new(),
            policy,
        }
    }

    /// Pure lookup, no side effect.
    #[must_use]
    pub fn get_channel(&self, id: &str) -> Option<Arc<Channel>> {
        self.channels.get(id).map(|entry| Arc::clone(&entry))
    }

    /// Get-or-create: return the registered channel for `id`, creating and
    /// registering it first if absent.
    pub fn create_channel(&self, id: &str) -> Arc<Channel> {
        let entry = self.channels.entry(id.to_string()).or_insert_with(|| {
            debug!(channel = %id, "Creating channel");
            Arc::new(Channel::new(id, self.policy.clone()))
        });
        Arc::clone(&entry)
    }

    /// Remove a channel from the registry.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered; closing an unknown channel is a
    /// caller contract violation, not a runtime condition.
    pub fn close_channel(&self, id: &str) {
        assert!(
            self.channels.remove(id).is_some(),
            "close_channel: unknown channel {id}"
        );
        debug!(channel = %id, "Channel closed");
    }

    /// Run `leave` on the user's channel and destroy the channel when the
    /// last member departs. A no-op for unknown channel ids.
    pub async fn leave(&self, channel_id: &str, user: &User) {
        let Some(channel) = self.get_channel(channel_id) else {
            return;
        };
        if channel.leave(user).await == LeaveOutcome::Emptied {
            self.close_channel(channel_id);
        }
    }

    /// Get the number of registered channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Get all registered channel ids.
    #[must_use]
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|e| e.key().clone()).collect()
    }
}
