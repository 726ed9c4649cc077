//! Channel state and operations.
//!
//! A channel is the unit of shared state: a roster of connected users and a
//! bounded store of placed decorations. Every mutating operation runs under
//! the channel's exclusive guard and fans the resulting event out to every
//! other member. Rejections and delivery failures are reported as [`Event`]s
//! to the affected connection; the public operations themselves never fail.

use crate::event::{ErrorCode, Event};
use crate::object::{Decoration, DecorationStore};
use crate::policy::ChannelPolicy;
use crate::user::{User, UserId, UserInfo};
use futures_util::future;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::{debug, warn};

/// A channel identifier, derived from the route path by the caller.
pub type ChannelId = String;

/// Roster, decoration store, and push bookkeeping, owned by the guard.
#[derive(Default)]
struct ChannelState {
    users: HashMap<UserId, User>,
    objects: DecorationStore,
    last_push: HashMap<UserId, Instant>,
}

/// What happened to the roster on [`Channel::leave`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The user was not a member; nothing changed.
    NotMember,
    /// The user left; other members remain.
    Departed,
    /// The user left and the roster is now empty.
    Emptied,
}

/// A live channel.
///
/// The policy is fixed at construction; all mutable state lives behind the
/// guard. Independent channels share nothing and may be driven concurrently.
pub struct Channel {
    id: ChannelId,
    policy: ChannelPolicy,
    state: Mutex<ChannelState>,
}

impl Channel {
    /// Create a new channel bound to a policy.
    #[must_use]
    pub fn new(id: impl Into<ChannelId>, policy: ChannelPolicy) -> Self {
        Self {
            id: id.into(),
            policy,
            state: Mutex::new(ChannelState::default()),
        }
    }

    /// Get the channel id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the channel policy.
    #[must_use]
    pub fn policy(&self) -> &ChannelPolicy {
        &self.policy
    }

    /// Acquire the guard within `lock_timeout`, delivering a timeout error to
    /// `initiator` on failure. The guard releases on every exit path when the
    /// returned handle drops.
    async fn lock_with_timeout(&self, initiator: &User) -> Option<MutexGuard<'_, ChannelState>> {
        match timeout(self.policy.lock_timeout, self.state.lock()).await {
            Ok(guard) => Some(guard),
            Err(_) => {
                debug!(channel = %self.id, user = %initiator.id(), "Guard acquisition timed out");
                deliver(initiator, Event::error(ErrorCode::Timeout, "Timeout")).await;
                None
            }
        }
    }

    /// Add a user to the roster and announce the join to every other member.
    ///
    /// A duplicate join is a silent no-op. A full roster rejects with a
    /// `full` error delivered to the joiner only.
    pub async fn join(&self, user: User) {
        let Some(mut state) = self.lock_with_timeout(&user).await else {
            return;
        };

        if state.users.contains_key(user.id()) {
            return;
        }

        if state.users.len() >= self.policy.max_ccu {
            debug!(channel = %self.id, user = %user.id(), "Join rejected: roster full");
            deliver(&user, Event::error(ErrorCode::Full, "Full users")).await;
            return;
        }

        let event = Event::join(user.info.clone());
        let joiner = user.id().to_string();
        state.users.insert(joiner.clone(), user);
        debug!(channel = %self.id, user = %joiner, members = state.users.len(), "User joined");

        broadcast(&state, &event, &joiner).await;
    }

    /// Insert a decoration and announce it to every other member.
    ///
    /// A non-member push rejects with an `invalid` error and inserts nothing.
    /// A push within the cooldown window of the appender's previous push
    /// rejects with a `cooldown` error. At capacity the oldest-inserted
    /// decoration is evicted first and named in the broadcast event.
    pub async fn push_object(&self, object: Decoration, appender: &User) {
        let Some(mut state) = self.lock_with_timeout(appender).await else {
            return;
        };

        if !state.users.contains_key(appender.id()) {
            warn!(channel = %self.id, user = %appender.id(), "Push by non-member rejected");
            deliver(appender, Event::error(ErrorCode::Invalid, "invalid")).await;
            return;
        }

        if !self.policy.cooldown.is_zero() {
            if let Some(last) = state.last_push.get(appender.id()) {
                if last.elapsed() < self.policy.cooldown {
                    debug!(channel = %self.id, user = %appender.id(), "Push rejected: cooldown");
                    deliver(appender, Event::error(ErrorCode::Cooldown, "Too fast")).await;
                    return;
                }
            }
        }

        let evicted = state.objects.insert(object.clone(), self.policy.max_objects);
        state
            .last_push
            .insert(appender.id().to_string(), Instant::now());
        debug!(
            channel = %self.id,
            user = %appender.id(),
            object = %object.id,
            evicted = ?evicted,
            "Decoration placed"
        );

        let event = Event::push_object(object, appender.info.clone(), evicted);
        broadcast(&state, &event, appender.id()).await;
    }

    /// Remove a user from the roster and announce the departure to the
    /// remaining members.
    ///
    /// Runs on disconnect: the guard is acquired without a deadline and no
    /// timeout error is reported, since there is no reliable destination for
    /// one. The caller destroys the channel when [`LeaveOutcome::Emptied`] is
    /// returned.
    pub async fn leave(&self, user: &User) -> LeaveOutcome {
        let mut state = self.state.lock().await;

        if state.users.remove(user.id()).is_none() {
            return LeaveOutcome::NotMember;
        }
        state.last_push.remove(user.id());
        debug!(channel = %self.id, user = %user.id(), members = state.users.len(), "User left");

        if state.users.is_empty() {
            return LeaveOutcome::Emptied;
        }

        broadcast(&state, &Event::leave(user.info.clone()), user.id()).await;
        LeaveOutcome::Departed
    }

    /// Snapshot of the decoration store in insertion order.
    pub async fn objects(&self) -> Vec<Decoration> {
        self.state.lock().await.objects.snapshot()
    }

    /// Snapshot of the roster.
    pub async fn members(&self) -> Vec<UserInfo> {
        self.state
            .lock()
            .await
            .users
            .values()
            .map(|u| u.info.clone())
            .collect()
    }

    /// Get the number of joined users.
    pub async fn member_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    /// Check if a user id is on the roster.
    pub async fn is_member(&self, id: &str) -> bool {
        self.state.lock().await.users.contains_key(id)
    }

    /// Check if the roster is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.users.is_empty()
    }
}

/// Best-effort direct delivery to a single user.
async fn deliver(user: &User, event: Event) {
    if let Err(error) = user.connection.send(event).await {
        warn!(user = %user.id(), %error, "Direct delivery failed");
    }
}

/// Fan an event out to every member except the publisher.
///
/// All deliveries run concurrently and independently; a failed recipient
/// never blocks the others. Any failure is reported to the publisher as a
/// single `unknown` error. The mutation that produced the event is never
/// undone.
async fn broadcast(state: &ChannelState, event: &Event, publisher: &str) {
    let sends = state
        .users
        .values()
        .filter(|user| user.id() != publisher)
        .map(|user| {
            let event = event.clone();
            async move {
                user.connection
                    .send(event)
                    .await
                    .map_err(|error| (user.id().to_string(), error))
            }
        });

    let failures: Vec<_> = future::join_all(sends)
        .await
        .into_iter()
        .filter_map(Result::err)
        .collect();

    if failures.is_empty() {
        return;
    }

    for (user, error) in &failures {
        warn!(user = %user, %error, "Fan-out delivery failed");
    }

    if let Some(publisher) = state.users.get(publisher) {
        deliver(
            publisher,
            Event::error(ErrorCode::Unknown, "Failed with unknown reason"),
        )
        .await;
    }
}
