//! Users and the connection capability.
//!
//! The core never talks to a transport directly. It sees a connection only as
//! "something that can asynchronously accept one outbound event"; everything
//! else about the connection is the transport layer's concern.

use crate::event::Event;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A user identifier, opaque to the core.
pub type UserId = String;

/// Delivery failure surfaced by a connection's `send`.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The connection is gone.
    #[error("connection closed")]
    Closed,

    /// The connection rejected the event.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// The single capability the core requires from a connection: asynchronously
/// deliver one event. A failed delivery is observed as an error from `send`;
/// retry and transport cleanup are the connection's responsibility.
#[async_trait]
pub trait UserConnection: Send + Sync {
    /// Deliver an event to this connection.
    async fn send(&self, event: Event) -> Result<(), DeliveryError>;
}

/// Externally visible identity of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub nickname: String,
}

impl UserInfo {
    /// Create a new user identity.
    #[must_use]
    pub fn new(id: impl Into<UserId>, nickname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
        }
    }
}

/// A connected participant: identity plus session and the send capability.
///
/// Constructed by the transport layer on connect and held by exactly one
/// channel's roster for the duration of membership.
#[derive(Clone)]
pub struct User {
    /// Externally visible identity.
    pub info: UserInfo,
    /// Opaque session identifier supplied by the transport layer.
    pub session: String,
    /// Outbound delivery capability.
    pub connection: Arc<dyn UserConnection>,
}

impl User {
    /// Create a new user bound to a connection.
    #[must_use]
    pub fn new(
        id: impl Into<UserId>,
        nickname: impl Into<String>,
        session: impl Into<String>,
        connection: Arc<dyn UserConnection>,
    ) -> Self {
        Self {
            info: UserInfo::new(id, nickname),
            session: session.into(),
            connection,
        }
    }

    /// Get the user id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.info.id
    }

    /// Get the nickname.
    #[must_use]
    pub fn nickname(&self) -> &str {
        &self.info.nickname
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("info", &self.info)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
