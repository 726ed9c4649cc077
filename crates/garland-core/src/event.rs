//! Channel events.
//!
//! The closed set of messages fanned out to channel members. The serde
//! representation is the wire shape: a tagged object with a `type`
//! discriminator (`join`, `push-object`, `leave`, `error`). New variants
//! force every consumer to be updated through the exhaustive matches below.

use crate::object::{Decoration, ObjectId};
use crate::user::UserInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes delivered in [`Event::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCode {
    /// The channel guard was not acquired within the lock timeout.
    Timeout,
    /// Join rejected because the roster is at capacity.
    Full,
    /// Push attempted by a non-member.
    Invalid,
    /// Push attempted again within the cooldown window.
    Cooldown,
    /// One or more fan-out deliveries failed.
    Unknown,
}

impl ErrorCode {
    /// Get the wire representation of the code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Timeout => "timeout",
            ErrorCode::Full => "full",
            ErrorCode::Invalid => "invalid",
            ErrorCode::Cooldown => "cooldown",
            ErrorCode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered to channel members.
///
/// Immutable once constructed; carries no identity beyond its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// A user joined the channel.
    Join { user: UserInfo },

    /// A decoration was placed, possibly evicting the oldest one.
    PushObject {
        object: Decoration,
        appender: UserInfo,
        evicted: Option<ObjectId>,
    },

    /// A user left the channel.
    Leave { user: UserInfo },

    /// An error delivered to a single connection.
    Error { code: ErrorCode, message: String },
}

impl Event {
    /// Create a new Join event.
    #[must_use]
    pub fn join(user: UserInfo) -> Self {
        Event::Join { user }
    }

    /// Create a new PushObject event.
    #[must_use]
    pub fn push_object(object: Decoration, appender: UserInfo, evicted: Option<ObjectId>) -> Self {
        Event::PushObject {
            object,
            appender,
            evicted,
        }
    }

    /// Create a new Leave event.
    #[must_use]
    pub fn leave(user: UserInfo) -> Self {
        Event::Leave { user }
    }

    /// Create a new Error event.
    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Event::Error {
            code,
            message: message.into(),
        }
    }

    /// Get the wire discriminator for this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Join { .. } => "join",
            Event::PushObject { .. } => "push-object",
            Event::Leave { .. } => "leave",
            Event::Error { .. } => "error",
        }
    }
}

/// Human-readable rendering used for transcript and history display.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Join { user } => write!(f, "{} joined", user.nickname),
            Event::PushObject {
                object, appender, ..
            } => write!(f, "{} placed \"{}\"", appender.nickname, object.comment),
            Event::Leave { user } => write!(f, "{} left", user.nickname),
            Event::Error { code, message } => write!(f, "error ({code}): {message}"),
        }
    }
}
