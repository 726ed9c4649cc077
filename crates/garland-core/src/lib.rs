//! # garland-core
//!
//! Core types and channel state machine for the Garland shared-canvas
//! server.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **Channel** - Shared roster + decoration store behind an exclusive guard
//! - **ChannelController** - Registry owning channel lifecycle
//! - **Event** - The closed set of messages fanned out to members
//! - **UserConnection** - The one capability the core needs from a transport
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────────┐     ┌─────────────┐
//! │  Connection │────▶│ ChannelController │────▶│   Channel   │
//! └─────────────┘     └───────────────────┘     └─────────────┘
//!        ▲                                             │
//!        └────────────────── Event ◀───────────────────┘
//! ```
//!
//! All mutations on one channel are serialized by its guard, acquired with a
//! policy-bound deadline; the resulting event is fanned out concurrently to
//! every other member, with per-recipient failures isolated and reported to
//! the publisher.

pub mod channel;
pub mod controller;
pub mod event;
pub mod object;
pub mod policy;
pub mod user;

pub use channel::{Channel, ChannelId, LeaveOutcome};
pub use controller::ChannelController;
pub use event::{ErrorCode, Event};
pub use object::{generate_object_id, Decoration, DecorationStore, ObjectId, Position};
pub use policy::ChannelPolicy;
pub use user::{DeliveryError, User, UserConnection, UserId, UserInfo};
