//! # garland-protocol
//!
//! Wire protocol for the Garland shared-canvas server.
//!
//! Frames are UTF-8 JSON objects tagged with a `type` discriminator:
//!
//! - `hello` / `push-object` - Client requests
//! - `welcome` - Server handshake response with the channel snapshot
//! - `join` / `push-object` / `leave` / `error` - Channel events, serialized
//!   directly from [`garland_core::Event`]
//!
//! ## Example
//!
//! ```rust
//! use garland_protocol::{codec, ClientFrame};
//!
//! let frame: ClientFrame = codec::decode(r#"{"type": "hello"}"#).unwrap();
//! let encoded = codec::encode(&frame).unwrap();
//! ```

pub mod codec;
pub mod frames;

pub use codec::{decode, encode, ProtocolError, MAX_FRAME_SIZE};
pub use frames::{ClientFrame, ServerFrame};
