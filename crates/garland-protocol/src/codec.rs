//! Codec for encoding and decoding Garland frames.
//!
//! Frames travel as UTF-8 JSON in WebSocket text messages. The codec bounds
//! frame size in both directions; oversized or malformed frames are protocol
//! errors, never panics.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Maximum frame size (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// JSON encoding or decoding error.
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encode a frame as a JSON string.
///
/// # Errors
///
/// Returns an error if the frame is too large or serialization fails.
pub fn encode<T: Serialize>(frame: &T) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(frame)?;
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }
    Ok(text)
}

/// Decode a frame from a JSON string.
///
/// # Errors
///
/// Returns an error if the input is too large or not a valid frame.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(text.len()));
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{ClientFrame, ServerFrame};
    use garland_core::{Decoration, Event, Position, UserInfo};

    #[test]
    fn test_client_frame_roundtrip() {
        let frames = vec![
            ClientFrame::hello(Some("Ada".to_string())),
            ClientFrame::hello(None),
            ClientFrame::push_object("/decos/star.png", "top of the tree", Position::new(200, 0)),
        ];

        for frame in frames {
            let encoded = encode(&frame).unwrap();
            let decoded: ClientFrame = decode(&encoded).unwrap();
            assert_eq!(frame, decoded);
        }
    }

    #[test]
    fn test_server_frame_roundtrip() {
        let frame = ServerFrame::welcome(
            UserInfo::new("u1", "Ada"),
            vec![Decoration::new(
                "obj_1",
                "/decos/bauble.png",
                "shiny",
                Position::new(3, 4),
            )],
            vec![UserInfo::new("u1", "Ada")],
        );

        let encoded = encode(&frame).unwrap();
        let decoded: ServerFrame = decode(&encoded).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn test_event_passes_through_codec() {
        let event = Event::join(UserInfo::new("u1", "Ada"));
        let encoded = encode(&event).unwrap();
        let decoded: Event = decode(&encoded).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_frame_too_large() {
        let frame = ClientFrame::push_object(
            "x".repeat(MAX_FRAME_SIZE),
            "too big",
            Position::new(0, 0),
        );

        match encode(&frame) {
            Err(ProtocolError::FrameTooLarge(_)) => {}
            other => panic!("Expected FrameTooLarge error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_oversized_input() {
        let text = " ".repeat(MAX_FRAME_SIZE + 1);
        match decode::<ClientFrame>(&text) {
            Err(ProtocolError::FrameTooLarge(_)) => {}
            other => panic!("Expected FrameTooLarge error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode::<ClientFrame>("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode::<ClientFrame>(r#"{"type": "mystery"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
