//! Wire frames exchanged over a channel socket.
//!
//! Channel events travel as the core [`Event`](garland_core::Event) type,
//! which already carries the `type` discriminator; the frames here cover the
//! rest of the conversation — the client's requests and the server's
//! handshake response.

use garland_core::{Decoration, Position, UserInfo};
use serde::{Deserialize, Serialize};

/// Client → server frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Handshake, sent once right after the socket opens. A missing nickname
    /// asks the server to generate one.
    Hello {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    },

    /// Place a decoration. The server mints the object id and timestamp.
    PushObject {
        url: String,
        comment: String,
        position: Position,
    },
}

impl ClientFrame {
    /// Create a new Hello frame.
    #[must_use]
    pub fn hello(nickname: Option<String>) -> Self {
        ClientFrame::Hello { nickname }
    }

    /// Create a new PushObject frame.
    #[must_use]
    pub fn push_object(
        url: impl Into<String>,
        comment: impl Into<String>,
        position: Position,
    ) -> Self {
        ClientFrame::PushObject {
            url: url.into(),
            comment: comment.into(),
            position,
        }
    }
}

/// Server → client frames that are not channel events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// Post-handshake snapshot: the caller's identity, the channel's current
    /// decorations in insertion order, and the roster.
    Welcome {
        user: UserInfo,
        objects: Vec<Decoration>,
        members: Vec<UserInfo>,
    },
}

impl ServerFrame {
    /// Create a new Welcome frame.
    #[must_use]
    pub fn welcome(user: UserInfo, objects: Vec<Decoration>, members: Vec<UserInfo>) -> Self {
        ServerFrame::Welcome {
            user,
            objects,
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hello_wire_shape() {
        let value = serde_json::to_value(ClientFrame::hello(Some("Ada".to_string()))).unwrap();
        assert_eq!(value, json!({"type": "hello", "nickname": "Ada"}));
    }

    #[test]
    fn test_hello_nickname_optional() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type": "hello"}"#).unwrap();
        assert_eq!(frame, ClientFrame::hello(None));
    }

    #[test]
    fn test_push_object_request() {
        let frame: ClientFrame = serde_json::from_value(json!({
            "type": "push-object",
            "url": "/decos/bauble.png",
            "comment": "shiny",
            "position": {"x": 10, "y": 20},
        }))
        .unwrap();
        assert_eq!(
            frame,
            ClientFrame::push_object("/decos/bauble.png", "shiny", Position::new(10, 20))
        );
    }

    #[test]
    fn test_welcome_wire_shape() {
        let frame = ServerFrame::welcome(UserInfo::new("u1", "Ada"), vec![], vec![]);
        let value = serde_json::to_value(frame).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "welcome",
                "user": {"id": "u1", "nickname": "Ada"},
                "objects": [],
                "members": [],
            })
        );
    }
}
