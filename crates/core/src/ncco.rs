//! Call-control instruction (NCCO) payloads.
//!
//! An NCCO is an ordered list of actions the voice API executes against a
//! call: speaking a message, attaching the call audio to a streaming
//! endpoint, or placing the call into a named conversation. The answer
//! webhook returns one of these lists, and the outbound-call request carries
//! one.

use serde::{Deserialize, Serialize};

/// One action in a call-control instruction list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum NccoAction {
    /// Speak a message into the call with the given voice parameters.
    Talk {
        text: String,
        language: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        premium: Option<bool>,
    },
    /// Attach the call audio to a streaming endpoint.
    Connect { endpoint: Vec<Endpoint> },
    /// Place the call into a named conversation.
    Conversation {
        name: String,
        #[serde(rename = "endOnExit", skip_serializing_if = "Option::is_none")]
        end_on_exit: Option<bool>,
    },
}

/// Streaming endpoint for a `connect` action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Endpoint {
    /// A websocket the voice API streams the raw call audio to.
    Websocket {
        uri: String,
        #[serde(rename = "content-type")]
        content_type: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn talk_action_serializes_with_voice_params() {
        let action = NccoAction::Talk {
            text: "hello".to_string(),
            language: "ja-JP".to_string(),
            style: Some(3),
            premium: Some(true),
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "talk");
        assert_eq!(json["text"], "hello");
        assert_eq!(json["language"], "ja-JP");
        assert_eq!(json["style"], 3);
        assert_eq!(json["premium"], true);
    }

    #[test]
    fn talk_action_omits_unset_voice_params() {
        let action = NccoAction::Talk {
            text: "hello".to_string(),
            language: "en-US".to_string(),
            style: None,
            premium: None,
        };

        let json = serde_json::to_value(&action).unwrap();
        assert!(json.get("style").is_none());
        assert!(json.get("premium").is_none());
    }

    #[test]
    fn websocket_endpoint_uses_wire_field_names() {
        let action = NccoAction::Connect {
            endpoint: vec![Endpoint::Websocket {
                uri: "wss://example.com/ws".to_string(),
                content_type: "audio/l16;rate=8000".to_string(),
            }],
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "connect");
        assert_eq!(json["endpoint"][0]["type"], "websocket");
        assert_eq!(json["endpoint"][0]["content-type"], "audio/l16;rate=8000");
        assert_eq!(json["endpoint"][0]["uri"], "wss://example.com/ws");
    }

    #[test]
    fn conversation_action_renames_end_on_exit() {
        let action = NccoAction::Conversation {
            name: "kaiwa-test".to_string(),
            end_on_exit: Some(true),
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "conversation");
        assert_eq!(json["name"], "kaiwa-test");
        assert_eq!(json["endOnExit"], true);

        let bare = NccoAction::Conversation {
            name: "kaiwa-test".to_string(),
            end_on_exit: None,
        };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("endOnExit").is_none());
    }

    #[test]
    fn ncco_deserializes_from_wire_form() {
        let json = r#"[
            {"action": "talk", "text": "hi", "language": "ja-JP"},
            {"action": "conversation", "name": "room", "endOnExit": true}
        ]"#;

        let ncco: Vec<NccoAction> = serde_json::from_str(json).unwrap();
        assert_eq!(ncco.len(), 2);
        assert!(matches!(&ncco[0], NccoAction::Talk { text, .. } if text == "hi"));
        assert!(matches!(
            &ncco[1],
            NccoAction::Conversation { end_on_exit: Some(true), .. }
        ));
    }
}
