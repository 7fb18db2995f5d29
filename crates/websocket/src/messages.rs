use serde::{Deserialize, Serialize};

fn default_depth() -> String {
    "standard".to_string()
}

/// Frames a client may send. One `start` per session; `cancel` at any
/// time afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Start {
        api_key: String,
        company_name: String,
        #[serde(default = "default_depth")]
        depth: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        focus_areas: Option<Vec<String>>,
    },
    Cancel,
}

/// Session-level frames that are not run events: protocol errors,
/// credential rejection, and the busy signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Busy { message: String },
    Error { message: String },
}

impl ControlMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_frame_parses_with_defaults() {
        let json = r#"{"type": "start", "api_key": "k", "company_name": "Acme"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Start {
                depth, focus_areas, ..
            } => {
                assert_eq!(depth, "standard");
                assert!(focus_areas.is_none());
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn test_start_frame_keeps_unknown_depth_for_validation() {
        // Depth strings are validated by the orchestrator, not the
        // transport; a bogus value must parse and travel onward.
        let json = r#"{"type": "start", "api_key": "k", "company_name": "Acme", "depth": "bogus"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Start { depth, .. } if depth == "bogus"));
    }

    #[test]
    fn test_cancel_frame() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "cancel"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Cancel);
    }

    #[test]
    fn test_control_message_tags() {
        let json = serde_json::to_value(ControlMessage::error("invalid API key")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "invalid API key");

        let json = serde_json::to_value(ControlMessage::Busy {
            message: "busy".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "busy");
    }
}
