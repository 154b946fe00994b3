use crate::audit::InfractionRecord;
use crate::error::Result;
use crate::scan::ElementRecord;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire names accepted on the cross-frame channel
pub const MESSAGE_TYPES: &[&str] = &[
    "getXpathFrame",
    "refreshXpathFrame",
    "refreshElements",
    "elementsOniFrame",
    "infractionsOnFrame",
];

/// Message exchanged between a frame and its parent or child frames
///
/// Encoded as `{"type": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FrameMessage {
    /// Child to parent: send every iframe its locator
    #[serde(rename = "getXpathFrame")]
    RequestIdentity,

    /// Parent to child: the locator of the iframe the child is loaded in
    #[serde(rename = "refreshXpathFrame")]
    AssignIdentity(String),

    /// Rescan, then propagate to nested frames
    #[serde(rename = "refreshElements")]
    Rescan,

    /// Child to parent: a frame's element list, relayed up to the top frame
    #[serde(rename = "elementsOniFrame")]
    Elements(Vec<ElementRecord>),

    /// Child to parent: a frame's infractions, relayed up to the top frame
    #[serde(rename = "infractionsOnFrame")]
    Infractions(Vec<InfractionRecord>),
}

impl FrameMessage {
    /// Decode a received payload; unknown or malformed messages yield `None`
    pub fn decode(payload: &Value) -> Option<Self> {
        let kind = payload.get("type").and_then(Value::as_str)?;
        if !MESSAGE_TYPES.contains(&kind) {
            debug!("Ignoring message of unknown type {}", kind);
            return None;
        }

        match serde_json::from_value(payload.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                debug!("Ignoring malformed {} message: {}", kind, e);
                None
            }
        }
    }

    pub fn encode(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Wire name of this message
    pub fn kind(&self) -> &'static str {
        match self {
            FrameMessage::RequestIdentity => "getXpathFrame",
            FrameMessage::AssignIdentity(_) => "refreshXpathFrame",
            FrameMessage::Rescan => "refreshElements",
            FrameMessage::Elements(_) => "elementsOniFrame",
            FrameMessage::Infractions(_) => "infractionsOnFrame",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{Locator, Quality};
    use crate::scan::FrameLocator;
    use serde_json::json;

    #[test]
    fn test_wire_shapes() {
        assert_eq!(
            FrameMessage::RequestIdentity.encode().unwrap(),
            json!({"type": "getXpathFrame"})
        );
        assert_eq!(
            FrameMessage::AssignIdentity("//iframe[@id=\"a\"]".into()).encode().unwrap(),
            json!({"type": "refreshXpathFrame", "data": "//iframe[@id=\"a\"]"})
        );

        let locator = Locator::new("//a", Quality::Positional);
        let record = ElementRecord::new("a", locator, FrameLocator::Root);
        let encoded = FrameMessage::Elements(vec![record]).encode().unwrap();
        assert_eq!(encoded["type"], "elementsOniFrame");
        assert_eq!(encoded["data"][0]["TAGNAME"], "<a>");
    }

    #[test]
    fn test_decode_known_messages() {
        assert_eq!(
            FrameMessage::decode(&json!({"type": "refreshElements"})),
            Some(FrameMessage::Rescan)
        );
        assert_eq!(
            FrameMessage::decode(&json!({"type": "refreshXpathFrame", "data": "//iframe"})),
            Some(FrameMessage::AssignIdentity("//iframe".into()))
        );
    }

    #[test]
    fn test_decode_ignores_unknown_and_malformed() {
        assert_eq!(FrameMessage::decode(&json!({"type": "refreshInfractions"})), None);
        assert_eq!(FrameMessage::decode(&json!({"data": 1})), None);
        assert_eq!(FrameMessage::decode(&json!("refreshElements")), None);
        assert_eq!(
            FrameMessage::decode(&json!({"type": "elementsOniFrame", "data": "not a list"})),
            None
        );
    }

    #[test]
    fn test_kind_matches_wire_name() {
        for message in [
            FrameMessage::RequestIdentity,
            FrameMessage::AssignIdentity(String::new()),
            FrameMessage::Rescan,
            FrameMessage::Elements(Vec::new()),
            FrameMessage::Infractions(Vec::new()),
        ] {
            assert_eq!(message.encode().unwrap()["type"], message.kind());
        }
    }
}
