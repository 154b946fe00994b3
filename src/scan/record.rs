use crate::locator::{Locator, Quality};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized marker of the top-level document
pub const ROOT_FRAME: &str = "ROOT";

/// Identity of the frame an element lives in
///
/// Serialized as a plain string: `"ROOT"`, the iframe's assigned locator, or `""` while a
/// child frame is still waiting for its parent to assign one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FrameLocator {
    #[default]
    Unassigned,
    Root,
    /// XPath of the iframe element, evaluated in its parent's document
    Frame(String),
}

impl FrameLocator {
    pub fn is_root(&self) -> bool {
        matches!(self, FrameLocator::Root)
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, FrameLocator::Unassigned)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FrameLocator::Unassigned => "",
            FrameLocator::Root => ROOT_FRAME,
            FrameLocator::Frame(xpath) => xpath,
        }
    }
}

impl From<String> for FrameLocator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => FrameLocator::Unassigned,
            ROOT_FRAME => FrameLocator::Root,
            _ => FrameLocator::Frame(value),
        }
    }
}

impl From<&str> for FrameLocator {
    fn from(value: &str) -> Self {
        FrameLocator::from(value.to_string())
    }
}

impl From<FrameLocator> for String {
    fn from(frame: FrameLocator) -> Self {
        match frame {
            FrameLocator::Frame(xpath) => xpath,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for FrameLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One automatable element found by a scan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRecord {
    /// Tag wrapped in angle brackets, e.g. `<input>`
    #[serde(rename = "TAGNAME")]
    pub tag_name: String,

    #[serde(rename = "XPATH")]
    pub xpath: String,

    #[serde(rename = "FRAME")]
    pub frame: FrameLocator,

    #[serde(rename = "QUALITY")]
    pub quality: Quality,
}

impl ElementRecord {
    pub fn new(tag: &str, locator: Locator, frame: FrameLocator) -> Self {
        Self {
            tag_name: wrap_tag(tag),
            xpath: locator.xpath,
            frame,
            quality: locator.quality,
        }
    }

    /// Tag name without the angle brackets
    pub fn bare_tag(&self) -> &str {
        self.tag_name
            .trim_start_matches('<')
            .trim_end_matches('>')
    }

    pub fn is_iframe(&self) -> bool {
        self.bare_tag().eq_ignore_ascii_case("iframe")
    }

    /// Identity used when merging inventories
    pub fn same_element(&self, other: &ElementRecord) -> bool {
        self.xpath == other.xpath && self.frame == other.frame && self.tag_name == other.tag_name
    }
}

/// `input` -> `<input>`
pub fn wrap_tag(tag: &str) -> String {
    format!("<{}>", tag.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wire_format() {
        let record = ElementRecord::new(
            "input",
            Locator::new("//input[@id=\"email\"]", Quality::Id),
            FrameLocator::Root,
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "TAGNAME": "<input>",
                "XPATH": "//input[@id=\"email\"]",
                "FRAME": "ROOT",
                "QUALITY": 3
            })
        );
    }

    #[test]
    fn test_frame_locator_from_string() {
        assert_eq!(FrameLocator::from(""), FrameLocator::Unassigned);
        assert_eq!(FrameLocator::from("ROOT"), FrameLocator::Root);
        assert_eq!(
            FrameLocator::from("//iframe[@id=\"pay\"]"),
            FrameLocator::Frame("//iframe[@id=\"pay\"]".to_string())
        );
        assert!(!FrameLocator::Unassigned.is_assigned());
    }

    #[test]
    fn test_record_from_frame() {
        let json =
            r#"{"TAGNAME":"<a>","XPATH":"//a[text()=\"Go\"]","FRAME":"//iframe[1]","QUALITY":2}"#;
        let record: ElementRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.frame, FrameLocator::Frame("//iframe[1]".to_string()));
        assert_eq!(record.bare_tag(), "a");
        assert!(!record.is_iframe());
    }

    #[test]
    fn test_same_element_ignores_quality() {
        let a =
            ElementRecord::new("li", Locator::new("//li", Quality::Positional), FrameLocator::Root);
        let mut b = a.clone();
        b.quality = Quality::Attribute;
        assert!(a.same_element(&b));

        b.frame = FrameLocator::from("//iframe");
        assert!(!a.same_element(&b));
    }
}
