use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node name used for text nodes in a snapshot
pub const TEXT_NODE_NAME: &str = "#text";

/// Serialized snapshot of one DOM node, as produced by the page snapshot script
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// Lower-case tag name (e.g., "div", "button"), or `#text` for text nodes
    pub tag_name: String,

    /// Element attributes in document order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Character data; only set on text nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child nodes, elements and text interleaved in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Client rectangles reported by layout; empty when the node is not rendered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_rects: Vec<BoundingBox>,

    /// Document element of an embedded frame (same-origin iframes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_document: Option<Box<ElementNode>>,
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    /// Create a new element node
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            text_content: None,
            children: Vec::new(),
            client_rects: Vec::new(),
            content_document: None,
        }
    }

    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            tag_name: TEXT_NODE_NAME.to_string(),
            attributes: IndexMap::new(),
            text_content: Some(text.into()),
            children: Vec::new(),
            client_rects: Vec::new(),
            content_document: None,
        }
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: append a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(ElementNode::text(text));
        self
    }

    /// Builder method: append a child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: add a client rectangle
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.client_rects.push(BoundingBox::new(x, y, width, height));
        self
    }

    /// Builder method: attach the document loaded inside this iframe
    pub fn with_content_document(mut self, document: ElementNode) -> Self {
        self.content_document = Some(Box::new(document));
        self
    }

    /// Set an attribute; names are stored lower-cased like HTML attribute names
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into().to_ascii_lowercase(), value.into());
    }

    pub fn is_text(&self) -> bool {
        self.tag_name == TEXT_NODE_NAME
    }

    /// Remove script, style and noscript subtrees
    pub fn simplify(&mut self) {
        self.children.retain(|child| {
            !matches!(child.tag_name.as_str(), "script" | "style" | "noscript")
        });

        for child in &mut self.children {
            child.simplify();
        }

        if let Some(document) = self.content_document.as_mut() {
            document.simplify();
        }
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_creation() {
        let element = ElementNode::new("BUTTON")
            .with_attribute("id", "submit")
            .with_text("Send")
            .with_bounding_box(0.0, 0.0, 80.0, 20.0);

        assert_eq!(element.tag_name, "button");
        assert_eq!(element.attributes.get("id").map(String::as_str), Some("submit"));
        assert_eq!(element.children.len(), 1);
        assert!(element.children[0].is_text());
        assert_eq!(element.client_rects.len(), 1);
    }

    #[test]
    fn test_attribute_names_are_lowercased() {
        let element = ElementNode::new("input").with_attribute("formControlName", "email");
        assert_eq!(element.attributes.get("formcontrolname").map(String::as_str), Some("email"));
    }

    #[test]
    fn test_simplify() {
        let mut parent = ElementNode::new("div").with_children(vec![
            ElementNode::new("p").with_text("Content"),
            ElementNode::new("script").with_text("alert('test')"),
            ElementNode::new("style").with_text(".test { color: red; }"),
            ElementNode::new("span").with_text("More content"),
        ]);

        parent.simplify();

        let tags: Vec<_> = parent.children.iter().map(|child| child.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["p", "span"]);
    }

    #[test]
    fn test_simplify_reaches_frame_documents() {
        let inner = ElementNode::new("html").with_child(
            ElementNode::new("body").with_child(ElementNode::new("script").with_text("x()")),
        );
        let mut frame = ElementNode::new("iframe").with_content_document(inner);

        frame.simplify();

        let body = &frame.content_document.as_ref().unwrap().children[0];
        assert!(body.children.is_empty());
    }

    #[test]
    fn test_deserialize_snapshot_shape() {
        let json = serde_json::json!({
            "tag_name": "a",
            "attributes": {"href": "/next"},
            "children": [{"tag_name": "#text", "text_content": "Continue"}],
            "client_rects": [{"x": 1.0, "y": 2.0, "width": 30.0, "height": 10.0}]
        });

        let node: ElementNode = serde_json::from_value(json).unwrap();
        assert_eq!(node.tag_name, "a");
        assert_eq!(node.children[0].text_content.as_deref(), Some("Continue"));
        assert_eq!(node.client_rects[0], BoundingBox::new(1.0, 2.0, 30.0, 10.0));
        assert!(node.content_document.is_none());
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let json = serde_json::to_value(ElementNode::new("br")).unwrap();
        assert_eq!(json, serde_json::json!({"tag_name": "br", "attributes": {}}));
    }
}
