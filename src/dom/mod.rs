//! Document model used by the scanner
//!
//! This module provides the read-only view of a page that locator synthesis runs against.
//! It includes:
//! - ElementNode: serialized snapshot of a node as captured from the browser
//! - DomTree: arena document with parent pointers built from a snapshot
//! - XPath: evaluator for the subset of XPath that generated locators use
//! - Ancestry / Document: the capabilities locator code needs from a document

pub mod element;
pub mod tree;
pub mod xpath;

pub use element::{BoundingBox, ElementNode};
pub use tree::{DomTree, NodeId};
pub use xpath::XPath;

use crate::error::Result;

/// Minimal structural view needed to build positional paths
pub trait Ancestry {
    type Node: Copy + Eq + std::fmt::Debug;

    /// Parent element, or `None` for the top-level element
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    fn tag_name(&self, node: Self::Node) -> &str;

    fn element_id(&self, node: Self::Node) -> Option<&str>;

    /// Number of elements with this tag in the whole document
    fn tag_count(&self, tag: &str) -> usize;

    /// 1-based position among same-tag siblings
    fn sibling_position(&self, node: Self::Node) -> usize;
}

/// Everything locator synthesis and validation read from a document
pub trait Document: Ancestry {
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Rendered text of the element
    fn inner_text(&self, node: Self::Node) -> String;

    fn client_rects(&self, node: Self::Node) -> &[BoundingBox];

    /// Nearest strict ancestor with the given tag
    fn closest_ancestor(&self, node: Self::Node, tag: &str) -> Option<Self::Node>;

    /// Nodes matched by an expression, in document order
    fn evaluate(&self, xpath: &str) -> Result<Vec<Self::Node>>;

    /// Number of matches, or `None` when the expression cannot be evaluated
    fn match_count(&self, xpath: &str) -> Option<usize> {
        self.evaluate(xpath).ok().map(|nodes| nodes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_export() {
        let element = ElementNode::new("div");
        assert_eq!(element.tag_name, "div");
    }

    #[test]
    fn test_dom_tree_export() {
        let tree = DomTree::new(ElementNode::new("body"));
        let root = tree.document_element().unwrap();
        assert_eq!(tree.tag_name(root), "body");
    }

    #[test]
    fn test_match_count() {
        let tree = DomTree::new(
            ElementNode::new("html")
                .with_child(ElementNode::new("p"))
                .with_child(ElementNode::new("p")),
        );

        assert_eq!(tree.match_count("//p"), Some(2));
        assert_eq!(tree.match_count("//p["), None);
    }
}
