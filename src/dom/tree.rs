use crate::dom::element::{BoundingBox, ElementNode, TEXT_NODE_NAME};
use crate::dom::xpath::XPath;
use crate::dom::{Ancestry, Document};
use crate::error::Result;
use indexmap::IndexMap;

/// Node name of the synthetic document node that owns the document element
pub const DOCUMENT_NODE_NAME: &str = "#document";

/// Tags whose rendered text is separated from surrounding text by line breaks
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Handle to a node inside a [`DomTree`]
///
/// Ids are assigned in document order, so comparing two ids compares their
/// position in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag_name: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    client_rects: Vec<BoundingBox>,
    content_document: Option<ElementNode>,
}

/// Arena representation of one frame's document
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Build a tree whose document element is `root`
    pub fn new(root: ElementNode) -> Self {
        let document = Node {
            tag_name: DOCUMENT_NODE_NAME.to_string(),
            attributes: IndexMap::new(),
            text: None,
            parent: None,
            children: Vec::new(),
            client_rects: Vec::new(),
            content_document: None,
        };

        let mut tree = Self { nodes: vec![document] };
        tree.insert(root, NodeId(0));
        tree
    }

    fn insert(&mut self, node: ElementNode, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        let ElementNode {
            tag_name,
            attributes,
            text_content,
            children,
            client_rects,
            content_document,
        } = node;

        self.nodes.push(Node {
            tag_name,
            attributes,
            text: text_content,
            parent: Some(parent),
            children: Vec::with_capacity(children.len()),
            client_rects,
            content_document: content_document.map(|document| *document),
        });
        self.nodes[parent.0].children.push(id);

        for child in children {
            self.insert(child, id);
        }

        id
    }

    /// The synthetic document node
    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// The top-level element (normally `html`)
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.document()).next()
    }

    pub fn tag_name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag_name
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        !self.nodes[node.0].tag_name.starts_with('#')
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self, node: NodeId) -> &IndexMap<String, String> {
        &self.nodes[node.0].attributes
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
    }

    /// All nodes below `node`, in document order
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        // Preorder ids make every subtree a contiguous range
        let mut last = node;
        while let Some(&child) = self.children(last).last() {
            last = child;
        }
        (node.0 + 1..=last.0).map(NodeId)
    }

    /// Elements with the given tag name in document order; `*` matches every element
    pub fn elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|&id| self.is_element(id))
            .filter(|&id| tag == "*" || self.tag_name(id).eq_ignore_ascii_case(tag))
            .collect()
    }

    /// Number of elements with the given tag name
    pub fn tag_count(&self, tag: &str) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.tag_name.eq_ignore_ascii_case(tag))
            .count()
    }

    /// Count element nodes in the tree
    pub fn count_elements(&self) -> usize {
        (0..self.nodes.len())
            .filter(|&i| self.is_element(NodeId(i)))
            .count()
    }

    /// Character data of the direct text children, in order
    pub fn text_children(&self, node: NodeId) -> impl Iterator<Item = &str> + '_ {
        self.children(node)
            .iter()
            .filter_map(|&child| self.nodes[child.0].text.as_deref())
    }

    /// Concatenated direct text of an element, ignoring nested elements
    pub fn direct_text(&self, node: NodeId) -> String {
        self.text_children(node).collect()
    }

    /// Rendered text approximation: whitespace collapsed, `br` and block
    /// elements start new lines, script and style ignored
    pub fn inner_text(&self, node: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(node, &mut raw);

        raw.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        for &child in self.children(node) {
            let current = &self.nodes[child.0];
            match current.tag_name.as_str() {
                TEXT_NODE_NAME => {
                    let text = current.text.as_deref().unwrap_or_default();
                    if text.starts_with(char::is_whitespace) {
                        out.push(' ');
                    }
                    out.push_str(&text.split_whitespace().collect::<Vec<_>>().join(" "));
                    if text.ends_with(char::is_whitespace) {
                        out.push(' ');
                    }
                }
                "script" | "style" | "noscript" => {}
                "br" => out.push('\n'),
                tag if BLOCK_TAGS.contains(&tag) => {
                    out.push('\n');
                    self.collect_text(child, out);
                    out.push('\n');
                }
                _ => self.collect_text(child, out),
            }
        }
    }

    pub fn client_rects(&self, node: NodeId) -> &[BoundingBox] {
        &self.nodes[node.0].client_rects
    }

    /// Snapshot of the document loaded inside an iframe, if it was reachable
    pub fn content_document(&self, node: NodeId) -> Option<&ElementNode> {
        self.nodes[node.0].content_document.as_ref()
    }

    /// Move an iframe's document out of the tree
    pub fn take_content_document(&mut self, node: NodeId) -> Option<ElementNode> {
        self.nodes[node.0].content_document.take()
    }

    /// Nearest strict ancestor element with the given tag
    pub fn closest_ancestor(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if self.is_element(id) && self.tag_name(id).eq_ignore_ascii_case(tag) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// 1-based position among the parent's children with the same tag
    pub fn sibling_position(&self, node: NodeId) -> usize {
        let tag = self.tag_name(node);
        match self.parent(node) {
            Some(parent) => {
                self.children(parent)
                    .iter()
                    .take_while(|&&sibling| sibling != node)
                    .filter(|&&sibling| self.tag_name(sibling) == tag)
                    .count()
                    + 1
            }
            None => 1,
        }
    }

    /// CSS selector for a node: `#id` when it has one, otherwise a
    /// `tag:nth-of-type(n)` chain from the document element
    pub fn css_selector(&self, node: NodeId) -> String {
        if let Some(id) = self.attribute(node, "id").filter(|id| !id.is_empty()) {
            return format!("#{}", id);
        }

        let tag = self.tag_name(node);
        match self.parent(node).filter(|&parent| self.is_element(parent)) {
            Some(parent) => format!(
                "{} > {}:nth-of-type({})",
                self.css_selector(parent),
                tag,
                self.sibling_position(node)
            ),
            None => tag.to_string(),
        }
    }

    /// Evaluate an XPath expression against this document
    pub fn evaluate(&self, xpath: &str) -> Result<Vec<NodeId>> {
        Ok(XPath::parse(xpath)?.evaluate(self))
    }

    /// First node matched by an expression; invalid expressions match nothing
    pub fn first_match(&self, xpath: &str) -> Option<NodeId> {
        self.evaluate(xpath).ok()?.into_iter().next()
    }
}

impl Ancestry for DomTree {
    type Node = NodeId;

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|&parent| self.is_element(parent))
    }

    fn tag_name(&self, node: NodeId) -> &str {
        DomTree::tag_name(self, node)
    }

    fn element_id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id")
    }

    fn tag_count(&self, tag: &str) -> usize {
        DomTree::tag_count(self, tag)
    }

    fn sibling_position(&self, node: NodeId) -> usize {
        DomTree::sibling_position(self, node)
    }
}

impl Document for DomTree {
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        DomTree::attribute(self, node, name)
    }

    fn inner_text(&self, node: NodeId) -> String {
        DomTree::inner_text(self, node)
    }

    fn client_rects(&self, node: NodeId) -> &[BoundingBox] {
        DomTree::client_rects(self, node)
    }

    fn closest_ancestor(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        DomTree::closest_ancestor(self, node, tag)
    }

    fn evaluate(&self, xpath: &str) -> Result<Vec<NodeId>> {
        DomTree::evaluate(self, xpath)
    }
}
