use crate::dom::{Ancestry, Document};
use crate::locator::{Locator, Quality};
use log::debug;

/// Build a structural XPath for `node`
///
/// At the top call (`absolute == false`) a non-empty id yields `//*[@id="…"]` and a tag that
/// occurs once in the document yields `//tag`. Otherwise the path is built from the parent's
/// absolute path plus `tag[position]`, stopping at `/html`.
pub fn generate_xpath<A: Ancestry + ?Sized>(document: &A, node: A::Node, absolute: bool) -> String {
    let tag = document.tag_name(node).to_ascii_lowercase();

    if !absolute {
        if let Some(id) = document.element_id(node).filter(|id| !id.is_empty()) {
            return format!("//*[@id=\"{}\"]", id);
        }
        if document.tag_count(&tag) == 1 {
            return format!("//{}", tag);
        }
    }

    if absolute && tag == "html" {
        return "/html".to_string();
    }

    match document.parent_element(node) {
        Some(parent) => format!(
            "{}/{}[{}]",
            generate_xpath(document, parent, true),
            tag,
            document.sibling_position(node)
        ),
        None => format!("/{}", tag),
    }
}

/// Checks candidate expressions against the document and degrades them until one is unique
pub struct UniquenessEvaluator<'a, D: Document + ?Sized> {
    document: &'a D,
}

impl<'a, D: Document + ?Sized> UniquenessEvaluator<'a, D> {
    pub fn new(document: &'a D) -> Self {
        Self { document }
    }

    /// True when the expression evaluates to exactly one node
    pub fn is_unique(&self, xpath: &str) -> bool {
        self.document.match_count(xpath) == Some(1)
    }

    /// Keep `candidate` at `base` quality if unique, else try the enclosing-div form at
    /// quality 1, else fall back to a positional path at quality 0
    pub fn evaluate(&self, candidate: &str, node: D::Node, base: Quality) -> Locator {
        if self.is_unique(candidate) {
            return Locator::new(candidate, base);
        }

        let qualified = self.parent_qualified(candidate, node);
        if self.is_unique(&qualified) {
            debug!("Disambiguated {} as {}", candidate, qualified);
            return Locator::new(qualified, Quality::ParentQualified);
        }

        let positional = generate_xpath(self.document, node, false);
        debug!("Falling back to positional path {} for {}", positional, candidate);
        Locator::new(positional, Quality::Positional)
    }

    fn parent_qualified(&self, candidate: &str, node: D::Node) -> String {
        let Some(div) = self.document.closest_ancestor(node, "div") else {
            return candidate.to_string();
        };

        match self.document.attribute(div, "class") {
            Some(class) => format!("//div[@class=\"{}\"]{}", class, candidate),
            None => format!("//div{}", candidate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomTree, ElementNode};

    /// Bare ancestry chain, no attributes or text
    struct Chain {
        nodes: Vec<(&'static str, Option<usize>, Option<&'static str>)>,
    }

    impl Ancestry for Chain {
        type Node = usize;

        fn parent_element(&self, node: usize) -> Option<usize> {
            self.nodes[node].1
        }

        fn tag_name(&self, node: usize) -> &str {
            self.nodes[node].0
        }

        fn element_id(&self, node: usize) -> Option<&str> {
            self.nodes[node].2
        }

        fn tag_count(&self, tag: &str) -> usize {
            self.nodes.iter().filter(|(t, _, _)| *t == tag).count()
        }

        fn sibling_position(&self, node: usize) -> usize {
            let parent = self.nodes[node].1;
            let tag = self.nodes[node].0;
            self.nodes[..node]
                .iter()
                .filter(|(t, p, _)| *p == parent && *t == tag)
                .count()
                + 1
        }
    }

    fn chain() -> Chain {
        Chain {
            nodes: vec![
                ("html", None, None),
                ("body", Some(0), None),
                ("div", Some(1), Some("app")),
                ("div", Some(2), None),
                ("span", Some(3), None),
                ("span", Some(3), None),
            ],
        }
    }

    #[test]
    fn test_generate_xpath_positional_chain() {
        let tree = chain();
        assert_eq!(generate_xpath(&tree, 5, false), "/html/body[1]/div[1]/div[1]/span[2]");
    }

    #[test]
    fn test_generate_xpath_ignores_ids_above_top_call() {
        let tree = chain();
        // The ancestor id is not used once recursion switches to absolute mode
        assert_eq!(generate_xpath(&tree, 4, false), "/html/body[1]/div[1]/div[1]/span[1]");
    }

    #[test]
    fn test_generate_xpath_id_and_unique_tag() {
        let tree = chain();
        assert_eq!(generate_xpath(&tree, 2, false), "//*[@id=\"app\"]");
        assert_eq!(generate_xpath(&tree, 1, false), "//body");
        assert_eq!(generate_xpath(&tree, 0, true), "/html");
    }

    #[test]
    fn test_generate_xpath_empty_id_is_ignored() {
        let tree = Chain {
            nodes: vec![("html", None, None), ("p", Some(0), Some("")), ("p", Some(0), None)],
        };
        assert_eq!(generate_xpath(&tree, 1, false), "/html/p[1]");
    }

    fn form_page() -> DomTree {
        DomTree::new(
            ElementNode::new("html").with_child(
                ElementNode::new("body")
                    .with_child(
                        ElementNode::new("div")
                            .with_attribute("class", "login")
                            .with_child(ElementNode::new("input").with_attribute("name", "q")),
                    )
                    .with_child(
                        ElementNode::new("div")
                            .with_attribute("class", "search")
                            .with_child(ElementNode::new("input").with_attribute("name", "q")),
                    )
                    .with_child(
                        ElementNode::new("div")
                            .with_attribute("class", "search")
                            .with_child(ElementNode::new("input").with_attribute("name", "q")),
                    ),
            ),
        )
    }

    #[test]
    fn test_unique_candidate_keeps_base_quality() {
        let tree = DomTree::new(
            ElementNode::new("html")
                .with_child(ElementNode::new("input").with_attribute("name", "user")),
        );
        let input = tree.elements_by_tag_name("input")[0];

        let evaluator = UniquenessEvaluator::new(&tree);
        let locator = evaluator.evaluate("//*[@name=\"user\"]", input, Quality::Attribute);
        assert_eq!(locator, Locator::new("//*[@name=\"user\"]", Quality::Attribute));
    }

    #[test]
    fn test_parent_qualified_when_enclosing_div_disambiguates() {
        let tree = form_page();
        let input = tree.elements_by_tag_name("input")[0];

        let locator =
            UniquenessEvaluator::new(&tree).evaluate("//*[@name=\"q\"]", input, Quality::Attribute);
        assert_eq!(locator.xpath, "//div[@class=\"login\"]//*[@name=\"q\"]");
        assert_eq!(locator.quality, Quality::ParentQualified);
    }

    #[test]
    fn test_parent_qualified_keeps_empty_class() {
        let tree = DomTree::new(
            ElementNode::new("html").with_child(
                ElementNode::new("body")
                    .with_child(
                        ElementNode::new("div")
                            .with_attribute("class", "")
                            .with_child(ElementNode::new("a").with_text("Next")),
                    )
                    .with_child(
                        ElementNode::new("div").with_child(ElementNode::new("a").with_text("Next")),
                    ),
            ),
        );
        let links = tree.elements_by_tag_name("a");
        let evaluator = UniquenessEvaluator::new(&tree);

        let first = evaluator.evaluate("//a[text()=\"Next\"]", links[0], Quality::Attribute);
        assert_eq!(first.xpath, "//div[@class=\"\"]//a[text()=\"Next\"]");
        assert_eq!(first.quality, Quality::ParentQualified);

        // A div without the attribute gets the bare prefix, which matches both links
        let second = evaluator.evaluate("//a[text()=\"Next\"]", links[1], Quality::Attribute);
        assert_eq!(second.quality, Quality::Positional);
    }

    #[test]
    fn test_positional_when_parent_prefix_still_ambiguous() {
        let tree = form_page();
        let input = tree.elements_by_tag_name("input")[2];

        let locator =
            UniquenessEvaluator::new(&tree).evaluate("//*[@name=\"q\"]", input, Quality::Attribute);
        assert_eq!(locator.xpath, "/html/body[1]/div[3]/input[1]");
        assert_eq!(locator.quality, Quality::Positional);
        assert_eq!(tree.evaluate(&locator.xpath).unwrap(), vec![input]);
    }

    #[test]
    fn test_invalid_candidate_falls_to_positional() {
        let tree = form_page();
        let input = tree.elements_by_tag_name("input")[1];

        let evaluator = UniquenessEvaluator::new(&tree);
        let locator = evaluator.evaluate("//*[@value=\"a\"b\"]", input, Quality::Attribute);
        assert_eq!(locator.quality, Quality::Positional);
        assert_eq!(locator.xpath, "/html/body[1]/div[2]/input[1]");
    }
}
