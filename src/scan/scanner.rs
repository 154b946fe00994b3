use crate::config::ScanConfig;
use crate::dom::{DomTree, NodeId};
use crate::locator::LocatorBuilder;
use crate::scan::record::ElementRecord;
use crate::scan::session::ScanSession;
use crate::scan::validator::{ElementValidator, FrameSink};
use log::info;

/// Tags admitted unless an inline style mentions `display`
const STYLE_FILTERED_TAGS: &[&str] =
    &["select", "textarea", "button", "a", "span", "img", "svg", "li"];

/// Walks one frame's document and collects automatable elements
pub struct PageScanner<'a> {
    config: &'a ScanConfig,
}

impl<'a> PageScanner<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Whether an element found under `tag` passes the scan filter
    ///
    /// `form`, `table` and `option` have no admission rule and never pass.
    pub fn admits(&self, document: &DomTree, tag: &str, node: NodeId) -> bool {
        let style = document.attribute(node, "style");
        let styled_display = style.is_some_and(|style| style.contains("display"));

        match tag {
            "input" => document.attribute(node, "type") != Some("hidden") && !styled_display,
            "div" => {
                (style.is_none() && document.attribute(node, "draggable") == Some("true"))
                    || document.attribute(node, "role") == Some("button")
                    || !document.direct_text(node).trim().is_empty()
            }
            "iframe" => true,
            tag if STYLE_FILTERED_TAGS.contains(&tag) => !styled_display,
            _ => false,
        }
    }

    /// Rebuild the session's element list from scratch; returns the number of records
    /// admitted (an element admitted twice counts twice)
    pub fn scan(
        &self,
        document: &DomTree,
        session: &mut ScanSession,
        frames: &mut dyn FrameSink,
    ) -> usize {
        session.begin_scan();

        let builder = LocatorBuilder::new(document);
        let validator = ElementValidator::new(document);
        let mut admitted = 0;

        for tag in &self.config.tags {
            let tag = tag.to_ascii_lowercase();
            for node in document.elements_by_tag_name(&tag) {
                if !self.admits(document, &tag, node) {
                    continue;
                }

                let locator = builder.build(&tag, node);
                let record = ElementRecord::new(&tag, locator, session.frame().clone());
                if validator.validate(record, session, frames) {
                    admitted += 1;
                }
            }
        }

        info!(
            "Scanned frame {}: {} admitted, {} kept",
            session.frame(),
            admitted,
            session.elements().len()
        );
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use crate::locator::Quality;
    use crate::scan::validator::NoFrames;

    fn visible(tag: &str) -> ElementNode {
        ElementNode::new(tag).with_bounding_box(0.0, 0.0, 10.0, 10.0)
    }

    fn scan(body: Vec<ElementNode>, config: &ScanConfig) -> ScanSession {
        let body = ElementNode::new("body").with_children(body);
        let tree = DomTree::new(ElementNode::new("html").with_child(body));
        let mut session = ScanSession::root();
        PageScanner::new(config).scan(&tree, &mut session, &mut NoFrames);
        session
    }

    #[test]
    fn test_hidden_inputs_never_emitted() {
        let session = scan(
            vec![
                visible("input").with_attribute("type", "hidden").with_attribute("name", "csrf"),
                visible("input").with_attribute("name", "user"),
                visible("input")
                    .with_attribute("style", "display: none")
                    .with_attribute("name", "x"),
            ],
            &ScanConfig::default(),
        );

        let xpaths: Vec<&str> = session.elements().iter().map(|r| r.xpath.as_str()).collect();
        assert_eq!(xpaths, vec!["//input[@name=\"user\"]"]);
    }

    #[test]
    fn test_div_admission_rules() {
        let session = scan(
            vec![
                visible("div").with_attribute("draggable", "true").with_attribute("id", "drag"),
                visible("div")
                    .with_attribute("draggable", "true")
                    .with_attribute("style", "color: red")
                    .with_attribute("id", "styled-drag"),
                visible("div").with_attribute("role", "button").with_attribute("id", "role"),
                visible("div").with_text("   ").with_attribute("id", "blank"),
                visible("div").with_text(" Hello ").with_attribute("id", "text"),
                visible("div")
                    .with_child(visible("span").with_text("nested"))
                    .with_attribute("id", "nested-only"),
            ],
            &ScanConfig::default().tags(["div"]),
        );

        let mut ids: Vec<&str> = session.elements().iter().map(|r| r.xpath.as_str()).collect();
        ids.sort();
        assert_eq!(
            ids,
            vec!["//div[@id=\"drag\"]", "//div[@id=\"role\"]", "//div[@id=\"text\"]"]
        );
    }

    #[test]
    fn test_structural_tags_never_emitted() {
        let session = scan(
            vec![
                visible("form").with_attribute("id", "f"),
                visible("table").with_attribute("id", "t"),
                visible("select").with_child(visible("option").with_text("One")),
            ],
            &ScanConfig::default(),
        );

        let tags: Vec<&str> = session.elements().iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["<select>"]);
    }

    #[test]
    fn test_svg_follows_config() {
        let body = || vec![visible("svg").with_attribute("id", "icon")];

        assert_eq!(scan(body(), &ScanConfig::default()).elements().len(), 1);
        assert!(scan(body(), &ScanConfig::default().include_svg(false)).elements().is_empty());
    }

    #[test]
    fn test_order_is_most_recent_first() {
        let session = scan(
            vec![
                visible("input").with_attribute("id", "first"),
                visible("button").with_text("Send"),
            ],
            &ScanConfig::default(),
        );

        assert_eq!(session.elements()[0].tag_name, "<button>");
        assert_eq!(session.elements()[0].quality, Quality::Attribute);
        assert_eq!(session.elements()[1].quality, Quality::Id);
    }

    #[test]
    fn test_rescan_is_wholesale() {
        let config = ScanConfig::default();
        let tree = DomTree::new(
            ElementNode::new("html").with_child(visible("button").with_attribute("id", "ok")),
        );
        let mut session = ScanSession::root();
        let scanner = PageScanner::new(&config);

        scanner.scan(&tree, &mut session, &mut NoFrames);
        scanner.scan(&tree, &mut session, &mut NoFrames);

        assert_eq!(session.elements().len(), 1);
    }
}
