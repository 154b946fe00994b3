use crate::dom::{DomTree, NodeId};
use crate::scan::record::ElementRecord;
use crate::scan::session::ScanSession;
use log::debug;

/// Receives the locator computed for each iframe element, so it can be forwarded to the
/// frame loaded inside it
pub trait FrameSink {
    fn assign_frame(&mut self, iframe: NodeId, locator: &str);
}

/// Sink for documents scanned without frame coordination
pub struct NoFrames;

impl FrameSink for NoFrames {
    fn assign_frame(&mut self, _iframe: NodeId, _locator: &str) {}
}

impl FrameSink for Vec<(NodeId, String)> {
    fn assign_frame(&mut self, iframe: NodeId, locator: &str) {
        self.push((iframe, locator.to_string()));
    }
}

/// Decides whether a built record belongs in the frame's list
pub struct ElementValidator<'a> {
    document: &'a DomTree,
}

impl<'a> ElementValidator<'a> {
    pub fn new(document: &'a DomTree) -> Self {
        Self { document }
    }

    /// Admit `record` into `session` if its locator resolves to a rendered element.
    /// Iframe records are always forwarded to their frame and admitted once per xpath.
    pub fn validate(
        &self,
        record: ElementRecord,
        session: &mut ScanSession,
        frames: &mut dyn FrameSink,
    ) -> bool {
        let target = self.document.first_match(&record.xpath);

        if record.is_iframe() {
            if let Some(iframe) = target {
                frames.assign_frame(iframe, &record.xpath);
            }
            return session.admit_iframe(record);
        }

        match target {
            Some(node) if !self.document.client_rects(node).is_empty() => {
                debug!(
                    "Admitted {} {} (quality {})",
                    record.tag_name, record.xpath, record.quality
                );
                session.admit(record);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use crate::locator::{Locator, Quality};
    use crate::scan::record::FrameLocator;

    fn page() -> DomTree {
        DomTree::new(
            ElementNode::new("html").with_child(
                ElementNode::new("body")
                    .with_child(
                        ElementNode::new("input")
                            .with_attribute("name", "shown")
                            .with_bounding_box(0.0, 0.0, 100.0, 20.0),
                    )
                    .with_child(ElementNode::new("input").with_attribute("name", "collapsed"))
                    .with_child(ElementNode::new("iframe").with_attribute("id", "pay")),
            ),
        )
    }

    fn record(tag: &str, xpath: &str) -> ElementRecord {
        ElementRecord::new(tag, Locator::new(xpath, Quality::Attribute), FrameLocator::Root)
    }

    #[test]
    fn test_rendered_element_admitted() {
        let tree = page();
        let mut session = ScanSession::root();

        let admitted = ElementValidator::new(&tree).validate(
            record("input", "//input[@name=\"shown\"]"),
            &mut session,
            &mut NoFrames,
        );
        assert!(admitted);
        assert_eq!(session.elements().len(), 1);
    }

    #[test]
    fn test_element_without_rects_dropped() {
        let tree = page();
        let mut session = ScanSession::root();
        let validator = ElementValidator::new(&tree);

        assert!(!validator.validate(
            record("input", "//input[@name=\"collapsed\"]"),
            &mut session,
            &mut NoFrames
        ));
        assert!(!validator.validate(
            record("input", "//input[@name=\"gone\"]"),
            &mut session,
            &mut NoFrames
        ));
        assert!(!validator.validate(
            record("input", "//input[@name="),
            &mut session,
            &mut NoFrames
        ));
        assert!(session.elements().is_empty());
    }

    #[test]
    fn test_iframe_forwarded_and_deduplicated() {
        let tree = page();
        let mut session = ScanSession::root();
        let mut assigned: Vec<(NodeId, String)> = Vec::new();
        let validator = ElementValidator::new(&tree);

        assert!(validator.validate(
            record("iframe", "//iframe[@id=\"pay\"]"),
            &mut session,
            &mut assigned
        ));
        assert!(!validator.validate(
            record("iframe", "//iframe[@id=\"pay\"]"),
            &mut session,
            &mut assigned
        ));

        // Forwarded both times, admitted once
        assert_eq!(assigned.len(), 2);
        assert_eq!(assigned[0].1, "//iframe[@id=\"pay\"]");
        assert_eq!(session.elements().len(), 1);
    }
}
