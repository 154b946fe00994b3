//! Accessibility audit
//!
//! Four rules run against each frame's document: `image-alt`, `button-name`, `link-name`
//! and `label`, named after their axe-core counterparts. They cover a subset of axe-core,
//! not the full rule set. Every rule that finds offending elements yields one
//! [`InfractionRecord`] listing their CSS selectors.
//! Frames hand their infractions to the top-level frame the same way they hand
//! off element records.

use crate::dom::{DomTree, NodeId};
use crate::scan::FrameLocator;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

const RULE_DOCS_BASE: &str = "https://dequeuniversity.com/rules/axe/4.8";

/// One violated rule in one frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfractionRecord {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "MORE_INFO")]
    pub description: String,

    #[serde(rename = "INFO_URL")]
    pub info_url: String,

    #[serde(rename = "TAGS")]
    pub tags: Vec<String>,

    /// CSS selectors of the offending elements
    #[serde(rename = "TARGET")]
    pub target: Vec<String>,

    #[serde(rename = "FRAME", default)]
    pub frame: FrameLocator,
}

/// An accessibility check over elements of a few tags
pub struct AuditRule {
    pub id: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    applies_to: &'static [&'static str],
    violates: fn(&DomTree, NodeId) -> bool,
}

pub const RULES: &[AuditRule] = &[
    AuditRule {
        id: "image-alt",
        description: "Images must have alternate text",
        tags: &["cat.text-alternatives", "wcag2a", "wcag111"],
        applies_to: &["img"],
        violates: image_without_alt,
    },
    AuditRule {
        id: "button-name",
        description: "Buttons must have discernible text",
        tags: &["cat.name-role-value", "wcag2a", "wcag412"],
        applies_to: &["button"],
        violates: unnamed,
    },
    AuditRule {
        id: "link-name",
        description: "Links must have discernible text",
        tags: &["cat.name-role-value", "wcag2a", "wcag244", "wcag412"],
        applies_to: &["a"],
        violates: unnamed_link,
    },
    AuditRule {
        id: "label",
        description: "Form elements must have labels",
        tags: &["cat.forms", "wcag2a", "wcag131", "wcag412"],
        applies_to: &["input", "select", "textarea"],
        violates: unlabeled_control,
    },
];

impl AuditRule {
    pub fn info_url(&self) -> String {
        format!("{}/{}", RULE_DOCS_BASE, self.id)
    }

    /// Rendered elements of this document that break the rule
    pub fn offenders(&self, document: &DomTree) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .applies_to
            .iter()
            .flat_map(|tag| document.elements_by_tag_name(tag))
            .filter(|&node| !document.client_rects(node).is_empty())
            .filter(|&node| (self.violates)(document, node))
            .collect();
        nodes.sort_unstable();
        nodes
    }
}

/// Description of a rule by id, case-insensitive
pub fn describe(rule_id: &str) -> Option<&'static str> {
    RULES
        .iter()
        .find(|rule| rule.id.eq_ignore_ascii_case(rule_id))
        .map(|rule| rule.description)
}

/// Run every rule against one frame's document
pub fn audit(document: &DomTree, frame: &FrameLocator) -> Vec<InfractionRecord> {
    RULES
        .iter()
        .filter_map(|rule| {
            let offenders = rule.offenders(document);
            if offenders.is_empty() {
                return None;
            }

            debug!("Rule {} failed on {} elements in frame {}", rule.id, offenders.len(), frame);
            Some(InfractionRecord {
                id: rule.id.to_string(),
                description: rule.description.to_string(),
                info_url: rule.info_url(),
                tags: rule.tags.iter().map(|tag| tag.to_string()).collect(),
                target: offenders
                    .into_iter()
                    .map(|node| document.css_selector(node))
                    .collect(),
                frame: frame.clone(),
            })
        })
        .collect()
}

/// Group infractions by rule id, keeping first-seen order
pub fn group_by_rule(infractions: &[InfractionRecord]) -> IndexMap<&str, Vec<&InfractionRecord>> {
    let mut groups: IndexMap<&str, Vec<&InfractionRecord>> = IndexMap::new();
    for infraction in infractions {
        groups.entry(infraction.id.as_str()).or_default().push(infraction);
    }
    groups
}

fn has_any(document: &DomTree, node: NodeId, attributes: &[&str]) -> bool {
    attributes.iter().any(|name| {
        document
            .attribute(node, name)
            .is_some_and(|value| !value.trim().is_empty())
    })
}

fn image_without_alt(document: &DomTree, node: NodeId) -> bool {
    let decorative = matches!(document.attribute(node, "role"), Some("presentation" | "none"));
    document.attribute(node, "alt").is_none() && !decorative
}

fn unnamed(document: &DomTree, node: NodeId) -> bool {
    document.inner_text(node).is_empty()
        && !has_any(document, node, &["aria-label", "aria-labelledby", "title", "value"])
}

fn unnamed_link(document: &DomTree, node: NodeId) -> bool {
    if document.attribute(node, "href").is_none() {
        return false;
    }

    let image_named = document.descendants(node).any(|child| {
        document.tag_name(child) == "img" && has_any(document, child, &["alt"])
    });
    unnamed(document, node) && !image_named
}

fn unlabeled_control(document: &DomTree, node: NodeId) -> bool {
    if document.tag_name(node) == "input"
        && matches!(
            document.attribute(node, "type"),
            Some("hidden" | "submit" | "button" | "reset" | "image")
        )
    {
        return false;
    }

    if has_any(document, node, &["aria-label", "aria-labelledby", "title"]) {
        return false;
    }

    if document.closest_ancestor(node, "label").is_some() {
        return false;
    }

    let id = document.attribute(node, "id").filter(|id| !id.is_empty());
    let labelled_by_for = id.is_some_and(|id| {
        document
            .elements_by_tag_name("label")
            .into_iter()
            .any(|label| document.attribute(label, "for") == Some(id))
    });
    !labelled_by_for
}
