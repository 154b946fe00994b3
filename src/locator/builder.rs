use crate::dom::Document;
use crate::locator::uniqueness::{UniquenessEvaluator, generate_xpath};
use crate::locator::{Locator, Quality};

/// Attribute-based strategies after `id`, in priority order
const ATTRIBUTE_STRATEGIES: &[(Strategy, &str)] = &[
    (Strategy::Name, "name"),
    (Strategy::FormControlName, "formcontrolname"),
    (Strategy::Placeholder, "placeholder"),
    (Strategy::Value, "value"),
    (Strategy::Role, "role"),
    (Strategy::Alt, "alt"),
];

/// Tags whose class attribute is too volatile to locate by
const CLASS_EXCLUDED_TAGS: &[&str] = &["button", "a", "span"];

/// Tags located by their rendered text
const TEXT_TAGS: &[&str] = &["button", "a", "input", "span", "li", "option"];

/// Which source a locator candidate is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Id,
    Name,
    FormControlName,
    Placeholder,
    Value,
    Role,
    Alt,
    Class,
    Text,
    Positional,
}

impl Strategy {
    /// Attribute the candidate is keyed on, if any
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            Strategy::Id => Some("id"),
            Strategy::Class => Some("class"),
            other => ATTRIBUTE_STRATEGIES
                .iter()
                .find(|(strategy, _)| *strategy == other)
                .map(|(_, attribute)| *attribute),
        }
    }
}

/// Builds the best available locator for an element
pub struct LocatorBuilder<'a, D: Document + ?Sized> {
    document: &'a D,
    evaluator: UniquenessEvaluator<'a, D>,
}

impl<'a, D: Document + ?Sized> LocatorBuilder<'a, D> {
    pub fn new(document: &'a D) -> Self {
        Self {
            document,
            evaluator: UniquenessEvaluator::new(document),
        }
    }

    /// Pick the first applicable strategy; attributes count when present, even if empty
    pub fn strategy(&self, tag: &str, node: D::Node) -> Strategy {
        let tag = tag.to_ascii_lowercase();
        let has = |name: &str| self.document.attribute(node, name).is_some();

        if has("id") {
            return Strategy::Id;
        }

        if let Some((strategy, _)) = ATTRIBUTE_STRATEGIES.iter().find(|(_, name)| has(*name)) {
            return *strategy;
        }

        if has("class") && !CLASS_EXCLUDED_TAGS.contains(&tag.as_str()) {
            Strategy::Class
        } else if TEXT_TAGS.contains(&tag.as_str()) {
            Strategy::Text
        } else {
            Strategy::Positional
        }
    }

    /// Build the locator for `node`, which was found under `tag`
    pub fn build(&self, tag: &str, node: D::Node) -> Locator {
        let tag = tag.to_ascii_lowercase();

        match self.strategy(&tag, node) {
            Strategy::Positional => self.positional(node),
            Strategy::Text => self.by_text(&tag, node),
            strategy => {
                // Only Id, Class and the attribute table reach this arm
                let Some(attribute) = strategy.attribute() else {
                    return self.positional(node);
                };
                let value = self.document.attribute(node, attribute).unwrap_or_default();
                let base = if strategy == Strategy::Id {
                    Quality::Id
                } else {
                    Quality::Attribute
                };
                let candidate = format!("//{}[@{}=\"{}\"]", tag, attribute, value);
                self.evaluator.evaluate(&candidate, node, base)
            }
        }
    }

    fn by_text(&self, tag: &str, node: D::Node) -> Locator {
        let text = self.document.inner_text(node);
        if text.is_empty() {
            return self.positional(node);
        }

        let candidate = match text.split_once('\n') {
            Some((first_line, _)) => format!("//{}[contains(text(),\"{}\")]", tag, first_line),
            None => format!("//{}[text()=\"{}\"]", tag, text),
        };
        self.evaluator.evaluate(&candidate, node, Quality::Attribute)
    }

    fn positional(&self, node: D::Node) -> Locator {
        Locator::new(generate_xpath(self.document, node, false), Quality::Positional)
    }
}
