use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Storage key of the persisted element inventory
pub const ELEMENTS_KEY: &str = "myElementsCache";

/// Storage key of the persisted accessibility infractions
pub const INFRACTIONS_KEY: &str = "MyInfractionsCache";

/// Tags walked by a scan, in scan order, without `svg`
pub const BASE_TAGS: &[&str] = &[
    "iframe", "div", "form", "table", "input", "select", "option", "textarea", "button", "a",
    "span", "img", "li",
];

/// Options controlling what a scan collects and where it is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Tags walked per frame, in order
    pub tags: Vec<String>,

    /// Mouse-move ticks without a new target before the inspector drops its highlight
    pub hover_reset_threshold: u32,

    /// Run the accessibility rules alongside each scan
    pub audit: bool,

    pub elements_key: String,

    pub infractions_key: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tags: default_tags(true),
            hover_reset_threshold: 10,
            audit: true,
            elements_key: ELEMENTS_KEY.to_string(),
            infractions_key: INFRACTIONS_KEY.to_string(),
        }
    }
}

/// The standard tag list, with `svg` placed before `li` when requested
pub fn default_tags(include_svg: bool) -> Vec<String> {
    let mut tags: Vec<String> = BASE_TAGS.iter().map(|tag| tag.to_string()).collect();
    if include_svg {
        let li = tags.len() - 1;
        tags.insert(li, "svg".to_string());
    }
    tags
}

impl ScanConfig {
    /// Create a new ScanConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder method: add or remove `svg` from the tag list
    pub fn include_svg(mut self, include: bool) -> Self {
        self.tags.retain(|tag| tag != "svg");
        if include {
            let position = self
                .tags
                .iter()
                .position(|tag| tag == "li")
                .unwrap_or(self.tags.len());
            self.tags.insert(position, "svg".to_string());
        }
        self
    }

    /// Builder method: replace the tag list
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(|tag| tag.into().to_ascii_lowercase()).collect();
        self
    }

    /// Builder method: set the hover reset threshold
    pub fn hover_reset_threshold(mut self, ticks: u32) -> Self {
        self.hover_reset_threshold = ticks;
        self
    }

    /// Builder method: enable or disable the accessibility audit
    pub fn audit(mut self, enabled: bool) -> Self {
        self.audit = enabled;
        self
    }

    /// Builder method: set both storage keys
    pub fn storage_keys(
        mut self,
        elements: impl Into<String>,
        infractions: impl Into<String>,
    ) -> Self {
        self.elements_key = elements.into();
        self.infractions_key = infractions.into();
        self
    }

    pub fn scans_svg(&self) -> bool {
        self.tags.iter().any(|tag| tag == "svg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();

        assert_eq!(config.tags.first().map(String::as_str), Some("iframe"));
        assert_eq!(config.tags.last().map(String::as_str), Some("li"));
        assert!(config.scans_svg());
        assert_eq!(config.hover_reset_threshold, 10);
        assert_eq!(config.elements_key, "myElementsCache");
        assert_eq!(config.infractions_key, "MyInfractionsCache");
    }

    #[test]
    fn test_builder_pattern() {
        let config = ScanConfig::new()
            .include_svg(false)
            .hover_reset_threshold(3)
            .audit(false);

        assert!(!config.scans_svg());
        assert_eq!(config.tags.len(), BASE_TAGS.len());
        assert_eq!(config.hover_reset_threshold, 3);
        assert!(!config.audit);

        let config = config.include_svg(true).include_svg(true);
        let svg = config.tags.iter().position(|t| t == "svg").unwrap();
        assert_eq!(config.tags[svg + 1], "li");
        assert_eq!(config.tags.iter().filter(|t| *t == "svg").count(), 1);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            ScanConfig::from_json(r#"{"tags": ["input", "button"], "audit": false}"#).unwrap();

        assert_eq!(config.tags, vec!["input", "button"]);
        assert!(!config.audit);
        assert_eq!(config.hover_reset_threshold, 10);
    }

    #[test]
    fn test_default_tags() {
        assert!(!default_tags(false).contains(&"svg".to_string()));
        assert_eq!(default_tags(true).len(), BASE_TAGS.len() + 1);
    }
}
