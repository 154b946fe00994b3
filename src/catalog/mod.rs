//! Host-side object catalog
//!
//! The host keeps scanned elements as named objects: each record gets a stable
//! `<tag>_<10 digits>` name, users can retarget a name at a different locator, and
//! filtered selections are exported to the pybot object format.

pub mod recorder;

pub use recorder::{RecordedStep, RecordedSteps, StepKind};

use crate::error::Result;
use crate::locator::Quality;
use crate::scan::ElementRecord;
use indexmap::IndexMap;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

const NAME_SUFFIX_RANGE: RangeInclusive<u64> = 1_000_000_000..=9_999_999_999;

/// A named element record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "NAME")]
    pub name: String,

    #[serde(flatten)]
    pub record: ElementRecord,
}

/// Entry in a pybot object file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PybotObject {
    #[serde(rename = "GetFieldBy")]
    pub get_field_by: String,

    #[serde(rename = "ValueToFind")]
    pub value_to_find: String,

    #[serde(rename = "Quality")]
    pub quality: String,
}

/// Selection of records by minimum quality and tag
#[derive(Debug, Clone, PartialEq)]
pub struct ElementFilter {
    pub min_quality: Quality,
    /// Bare tag names; empty means every tag
    pub tags: Vec<String>,
}

impl Default for ElementFilter {
    fn default() -> Self {
        Self {
            min_quality: Quality::Positional,
            tags: Vec::new(),
        }
    }
}

impl ElementFilter {
    pub fn new(min_quality: Quality) -> Self {
        Self {
            min_quality,
            ..Self::default()
        }
    }

    /// Builder method: restrict to these tags, with or without angle brackets
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|tag| {
                tag.as_ref()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_ascii_lowercase()
            })
            .collect();
        self
    }

    pub fn matches(&self, record: &ElementRecord) -> bool {
        record.quality >= self.min_quality
            && (self.tags.is_empty() || self.tags.iter().any(|tag| tag == record.bare_tag()))
    }
}

/// Replace single quotes so an expression can be embedded in single-quoted script text
pub fn normalize_xpath(xpath: &str) -> String {
    xpath.replace('\'', "\"")
}

/// Named objects built from scan results, most recently loaded first
#[derive(Debug, Clone)]
pub struct ObjectCatalog {
    entries: Vec<CatalogEntry>,
    used_suffixes: HashSet<u64>,
    rng: StdRng,
}

impl Default for ObjectCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectCatalog {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Catalog with reproducible names
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            entries: Vec::new(),
            used_suffixes: HashSet::new(),
            rng,
        }
    }

    /// Load a whole inventory, keeping its order
    pub fn load_inventory(&mut self, records: &[ElementRecord]) {
        for record in records.iter().rev() {
            self.load_object(record.clone());
        }
        info!("Catalog holds {} objects", self.entries.len());
    }

    /// A fresh `<tag>_<10 digits>` name not handed out before
    pub fn generate_name(&mut self, tag: &str) -> String {
        let bare = tag.trim_start_matches('<').trim_end_matches('>');
        loop {
            let suffix = self.rng.gen_range(NAME_SUFFIX_RANGE);
            if self.used_suffixes.insert(suffix) {
                return format!("{}_{}", bare, suffix);
            }
        }
    }

    /// Add a record at the front; a record with the same xpath keeps its existing name
    pub fn load_object(&mut self, mut record: ElementRecord) -> &CatalogEntry {
        record.xpath = normalize_xpath(&record.xpath);

        let name = match self.entries.iter().position(|entry| entry.record.xpath == record.xpath) {
            Some(index) => self.entries.remove(index).name,
            None => self.generate_name(&record.tag_name),
        };

        debug!("Loaded object {} -> {}", name, record.xpath);
        self.entries.insert(0, CatalogEntry { name, record });
        &self.entries[0]
    }

    /// Point an existing name at a new locator; returns false for unknown names
    pub fn update_element(&mut self, name: &str, xpath: &str) -> bool {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.record.xpath = normalize_xpath(xpath);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filter(&self, filter: &ElementFilter) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(&entry.record))
            .collect()
    }

    /// Pybot object map keyed by name
    pub fn to_pybot(entries: &[&CatalogEntry]) -> IndexMap<String, PybotObject> {
        entries
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    PybotObject {
                        get_field_by: "Xpath".to_string(),
                        value_to_find: entry.record.xpath.clone(),
                        quality: entry.record.quality.to_string(),
                    },
                )
            })
            .collect()
    }

    /// Write the filtered objects as a pybot JSON file; returns how many were written
    pub fn save_to_file(&self, filter: &ElementFilter, path: impl AsRef<Path>) -> Result<usize> {
        let selected = self.filter(filter);
        let objects = Self::to_pybot(&selected);
        fs::write(path.as_ref(), serde_json::to_string_pretty(&objects)?)?;
        info!("Saved {} objects to {}", objects.len(), path.as_ref().display());
        Ok(objects.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::scan::FrameLocator;

    fn record(tag: &str, xpath: &str, quality: Quality) -> ElementRecord {
        ElementRecord::new(tag, Locator::new(xpath, quality), FrameLocator::Root)
    }

    #[test]
    fn test_generated_names() {
        let mut catalog = ObjectCatalog::with_seed(7);
        let first = catalog.generate_name("<input>");
        let second = catalog.generate_name("<input>");

        assert!(first.starts_with("input_"));
        assert_eq!(first.len(), "input_".len() + 10);
        assert_ne!(first, second);
    }

    #[test]
    fn test_load_object_keeps_name_and_moves_to_front() {
        let mut catalog = ObjectCatalog::with_seed(1);
        let name = catalog
            .load_object(record("input", "//input[@name='q']", Quality::Attribute))
            .name
            .clone();
        catalog.load_object(record("a", "//a", Quality::Positional));
        let reloaded = catalog
            .load_object(record("input", "//input[@name=\"q\"]", Quality::Attribute))
            .name
            .clone();

        assert_eq!(name, reloaded);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].name, name);
        assert_eq!(catalog.entries()[0].record.xpath, "//input[@name=\"q\"]");
    }

    #[test]
    fn test_load_inventory_preserves_order() {
        let mut catalog = ObjectCatalog::with_seed(2);
        catalog.load_inventory(&[
            record("button", "//button", Quality::Positional),
            record("a", "//a", Quality::Positional),
        ]);

        assert_eq!(catalog.entries()[0].record.tag_name, "<button>");
        assert_eq!(catalog.entries()[1].record.tag_name, "<a>");
    }

    #[test]
    fn test_update_element() {
        let mut catalog = ObjectCatalog::with_seed(3);
        let name = catalog.load_object(record("li", "//li", Quality::Positional)).name.clone();

        assert!(catalog.update_element(&name, "//ul/li[@class='x']"));
        assert_eq!(catalog.find(&name).unwrap().record.xpath, "//ul/li[@class=\"x\"]");
        assert!(!catalog.update_element("li_0000000000", "//li"));
    }

    #[test]
    fn test_filter_and_pybot_export() {
        let mut catalog = ObjectCatalog::with_seed(4);
        catalog.load_inventory(&[
            record("input", "//input[@id=\"a\"]", Quality::Id),
            record("input", "/html/body[1]/input[2]", Quality::Positional),
            record("button", "//button[text()=\"Go\"]", Quality::Attribute),
        ]);

        let filter = ElementFilter::new(Quality::Attribute).with_tags(["<input>"]);
        let selected = catalog.filter(&filter);
        assert_eq!(selected.len(), 1);

        let objects = ObjectCatalog::to_pybot(&selected);
        let (name, object) = objects.first().unwrap();
        assert!(name.starts_with("input_"));
        assert_eq!(object.get_field_by, "Xpath");
        assert_eq!(object.value_to_find, "//input[@id=\"a\"]");
        assert_eq!(object.quality, "3");
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = CatalogEntry {
            name: "a_1234567890".to_string(),
            record: record("a", "//a", Quality::Positional),
        };
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["NAME"], "a_1234567890");
        assert_eq!(json["TAGNAME"], "<a>");
        let back: CatalogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_save_to_file() {
        let mut catalog = ObjectCatalog::with_seed(5);
        catalog.load_object(record("img", "//img[@alt=\"Logo\"]", Quality::Attribute));
        let path = std::env::temp_dir()
            .join(format!("xpath-scanner-pybot-{}.json", std::process::id()));

        let written = catalog.save_to_file(&ElementFilter::default(), &path).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(written, 1);
        assert_eq!(saved.as_object().unwrap().len(), 1);
        let _ = fs::remove_file(&path);
    }
}
