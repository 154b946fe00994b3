//! Locator synthesis
//!
//! Turns a DOM element into an XPath expression plus a quality score saying how much the
//! expression can be trusted to keep pointing at the same element.

pub mod builder;
pub mod uniqueness;

pub use builder::{LocatorBuilder, Strategy};
pub use uniqueness::{UniquenessEvaluator, generate_xpath};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reliability of a locator, serialized as its integer level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Quality {
    /// Absolute positional path; breaks on any structural change
    Positional = 0,
    /// Attribute or text candidate disambiguated by its enclosing div
    ParentQualified = 1,
    /// Unique attribute or text match
    Attribute = 2,
    /// Unique id match
    Id = 3,
}

impl Quality {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.level()
    }
}

impl TryFrom<u8> for Quality {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Quality::Positional),
            1 => Ok(Quality::ParentQualified),
            2 => Ok(Quality::Attribute),
            3 => Ok(Quality::Id),
            other => Err(format!("quality level out of range: {}", other)),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// An XPath expression and its quality
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub xpath: String,
    pub quality: Quality,
}

impl Locator {
    pub fn new(xpath: impl Into<String>, quality: Quality) -> Self {
        Self {
            xpath: xpath.into(),
            quality,
        }
    }
}
