//! Chrome adapter
//!
//! Launches or attaches to Chrome through the DevTools protocol, captures the live page
//! (including same-origin iframe documents and layout rectangles) as an [`ElementNode`]
//! snapshot, and draws highlight boxes for scanned records.
//!
//! [`ElementNode`]: crate::dom::ElementNode

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::{BrowserSession, LocatorKind};
