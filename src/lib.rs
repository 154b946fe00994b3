//! # xpath-scanner
//!
//! Element scanning and XPath synthesis for QA automation.
//!
//! ## Features
//!
//! - **Locator synthesis**: Builds an XPath for every automatable element and scores how far
//!   it can be trusted
//! - **Frame coordination**: Scans nested iframes, each frame in its own agent, and merges one
//!   page-level inventory
//! - **Accessibility audit**: Reports missing alt text, unnamed buttons and links, and unlabeled
//!   inputs per frame
//! - **Inspector**: Pick a single element with the pointer and report its locator to the host
//! - **Object catalog**: Names scanned elements and exports them as pybot objects
//!
//! ## Scanning a live page
//!
//! ```rust,no_run
//! use xpath_scanner::{BrowserSession, LaunchOptions, MemoryStorage, ScanConfig};
//!
//! # fn main() -> xpath_scanner::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://example.com")?;
//! session.wait_for_navigation()?;
//!
//! let mut page = session.scan_page(ScanConfig::default(), MemoryStorage::new())?;
//! for record in page.scan()? {
//!     println!("{} {} (quality {})", record.tag_name, record.xpath, record.quality);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Scanning a snapshot
//!
//! Pages can also be built by hand, which is how the crate's own tests drive it:
//!
//! ```rust
//! use xpath_scanner::{ElementNode, Page, Quality, ScanConfig};
//!
//! # fn main() -> xpath_scanner::Result<()> {
//! let snapshot = ElementNode::new("html").with_child(
//!     ElementNode::new("body").with_child(
//!         ElementNode::new("input")
//!             .with_attribute("id", "search")
//!             .with_bounding_box(0.0, 0.0, 200.0, 24.0),
//!     ),
//! );
//!
//! let mut page = Page::in_memory(snapshot, ScanConfig::default())?;
//! let elements = page.scan()?;
//!
//! assert_eq!(elements[0].xpath, "//input[@id=\"search\"]");
//! assert_eq!(elements[0].quality, Quality::Id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`dom`]: Page snapshots, the arena document and the XPath evaluator
//! - [`locator`]: Locator strategies, uniqueness checks and quality levels
//! - [`scan`]: Per-frame scanning, element records and the persisted inventory
//! - [`frame`]: Cross-frame messages, mailboxes and the page coordinator
//! - [`audit`]: Accessibility rules
//! - [`inspector`]: Pointer-driven element picker
//! - [`host`]: Calls out to the host application
//! - [`catalog`]: Named objects, pybot export and recorded steps
//! - [`browser`]: Chrome session management
//! - [`config`]: Scan configuration
//! - [`error`]: Error types and result aliases

pub mod audit;
pub mod browser;
pub mod catalog;
pub mod config;
pub mod dom;
pub mod error;
pub mod frame;
pub mod host;
pub mod inspector;
pub mod locator;
pub mod scan;

pub use audit::InfractionRecord;
pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use catalog::{ElementFilter, ObjectCatalog, RecordedSteps};
pub use config::ScanConfig;
pub use dom::{BoundingBox, DomTree, ElementNode, NodeId};
pub use error::{Result, ScanError};
pub use frame::{FrameMessage, Page};
pub use host::{HostBridge, HostCall};
pub use inspector::{InspectorMode, InspectorSession};
pub use locator::{Locator, Quality};
pub use scan::{ElementRecord, FileStorage, FrameLocator, MemoryStorage};
