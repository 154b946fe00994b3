//! Element scanning for one frame
//!
//! - ElementRecord / FrameLocator: what a scan emits
//! - ScanSession: per-frame state across scans
//! - PageScanner + ElementValidator: the tag walk and the admission check
//! - InventoryStore: the persisted, merged inventory

pub mod record;
pub mod scanner;
pub mod session;
pub mod store;
pub mod validator;

pub use record::{ElementRecord, FrameLocator, ROOT_FRAME, wrap_tag};
pub use scanner::PageScanner;
pub use session::ScanSession;
pub use store::{FileStorage, InventoryStore, InventoryWriter, MemoryStorage, Storage};
pub use validator::{ElementValidator, FrameSink, NoFrames};
