//! Cross-frame coordination
//!
//! Every frame of a page runs its own [`FrameAgent`] with a private mailbox. Frames never
//! share memory: identities flow down as `refreshXpathFrame`, rescans flow down as
//! `refreshElements`, and element lists flow up hop by hop until they reach the top frame,
//! the only one allowed to write the inventory.

pub mod coordinator;
pub mod mailbox;
pub mod message;

pub use coordinator::{FrameAgent, FrameLink, FrameRegistry, Page};
pub use mailbox::{Envelope, FrameAddress, Mailbox, Outbox, PostOffice};
pub use message::{FrameMessage, MESSAGE_TYPES};
