use crate::frame::message::FrameMessage;
use log::{debug, warn};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Address of one frame's mailbox within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameAddress(usize);

impl FrameAddress {
    /// The top-level frame is always the first mailbox opened
    pub const TOP: FrameAddress = FrameAddress(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A raw payload in flight
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: FrameAddress,
    pub payload: Value,
}

/// Send side of the cross-frame channel
pub trait Outbox {
    fn post(&mut self, from: FrameAddress, to: FrameAddress, message: &FrameMessage);
}

/// Receive side owned by one frame
#[derive(Debug)]
pub struct Mailbox {
    address: FrameAddress,
    receiver: UnboundedReceiver<Envelope>,
}

impl Mailbox {
    pub fn address(&self) -> FrameAddress {
        self.address
    }

    /// Next decodable message, skipping anything unknown; `None` when empty
    pub fn try_next(&mut self) -> Option<FrameMessage> {
        while let Ok(envelope) = self.receiver.try_recv() {
            if let Some(message) = FrameMessage::decode(&envelope.payload) {
                debug!(
                    "Frame {} received {} from frame {}",
                    self.address.0,
                    message.kind(),
                    envelope.from.0
                );
                return Some(message);
            }
        }
        None
    }
}

/// Routes payloads to mailboxes by address
#[derive(Debug, Default)]
pub struct PostOffice {
    senders: Vec<UnboundedSender<Envelope>>,
}

impl PostOffice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a mailbox at the next free address
    pub fn open_mailbox(&mut self) -> Mailbox {
        let (sender, receiver) = mpsc::unbounded_channel();
        let address = FrameAddress(self.senders.len());
        self.senders.push(sender);
        Mailbox { address, receiver }
    }

    /// Deliver an already-encoded payload; returns false if nothing listens at `to`
    pub fn deliver(&self, from: FrameAddress, to: FrameAddress, payload: Value) -> bool {
        match self.senders.get(to.0) {
            Some(sender) => sender.send(Envelope { from, payload }).is_ok(),
            None => false,
        }
    }
}

impl Outbox for PostOffice {
    fn post(&mut self, from: FrameAddress, to: FrameAddress, message: &FrameMessage) {
        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Dropping {} message: {}", message.kind(), e);
                return;
            }
        };

        if !self.deliver(from, to, payload) {
            debug!("No frame listening at {} for {}", to.0, message.kind());
        }
    }
}
