use crate::audit::{InfractionRecord, audit};
use crate::config::ScanConfig;
use crate::dom::{DomTree, ElementNode, NodeId};
use crate::error::Result;
use crate::frame::mailbox::{FrameAddress, Mailbox, Outbox, PostOffice};
use crate::frame::message::FrameMessage;
use crate::locator::LocatorBuilder;
use crate::scan::{
    ElementRecord, FrameLocator, InventoryStore, InventoryWriter, PageScanner, ScanSession, Storage,
};
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

/// Where a frame identified by a locator sits in the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLink {
    pub address: FrameAddress,
    pub parent: FrameAddress,
}

/// Locators this frame has handed to its child frames
#[derive(Debug, Clone, Default)]
pub struct FrameRegistry {
    links: IndexMap<String, FrameLink>,
}

impl FrameRegistry {
    pub fn register(&mut self, locator: impl Into<String>, link: FrameLink) {
        self.links.insert(locator.into(), link);
    }

    pub fn get(&self, locator: &str) -> Option<FrameLink> {
        self.links.get(locator).copied()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FrameLink)> {
        self.links.iter().map(|(locator, link)| (locator.as_str(), *link))
    }
}

/// Scanning actor for one frame of a page
pub struct FrameAgent {
    address: FrameAddress,
    parent: Option<FrameAddress>,
    document: DomTree,
    session: ScanSession,
    /// iframe element of this document -> frame loaded in it
    children: IndexMap<NodeId, FrameAddress>,
    registry: FrameRegistry,
    writer: Option<InventoryWriter>,
    pending_scan: bool,
    mailbox: Mailbox,
    config: Arc<ScanConfig>,
}

impl FrameAgent {
    pub(crate) fn new(
        document: DomTree,
        parent: Option<FrameAddress>,
        mailbox: Mailbox,
        writer: Option<InventoryWriter>,
        config: Arc<ScanConfig>,
    ) -> Self {
        Self {
            address: mailbox.address(),
            parent,
            document,
            session: ScanSession::new(),
            children: IndexMap::new(),
            registry: FrameRegistry::default(),
            writer,
            pending_scan: false,
            mailbox,
            config,
        }
    }

    pub fn address(&self) -> FrameAddress {
        self.address
    }

    pub fn parent(&self) -> Option<FrameAddress> {
        self.parent
    }

    /// The top-level frame has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn document(&self) -> &DomTree {
        &self.document
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ScanSession {
        &mut self.session
    }

    pub fn registry(&self) -> &FrameRegistry {
        &self.registry
    }

    pub fn pending_scan(&self) -> bool {
        self.pending_scan
    }

    /// Child frames in document order of their iframe elements
    pub fn children(&self) -> impl Iterator<Item = (NodeId, FrameAddress)> + '_ {
        self.children.iter().map(|(node, address)| (*node, *address))
    }

    pub(crate) fn add_child(&mut self, iframe: NodeId, child: FrameAddress) {
        self.children.insert(iframe, child);
    }

    /// Called once when the frame's document loads
    pub fn start(&mut self, outbox: &mut dyn Outbox) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.reset()?;
            self.session.set_frame(FrameLocator::Root);
        } else if !self.session.frame().is_assigned() {
            self.request_identity(outbox);
        }
        Ok(())
    }

    pub fn handle(&mut self, message: FrameMessage, outbox: &mut dyn Outbox) -> Result<()> {
        match message {
            FrameMessage::RequestIdentity => self.assign_child_identities(outbox),
            FrameMessage::AssignIdentity(locator) => {
                if self.is_root() {
                    return Ok(());
                }
                self.session.set_frame(FrameLocator::from(locator));
                if self.pending_scan && self.session.frame().is_assigned() {
                    self.pending_scan = false;
                    self.scan(outbox)?;
                }
            }
            FrameMessage::Rescan => self.scan(outbox)?,
            FrameMessage::Elements(batch) => match self.writer.as_mut() {
                Some(writer) => {
                    writer.merge_elements(batch)?;
                }
                None => self.post_to_parent(outbox, &FrameMessage::Elements(batch)),
            },
            FrameMessage::Infractions(batch) => match self.writer.as_mut() {
                Some(writer) => {
                    writer.merge_infractions(batch)?;
                }
                None => self.post_to_parent(outbox, &FrameMessage::Infractions(batch)),
            },
        }
        Ok(())
    }

    /// Scan this frame, hand the results toward the top frame, and ask nested frames to
    /// do the same. A child frame without an identity asks its parent for one first and
    /// scans once it arrives.
    pub fn scan(&mut self, outbox: &mut dyn Outbox) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.reset()?;
            self.session.set_frame(FrameLocator::Root);
        }

        if !self.session.frame().is_assigned() {
            self.pending_scan = true;
            self.request_identity(outbox);
            return Ok(());
        }

        let mut assignments: Vec<(NodeId, String)> = Vec::new();
        PageScanner::new(&self.config).scan(&self.document, &mut self.session, &mut assignments);
        self.route_identities(assignments, outbox);

        let infractions: Option<Vec<InfractionRecord>> = if self.config.audit {
            let found = audit(&self.document, self.session.frame());
            self.session.set_infractions(found.clone());
            Some(found)
        } else {
            None
        };

        let elements: Vec<ElementRecord> = self.session.elements().to_vec();
        match self.writer.as_mut() {
            Some(writer) => {
                writer.replace_elements(&elements)?;
                if let Some(infractions) = &infractions {
                    writer.replace_infractions(infractions)?;
                }
                info!("Top frame stored {} elements", elements.len());
            }
            None => {
                self.post_to_parent(outbox, &FrameMessage::Elements(elements));
                if let Some(infractions) = infractions {
                    self.post_to_parent(outbox, &FrameMessage::Infractions(infractions));
                }
            }
        }

        for child in self.children.values() {
            outbox.post(self.address, *child, &FrameMessage::Rescan);
        }
        Ok(())
    }

    /// Compute every iframe's locator and send it to the frame inside
    fn assign_child_identities(&mut self, outbox: &mut dyn Outbox) {
        let builder = LocatorBuilder::new(&self.document);
        let assignments: Vec<(NodeId, String)> = self
            .document
            .elements_by_tag_name("iframe")
            .into_iter()
            .map(|iframe| (iframe, builder.build("iframe", iframe).xpath))
            .collect();
        self.route_identities(assignments, outbox);
    }

    fn route_identities(&mut self, assignments: Vec<(NodeId, String)>, outbox: &mut dyn Outbox) {
        for (iframe, locator) in assignments {
            match self.children.get(&iframe) {
                Some(&child) => {
                    self.registry.register(
                        locator.as_str(),
                        FrameLink {
                            address: child,
                            parent: self.address,
                        },
                    );
                    outbox.post(self.address, child, &FrameMessage::AssignIdentity(locator));
                }
                None => debug!("No reachable document behind iframe {}", locator),
            }
        }
    }

    fn request_identity(&mut self, outbox: &mut dyn Outbox) {
        self.post_to_parent(outbox, &FrameMessage::RequestIdentity);
    }

    fn post_to_parent(&self, outbox: &mut dyn Outbox, message: &FrameMessage) {
        if let Some(parent) = self.parent {
            outbox.post(self.address, parent, message);
        }
    }

    fn next_message(&mut self) -> Option<FrameMessage> {
        self.mailbox.try_next()
    }
}

/// All frames of one loaded page plus the channel between them
pub struct Page {
    agents: Vec<FrameAgent>,
    post_office: PostOffice,
    store: InventoryStore,
    config: Arc<ScanConfig>,
}

impl Page {
    /// Load a page snapshot: one agent per reachable frame, then let every child frame
    /// obtain its identity
    pub fn new(
        snapshot: ElementNode,
        config: ScanConfig,
        storage: impl Storage + 'static,
    ) -> Result<Self> {
        let store = InventoryStore::new(storage, &config);
        let mut page = Self {
            agents: Vec::new(),
            post_office: PostOffice::new(),
            store,
            config: Arc::new(config),
        };

        let writer = page.store.writer();
        page.spawn(snapshot, None, Some(writer));
        info!("Loaded page with {} frames", page.agents.len());

        for agent in page.agents.iter_mut() {
            agent.start(&mut page.post_office)?;
        }
        page.run_until_idle()?;
        Ok(page)
    }

    pub fn in_memory(snapshot: ElementNode, config: ScanConfig) -> Result<Self> {
        Self::new(snapshot, config, crate::scan::MemoryStorage::new())
    }

    fn spawn(
        &mut self,
        root: ElementNode,
        parent: Option<FrameAddress>,
        writer: Option<InventoryWriter>,
    ) -> FrameAddress {
        let mut document = DomTree::new(root);
        let nested: Vec<(NodeId, ElementNode)> = document
            .elements_by_tag_name("iframe")
            .into_iter()
            .filter_map(|iframe| {
                document
                    .take_content_document(iframe)
                    .map(|inner| (iframe, inner))
            })
            .collect();

        let mailbox = self.post_office.open_mailbox();
        let address = mailbox.address();
        debug!(
            "Frame {} holds {} elements and {} nested documents",
            address.index(),
            document.count_elements(),
            nested.len()
        );
        self.agents
            .push(FrameAgent::new(document, parent, mailbox, writer, self.config.clone()));

        for (iframe, inner) in nested {
            let child = self.spawn(inner, Some(address), None);
            self.agents[address.index()].add_child(iframe, child);
        }
        address
    }

    /// Run a full scan cycle from the top frame down and wait for it to settle
    pub fn scan(&mut self) -> Result<Vec<ElementRecord>> {
        self.post(FrameAddress::TOP, &FrameMessage::Rescan);
        let delivered = self.run_until_idle()?;
        debug!("Scan cycle settled after {} messages", delivered);
        self.store.elements()
    }

    /// Queue a message for a frame as if it came from the top frame
    pub fn post(&mut self, to: FrameAddress, message: &FrameMessage) {
        self.post_office.post(FrameAddress::TOP, to, message);
    }

    /// Queue a raw payload for a frame
    pub fn post_raw(&mut self, to: FrameAddress, payload: Value) -> bool {
        self.post_office.deliver(FrameAddress::TOP, to, payload)
    }

    /// Deliver queued messages until every mailbox is empty; returns how many were handled
    pub fn run_until_idle(&mut self) -> Result<usize> {
        let mut delivered = 0;
        loop {
            let mut progressed = false;
            for agent in self.agents.iter_mut() {
                while let Some(message) = agent.next_message() {
                    agent.handle(message, &mut self.post_office)?;
                    delivered += 1;
                    progressed = true;
                }
            }
            if !progressed {
                return Ok(delivered);
            }
        }
    }

    pub fn inventory(&self) -> &InventoryStore {
        &self.store
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn agents(&self) -> &[FrameAgent] {
        &self.agents
    }

    pub fn agent(&self, address: FrameAddress) -> Option<&FrameAgent> {
        self.agents.get(address.index())
    }

    pub fn agent_mut(&mut self, address: FrameAddress) -> Option<&mut FrameAgent> {
        self.agents.get_mut(address.index())
    }

    pub fn root(&self) -> &FrameAgent {
        &self.agents[FrameAddress::TOP.index()]
    }

    /// Frame that `parent` handed `locator` to. Locators are only unique among the
    /// iframes of one document, so the parent is part of the key.
    pub fn locate(&self, parent: FrameAddress, locator: &str) -> Option<FrameLink> {
        self.agent(parent)?.registry().get(locator)
    }

    /// Frames whose assigned identity is `frame`, in page order
    pub fn frames_with(&self, frame: &FrameLocator) -> Vec<FrameAddress> {
        self.agents
            .iter()
            .filter(|agent| agent.session().frame() == frame)
            .map(FrameAgent::address)
            .collect()
    }

    /// Locators from the top frame down to the frame at `address`
    pub fn address_path(&self, address: FrameAddress) -> Option<Vec<String>> {
        let mut path = Vec::new();
        let mut current = self.agent(address)?;

        while let Some(parent) = current.parent() {
            let FrameLocator::Frame(locator) = current.session().frame() else {
                return None;
            };
            self.locate(parent, locator)
                .filter(|link| link.address == current.address())?;
            path.push(locator.clone());
            current = self.agent(parent)?;
        }

        path.reverse();
        Some(path)
    }

    /// Locators from the top frame down to the frame identified by `frame`.
    ///
    /// Sibling documents may hand out the same locator; when several frames share it the
    /// most deeply nested one wins. Use [`Page::frame_path_for`] to resolve a scanned
    /// record exactly.
    pub fn frame_path(&self, frame: &FrameLocator) -> Option<Vec<String>> {
        if frame.is_root() {
            return Some(Vec::new());
        }
        self.frames_with(frame)
            .into_iter()
            .filter_map(|address| self.address_path(address))
            .rev()
            .max_by_key(Vec::len)
    }

    /// Locators from the top frame down to the frame that admitted `record`
    pub fn frame_path_for(&self, record: &ElementRecord) -> Option<Vec<String>> {
        let owner = self.frames_with(&record.frame).into_iter().find(|&address| {
            self.agent(address).is_some_and(|agent| {
                agent.session().elements().iter().any(|admitted| admitted.same_element(record))
            })
        });

        match owner {
            Some(address) => self.address_path(address),
            None => self.frame_path(&record.frame),
        }
    }
}
