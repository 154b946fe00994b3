//! Element picker
//!
//! An [`InspectorSession`] follows the pointer over a frame's document, keeps a highlight box
//! over the element under it, and on click builds that element's locator and reports it to
//! the host. Editable targets keep listening afterwards so the first keystroke and the final
//! value are reported too.
//!
//! Browser events are fed in as [`PageEvent`]s; drawing goes through the [`Overlay`] seam.

use crate::catalog::{RecordedStep, StepKind};
use crate::config::ScanConfig;
use crate::dom::{BoundingBox, DomTree, NodeId};
use crate::host::{HostBridge, HostCall};
use crate::locator::LocatorBuilder;
use crate::scan::{ElementRecord, ScanSession};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::{Deserialize, Serialize};

/// Input types that accept typed text
const TEXT_INPUT_TYPES: &[&str] = &["text", "email", "password", "search", "tel", "url", "number"];

/// What a pick is reported as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectorMode {
    /// Describe the picked element
    Inspector,
    /// Record the interaction as a step; no highlight is drawn
    Recorder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectorState {
    Inactive,
    /// Active, nothing under the pointer worth reporting
    Tracking,
    /// Active, element highlighted and awaiting a click
    Pinned(NodeId),
}

/// Browser event delivered to the session
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    MouseMove { target: NodeId },
    Click { target: NodeId },
    Input { target: NodeId, value: String },
    Blur { target: NodeId, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    GlobalClick,
    GlobalMouseMove,
    Input(NodeId),
    Blur(NodeId),
}

/// Listeners currently attached to the page
#[derive(Debug, Clone, Default)]
pub struct ListenerSet {
    attached: IndexSet<Listener>,
}

impl ListenerSet {
    pub fn attach(&mut self, listener: Listener) {
        self.attached.insert(listener);
    }

    pub fn detach(&mut self, listener: Listener) -> bool {
        self.attached.shift_remove(&listener)
    }

    pub fn is_attached(&self, listener: Listener) -> bool {
        self.attached.contains(&listener)
    }

    pub fn clear(&mut self) {
        self.attached.clear();
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listener> {
        self.attached.iter()
    }
}

/// Where highlight boxes are drawn
pub trait Overlay {
    fn draw(&mut self, rect: &BoundingBox);

    /// Remove every box drawn so far
    fn clear(&mut self);

    /// Whether the node is one of the overlay's own boxes
    fn contains(&self, _node: NodeId) -> bool {
        false
    }
}

/// Overlay that only remembers the boxes it currently shows
#[derive(Debug, Clone, Default)]
pub struct OverlayLayer {
    boxes: Vec<BoundingBox>,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }
}

impl Overlay for OverlayLayer {
    fn draw(&mut self, rect: &BoundingBox) {
        self.boxes.push(*rect);
    }

    fn clear(&mut self) {
        self.boxes.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionKind {
    #[serde(rename = "click")]
    Click,
    /// First keystroke in an editable element
    #[serde(rename = "send_key")]
    Keystroke,
    /// Final value of an editable element when it loses focus
    #[serde(rename = "input")]
    Input,
}

/// Structured description of a picked element handed to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub element: ElementRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub mode: InspectorMode,
}

impl InteractionEvent {
    fn into_host_call(self) -> HostCall {
        match self.mode {
            InspectorMode::Inspector => HostCall::DescribeElement(self),
            InspectorMode::Recorder => {
                let kind = match self.kind {
                    InteractionKind::Click => StepKind::Click,
                    InteractionKind::Keystroke => StepKind::SendKey,
                    InteractionKind::Input => StepKind::Input,
                };
                let mut step = RecordedStep::new(kind).with_element(self.element);
                step.value = self.value;
                HostCall::RecordStep(step)
            }
        }
    }
}

/// Pick-mode state machine for one frame
#[derive(Debug, Clone)]
pub struct InspectorSession {
    mode: InspectorMode,
    state: InspectorState,
    listeners: ListenerSet,
    hover_ticks: u32,
    threshold: u32,
    /// Records of clicked editable elements still listening for input
    editing: IndexMap<NodeId, ElementRecord>,
}

impl InspectorSession {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            mode: InspectorMode::Inspector,
            state: InspectorState::Inactive,
            listeners: ListenerSet::default(),
            hover_ticks: 0,
            threshold: config.hover_reset_threshold,
            editing: IndexMap::new(),
        }
    }

    pub fn mode(&self) -> InspectorMode {
        self.mode
    }

    pub fn state(&self) -> InspectorState {
        self.state
    }

    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    pub fn is_active(&self) -> bool {
        self.state != InspectorState::Inactive
    }

    /// Attach the page-wide listeners and start tracking the pointer
    pub fn activate(&mut self, mode: InspectorMode, session: &mut ScanSession) {
        self.mode = mode;
        self.listeners.attach(Listener::GlobalClick);
        self.listeners.attach(Listener::GlobalMouseMove);
        self.hover_ticks = 0;
        self.state = InspectorState::Tracking;
        session.set_inspector_active(true);
        debug!("Inspector activated in {:?} mode", mode);
    }

    /// Remove every listener and overlay box; safe to call repeatedly
    pub fn deactivate(&mut self, session: &mut ScanSession, overlay: &mut dyn Overlay) {
        self.listeners.clear();
        self.editing.clear();
        overlay.clear();
        self.hover_ticks = 0;
        self.state = InspectorState::Inactive;
        session.set_inspector_active(false);
    }

    /// Feed one browser event; returns the interaction reported to the host, if any
    pub fn handle(
        &mut self,
        event: &PageEvent,
        document: &DomTree,
        session: &mut ScanSession,
        overlay: &mut dyn Overlay,
        host: &dyn HostBridge,
    ) -> Option<InteractionEvent> {
        let reported = match event {
            PageEvent::MouseMove { target } => {
                self.mouse_move(*target, document, overlay);
                None
            }
            PageEvent::Click { target } => self.click(*target, document, session, overlay),
            PageEvent::Input { target, value } => self.input(*target, value),
            PageEvent::Blur { target, value } => self.blur(*target, value),
        };

        if let Some(interaction) = &reported {
            host.call(interaction.clone().into_host_call());
        }
        reported
    }

    fn mouse_move(&mut self, target: NodeId, document: &DomTree, overlay: &mut dyn Overlay) {
        if !self.listeners.is_attached(Listener::GlobalMouseMove) {
            return;
        }

        self.hover_ticks += 1;
        let qualifying = document.is_element(target)
            && !overlay.contains(target)
            && self.state != InspectorState::Pinned(target);

        if qualifying {
            overlay.clear();
            if self.mode == InspectorMode::Inspector {
                if let Some(rect) = document.client_rects(target).first() {
                    overlay.draw(rect);
                }
            }
            self.state = InspectorState::Pinned(target);
            self.hover_ticks = 0;
        } else if self.hover_ticks > self.threshold {
            overlay.clear();
            self.state = InspectorState::Tracking;
            self.hover_ticks = 0;
        }
    }

    fn click(
        &mut self,
        target: NodeId,
        document: &DomTree,
        session: &mut ScanSession,
        overlay: &mut dyn Overlay,
    ) -> Option<InteractionEvent> {
        if !self.listeners.is_attached(Listener::GlobalClick) {
            return None;
        }

        let picked = match self.state {
            InspectorState::Pinned(node) => node,
            _ => target,
        };

        overlay.clear();
        self.listeners.detach(Listener::GlobalClick);
        self.listeners.detach(Listener::GlobalMouseMove);
        self.state = InspectorState::Inactive;
        self.hover_ticks = 0;
        session.set_inspector_active(false);

        let node = if document.is_element(picked) {
            picked
        } else {
            document.parent(picked)?
        };

        let tag = document.tag_name(node).to_string();
        let locator = LocatorBuilder::new(document).build(&tag, node);
        let record = ElementRecord::new(&tag, locator, session.frame().clone());

        if is_editable(document, node) {
            self.listeners.attach(Listener::Input(node));
            self.listeners.attach(Listener::Blur(node));
            self.editing.insert(node, record.clone());
        }

        Some(InteractionEvent {
            kind: InteractionKind::Click,
            element: record,
            value: None,
            mode: self.mode,
        })
    }

    fn input(&mut self, target: NodeId, value: &str) -> Option<InteractionEvent> {
        if !self.listeners.detach(Listener::Input(target)) {
            return None;
        }
        let element = self.editing.get(&target)?.clone();

        Some(InteractionEvent {
            kind: InteractionKind::Keystroke,
            element,
            value: Some(value.to_string()),
            mode: self.mode,
        })
    }

    fn blur(&mut self, target: NodeId, value: &str) -> Option<InteractionEvent> {
        if !self.listeners.detach(Listener::Blur(target)) {
            return None;
        }
        self.listeners.detach(Listener::Input(target));
        let element = self.editing.shift_remove(&target)?;

        Some(InteractionEvent {
            kind: InteractionKind::Input,
            element,
            value: Some(value.to_string()),
            mode: self.mode,
        })
    }
}

/// Text inputs, textareas and content-editable elements
pub fn is_editable(document: &DomTree, node: NodeId) -> bool {
    let editable_attribute = document
        .attribute(node, "contenteditable")
        .is_some_and(|value| !value.eq_ignore_ascii_case("false"));

    match document.tag_name(node) {
        "textarea" => true,
        "input" => {
            let input_type = document
                .attribute(node, "type")
                .unwrap_or("text")
                .to_ascii_lowercase();
            TEXT_INPUT_TYPES.contains(&input_type.as_str())
        }
        _ => editable_attribute,
    }
}
