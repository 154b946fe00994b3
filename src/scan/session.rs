use crate::audit::InfractionRecord;
use crate::scan::record::{ElementRecord, FrameLocator};

/// State owned by one frame across scans: its identity, the list built by the current
/// scan, and whether the inspector is attached
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    frame: FrameLocator,
    elements: Vec<ElementRecord>,
    iframes: Vec<ElementRecord>,
    infractions: Vec<InfractionRecord>,
    inspector_active: bool,
}

impl ScanSession {
    /// Session for a child frame, identity not yet assigned
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for the top-level document
    pub fn root() -> Self {
        Self {
            frame: FrameLocator::Root,
            ..Self::default()
        }
    }

    pub fn frame(&self) -> &FrameLocator {
        &self.frame
    }

    pub fn set_frame(&mut self, frame: FrameLocator) {
        self.frame = frame;
    }

    /// Drop everything collected by the previous scan
    pub fn begin_scan(&mut self) {
        self.elements.clear();
        self.iframes.clear();
        self.infractions.clear();
    }

    /// Put a record at the front, replacing an existing record for the same element
    pub fn admit(&mut self, record: ElementRecord) {
        self.elements.retain(|existing| !existing.same_element(&record));
        self.elements.insert(0, record);
    }

    /// Admit an iframe record unless one with the same xpath was already admitted
    pub fn admit_iframe(&mut self, record: ElementRecord) -> bool {
        if self.iframes.iter().any(|existing| existing.xpath == record.xpath) {
            return false;
        }
        self.iframes.push(record.clone());
        self.admit(record);
        true
    }

    /// Records admitted by the current scan, most recent first
    pub fn elements(&self) -> &[ElementRecord] {
        &self.elements
    }

    pub fn iframes(&self) -> &[ElementRecord] {
        &self.iframes
    }

    pub fn set_infractions(&mut self, infractions: Vec<InfractionRecord>) {
        self.infractions = infractions;
    }

    pub fn infractions(&self) -> &[InfractionRecord] {
        &self.infractions
    }

    pub fn inspector_active(&self) -> bool {
        self.inspector_active
    }

    pub fn set_inspector_active(&mut self, active: bool) {
        self.inspector_active = active;
    }
}
