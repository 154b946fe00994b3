use crate::scan::ElementRecord;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::info;
use serde::{Deserialize, Serialize};

/// What a recorded step did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    #[serde(rename = "open browser")]
    OpenBrowser,
    #[serde(rename = "url log")]
    UrlLog,
    #[serde(rename = "click")]
    Click,
    #[serde(rename = "input")]
    Input,
    #[serde(rename = "send_key")]
    SendKey,
    #[serde(rename = "screenshot")]
    Screenshot,
}

/// One user action captured in recorder mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedStep {
    pub event: StepKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// 1-based position in the recording
    #[serde(default)]
    pub order: usize,

    /// Base64 PNG of the page when the step was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl RecordedStep {
    pub fn new(event: StepKind) -> Self {
        Self {
            event,
            element: None,
            value: None,
            order: 0,
            screenshot: None,
        }
    }

    pub fn with_element(mut self, element: ElementRecord) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Same action, ignoring position and screenshot
    pub fn same_action(&self, other: &RecordedStep) -> bool {
        self.event == other.event && self.element == other.element && self.value == other.value
    }

    fn describe(&self) -> String {
        let value = self.value.as_deref().unwrap_or_default();
        match self.event {
            StepKind::OpenBrowser => format!("Opened browser {} - step {}", value, self.order),
            StepKind::UrlLog => format!("Loaded {} - step {}", value, self.order),
            StepKind::Click => format!("Clicked - step {}", self.order),
            StepKind::Input => format!("Typed {} - step {}", value, self.order),
            StepKind::SendKey => format!("Pressed {} - step {}", value, self.order),
            StepKind::Screenshot => format!("Took screenshot - step {}", self.order),
        }
    }
}

/// Ordered list of recorded steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordedSteps {
    steps: Vec<RecordedStep>,
}

impl RecordedSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step unless it repeats the last one; returns whether it was added
    pub fn record(&mut self, mut step: RecordedStep, screenshot_png: Option<&[u8]>) -> bool {
        if self.steps.last().is_some_and(|last| last.same_action(&step)) {
            return false;
        }

        step.screenshot = screenshot_png.map(|png| STANDARD.encode(png));
        step.order = self.steps.len() + 1;
        info!("{}", step.describe());
        self.steps.push(step);
        true
    }

    /// Remove the step at a 0-based index and renumber the rest
    pub fn delete(&mut self, index: usize) -> Option<RecordedStep> {
        if index >= self.steps.len() {
            return None;
        }
        let removed = self.steps.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Move a step to another 0-based position
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.steps.len() || to >= self.steps.len() {
            return false;
        }
        let step = self.steps.remove(from);
        self.steps.insert(to, step);
        self.renumber();
        true
    }

    /// Replace the whole list, e.g. after the host reordered it
    pub fn replace(&mut self, steps: Vec<RecordedStep>) {
        self.steps = steps;
        self.renumber();
    }

    pub fn reset(&mut self) {
        self.steps.clear();
    }

    pub fn steps(&self) -> &[RecordedStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn renumber(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.order = i + 1;
        }
    }
}
