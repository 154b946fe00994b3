//! Outbound calls to the host application
//!
//! The scanner never waits on the host: every request is a fire-and-forget [`HostCall`]
//! handed to a [`HostBridge`]. Calls serialize as `{"function": ..., "args": ...}`.

use crate::catalog::RecordedStep;
use crate::inspector::InteractionEvent;
use crate::scan::ElementRecord;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One request to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", content = "args")]
pub enum HostCall {
    #[serde(rename = "open_browser")]
    OpenBrowser { browser: String },

    #[serde(rename = "scan")]
    Scan,

    #[serde(rename = "execute_monkey_test")]
    MonkeyTest,

    #[serde(rename = "save_to_file")]
    SaveElements { elements: Vec<ElementRecord> },

    #[serde(rename = "execute_highlight")]
    HighlightElements { elements: Vec<ElementRecord> },

    #[serde(rename = "open_config")]
    OpenConfig,

    #[serde(rename = "describe_element")]
    DescribeElement(InteractionEvent),

    #[serde(rename = "update_element")]
    UpdateElement { name: String, xpath: String },

    #[serde(rename = "generate_output")]
    GenerateOutput { format: String },

    #[serde(rename = "capture_screen")]
    CaptureScreenshot,

    #[serde(rename = "reset_recorder_steps")]
    ResetSteps,

    #[serde(rename = "delete_step_card")]
    DeleteStep { index: usize },

    #[serde(rename = "reorder_cards")]
    ReorderSteps { steps: Vec<RecordedStep> },

    #[serde(rename = "record_step")]
    RecordStep(RecordedStep),
}

impl HostCall {
    /// Wire name of the function being called
    pub fn function(&self) -> &'static str {
        match self {
            HostCall::OpenBrowser { .. } => "open_browser",
            HostCall::Scan => "scan",
            HostCall::MonkeyTest => "execute_monkey_test",
            HostCall::SaveElements { .. } => "save_to_file",
            HostCall::HighlightElements { .. } => "execute_highlight",
            HostCall::OpenConfig => "open_config",
            HostCall::DescribeElement(_) => "describe_element",
            HostCall::UpdateElement { .. } => "update_element",
            HostCall::GenerateOutput { .. } => "generate_output",
            HostCall::CaptureScreenshot => "capture_screen",
            HostCall::ResetSteps => "reset_recorder_steps",
            HostCall::DeleteStep { .. } => "delete_step_card",
            HostCall::ReorderSteps { .. } => "reorder_cards",
            HostCall::RecordStep(_) => "record_step",
        }
    }
}

/// Fire-and-forget channel to the host
pub trait HostBridge {
    fn call(&self, call: HostCall);
}

/// Bridge that keeps every call, for driving the scanner without a host
#[derive(Debug, Default)]
pub struct RecordingBridge {
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, oldest first
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl HostBridge for RecordingBridge {
    fn call(&self, call: HostCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

/// Bridge that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBridge;

impl HostBridge for LogBridge {
    fn call(&self, call: HostCall) {
        match serde_json::to_string(&call) {
            Ok(json) => info!("Host call {}", json),
            Err(_) => info!("Host call {}", call.function()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let call = HostCall::UpdateElement {
            name: "input_1234567890".to_string(),
            xpath: "//input[@id=\"q\"]".to_string(),
        };
        let value = serde_json::to_value(&call).unwrap();

        assert_eq!(
            value,
            json!({
                "function": "update_element",
                "args": {"name": "input_1234567890", "xpath": "//input[@id=\"q\"]"}
            })
        );
        assert_eq!(call.function(), "update_element");
    }

    #[test]
    fn test_unit_variant_wire_format() {
        let value = serde_json::to_value(HostCall::Scan).unwrap();
        assert_eq!(value, json!({"function": "scan"}));

        let call = json!({"function": "delete_step_card", "args": {"index": 2}});
        let back: HostCall = serde_json::from_value(call).unwrap();
        assert_eq!(back, HostCall::DeleteStep { index: 2 });
    }

    #[test]
    fn test_recording_bridge() {
        let bridge = RecordingBridge::new();
        bridge.call(HostCall::CaptureScreenshot);
        bridge.call(HostCall::ResetSteps);

        let functions: Vec<&str> = bridge.calls().iter().map(HostCall::function).collect();
        assert_eq!(functions, vec!["capture_screen", "reset_recorder_steps"]);
    }
}
