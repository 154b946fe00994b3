use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::config::ScanConfig;
use crate::dom::ElementNode;
use crate::error::{Result, ScanError};
use crate::frame::Page;
use crate::scan::{ElementRecord, Storage};
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Tab};
use log::{info, warn};
use std::{ffi::OsStr, sync::Arc, time::Duration};

const SNAPSHOT_JS: &str = include_str!("snapshot.js");
const HIGHLIGHT_JS: &str = include_str!("highlight.js");

/// How a highlight expression is resolved in the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorKind {
    Xpath,
    Css,
}

impl LocatorKind {
    fn as_str(self) -> &'static str {
        match self {
            LocatorKind::Xpath => "xpath",
            LocatorKind::Css => "css",
        }
    }
}

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));

        // Keep the session alive while the host takes its time between scans
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.sandbox = options.sandbox;

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        let browser =
            Browser::new(launch_opts).map_err(|e| ScanError::LaunchFailed(e.to_string()))?;

        browser
            .new_tab()
            .map_err(|e| ScanError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let timeout = Duration::from_millis(options.timeout);
        let browser = Browser::connect_with_timeout(options.ws_url, timeout)
            .map_err(|e| ScanError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| ScanError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// The most recently opened tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_tabs()?
            .last()
            .cloned()
            .ok_or_else(|| ScanError::TabOperationFailed("No tab open".to_string()))
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate to a URL in the most recently opened tab
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab()?
            .navigate_to(url)
            .map_err(|e| {
                ScanError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e))
            })?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| ScanError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Capture the live document, including same-origin iframe documents
    pub fn snapshot(&self) -> Result<ElementNode> {
        let result = self
            .tab()?
            .evaluate(SNAPSHOT_JS, false)
            .map_err(|e| {
                ScanError::SnapshotFailed(format!("Failed to evaluate snapshot script: {}", e))
            })?;

        let json = result
            .value
            .as_ref()
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                ScanError::SnapshotFailed("Snapshot script returned no value".to_string())
            })?;

        let mut root: ElementNode = serde_json::from_str(json)
            .map_err(|e| ScanError::SnapshotFailed(format!("Failed to parse snapshot: {}", e)))?;
        root.simplify();
        Ok(root)
    }

    /// Snapshot the current tab and load it for scanning
    pub fn scan_page(&self, config: ScanConfig, storage: impl Storage + 'static) -> Result<Page> {
        let page = Page::new(self.snapshot()?, config, storage)?;
        info!("Captured page with {} frames", page.agents().len());
        Ok(page)
    }

    /// PNG of the visible viewport
    pub fn capture_screenshot(&self) -> Result<Vec<u8>> {
        self.tab()?
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| {
                ScanError::TabOperationFailed(format!("Failed to capture screenshot: {}", e))
            })
    }

    /// Draw a temporary box over the element `expression` resolves to, inside the frame
    /// reached by following `frame_path` from the top document.
    ///
    /// Returns `Ok(false)` when the frame or the element cannot be resolved.
    pub fn highlight(
        &self,
        expression: &str,
        kind: LocatorKind,
        frame_path: &[String],
        scroll: bool,
    ) -> Result<bool> {
        let call = format!(
            "{}({}, {}, {}, {})",
            HIGHLIGHT_JS.trim_end(),
            serde_json::to_string(expression)?,
            serde_json::to_string(kind.as_str())?,
            serde_json::to_string(frame_path)?,
            scroll
        );

        let result = self
            .tab()?
            .evaluate(&call, false)
            .map_err(|e| {
                ScanError::HighlightFailed(format!("Failed to evaluate highlight script: {}", e))
            })?;

        let found = result.value.and_then(|value| value.as_bool()).unwrap_or(false);
        if !found {
            warn!("Could not resolve {} '{}' for highlighting", kind.as_str(), expression);
        }
        Ok(found)
    }

    /// Highlight a scanned record, switching into its frame first
    pub fn highlight_record(&self, page: &Page, record: &ElementRecord) -> Result<bool> {
        let Some(frame_path) = page.frame_path_for(record) else {
            warn!("Frame '{}' of {} is not part of this page", record.frame, record.xpath);
            return Ok(false);
        };
        self.highlight(&record.xpath, LocatorKind::Xpath, &frame_path, true)
    }

    /// Close every tab; the browser process exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        for tab in self.get_tabs()? {
            if let Err(e) = tab.close(false) {
                warn!("Failed to close tab {}: {}", tab.get_url(), e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_kind_names() {
        assert_eq!(LocatorKind::Xpath.as_str(), "xpath");
        assert_eq!(LocatorKind::Css.as_str(), "css");
    }

    #[test]
    fn test_scripts_are_expressions() {
        assert!(SNAPSHOT_JS.trim_end().ends_with("})()"));
        assert!(HIGHLIGHT_JS.trim_start().starts_with("(function"));
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(LaunchOptions::new().headless(true));
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_navigate() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true))
            .expect("Failed to launch browser");

        let result = session.navigate("about:blank");
        assert!(result.is_ok());
    }
}
