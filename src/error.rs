use thiserror::Error;

/// Errors produced while scanning, evaluating locators, or talking to the browser
#[derive(Debug, Error)]
pub enum ScanError {
    /// The expression is outside the supported XPath subset or malformed
    #[error("Invalid XPath '{expression}': {reason}")]
    InvalidXPath { expression: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Page snapshot failed: {0}")]
    SnapshotFailed(String),

    #[error("Highlight failed: {0}")]
    HighlightFailed(String),
}

impl ScanError {
    pub fn invalid_xpath(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        ScanError::InvalidXPath {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_xpath_message() {
        let err = ScanError::invalid_xpath("//a[", "unterminated predicate");
        assert_eq!(err.to_string(), "Invalid XPath '//a[': unterminated predicate");
    }

    #[test]
    fn test_from_serde_error() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ScanError = parse.unwrap_err().into();
        assert!(matches!(err, ScanError::Serialization(_)));
    }
}
