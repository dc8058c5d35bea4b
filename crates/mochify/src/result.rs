//! Result and error types for Mochify.

use thiserror::Error;

/// Result type for Mochify operations
pub type MochifyResult<T> = Result<T, MochifyError>;

/// Errors that can occur in Mochify
#[derive(Debug, Error)]
pub enum MochifyError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Script evaluation in the page failed
    #[error("Script evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// Source map could not be decoded
    #[error("Invalid source map: {message}")]
    SourceMapError {
        /// Error message
        message: String,
    },

    /// The page returned something that is not a valid event batch
    #[error("Malformed event batch: {message}")]
    ProtocolError {
        /// Error message
        message: String,
    },

    /// Driver was used after `end()`
    #[error("Driver has already been shut down")]
    DriverClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MochifyError {
    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::EvaluationError {
            message: message.into(),
        }
    }

    /// Create a source map error
    #[must_use]
    pub fn source_map(message: impl Into<String>) -> Self {
        Self::SourceMapError {
            message: message.into(),
        }
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }
}
