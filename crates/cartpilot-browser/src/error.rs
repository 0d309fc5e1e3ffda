//! Error types for the cartpilot-browser crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while driving a page over the DevTools protocol.
#[derive(Debug, Error)]
pub enum PageError {
    /// Failed to establish the WebSocket connection to the page target.
    #[error("failed to connect to DevTools target {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// A DevTools command returned an error response.
    #[error("DevTools command '{method}' failed with code {code}: {message}")]
    Command {
        method: String,
        code: i64,
        message: String,
    },

    /// A DevTools command timed out waiting for its response.
    #[error("DevTools command '{method}' timed out after {duration:?}")]
    CommandTimeout { method: String, duration: Duration },

    /// A protocol-level error (serialization, unexpected message format,
    /// connection dropped mid-command).
    #[error("DevTools protocol error: {detail}")]
    Protocol { detail: String },

    /// JavaScript evaluation threw in page context.
    #[error("page JavaScript threw: {message}")]
    JsException { message: String },

    /// Navigation was rejected by the browser (e.g. unresolvable host).
    #[error("navigation failed: {reason}")]
    NavigationFailed { reason: String },

    /// A localStorage value exceeded the configured size limit.
    #[error("storage value too large: {size} bytes, limit is {limit}")]
    StorageValueTooLarge { size: usize, limit: usize },
}
