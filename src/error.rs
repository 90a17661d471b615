//! Error types for thumbnail generation

use thiserror::Error;

/// Result type alias for thumbnail operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or persisting a thumbnail
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or empty asset path, or out-of-range options
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The asset extension is not one we know how to render
    #[error("Unsupported asset: {0}")]
    UnsupportedAsset(String),

    /// The browser path failed (evaluation threw, capture returned null, ...)
    #[error("Rendering failed: {0}")]
    Render(String),

    /// A static image could not be decoded or encoded
    #[error("Image decode failed: {0}")]
    Decode(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "cdp")]
    #[test]
    fn protocol_errors_become_cdp_errors() {
        let err: Error = anyhow::anyhow!("websocket closed").into();
        assert!(matches!(err, Error::CdpError(ref msg) if msg == "websocket closed"));
        assert_eq!(err.to_string(), "CDP error: websocket closed");
    }

    #[test]
    fn timeout_message() {
        assert_eq!(Error::Timeout(250).to_string(), "Operation timed out after 250ms");
    }
}
