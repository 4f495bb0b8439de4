//! Shared error type across imgprobe crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed config.
    BadRequest,
    /// Requested image does not exist.
    NotFound,
    /// The processing collaborator or the report formatting failed.
    ProcessingFailed,
    /// The processing collaborator did not finish in time.
    Timeout,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and tests.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::ProcessingFailed => "PROCESSING_FAILED",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status code the transport layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => 400,
            ClientCode::NotFound => 404,
            ClientCode::ProcessingFailed | ClientCode::Internal => 500,
            ClientCode::Timeout => 504,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ImgProbeError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum ImgProbeError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("image not found at {0}")]
    NotFound(String),
    #[error("processing failed: {0}")]
    Processing(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ImgProbeError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ImgProbeError::BadRequest(_) => ClientCode::BadRequest,
            ImgProbeError::NotFound(_) => ClientCode::NotFound,
            ImgProbeError::Processing(_) => ClientCode::ProcessingFailed,
            ImgProbeError::Timeout(_) => ClientCode::Timeout,
            ImgProbeError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            ImgProbeError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Plain-text body returned to HTTP clients.
    ///
    /// Everything except `NotFound` is reported as a processing error so
    /// callers only ever see two message shapes.
    pub fn client_message(&self) -> String {
        match self {
            ImgProbeError::NotFound(path) => format!("Error: Image not found at {path}"),
            ImgProbeError::Processing(details) | ImgProbeError::Internal(details) => {
                format!("Error processing image: {details}")
            }
            ImgProbeError::Timeout(ms) => {
                format!("Error processing image: timed out after {ms} ms")
            }
            ImgProbeError::BadRequest(_) | ImgProbeError::UnsupportedVersion => {
                format!("Error processing image: {self}")
            }
        }
    }
}
