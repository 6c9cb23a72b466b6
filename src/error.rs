//! Error types for Magic Shutter
//!
//! None of these are allowed to escape to the user as a crash. Each
//! boundary converts its error into a view state, a fallback value,
//! or a log line.

use thiserror::Error;

use crate::state::flow::ViewState;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Errors while turning a user-selected file into a secret image
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImageError {
    #[error("Image is empty")]
    Empty,

    #[error("Failed to read image: {0}")]
    Read(String),
}

/// Camera acquisition errors
///
/// All of these are reported as "no access" to the camera view.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No camera device available")]
    NoDevice,

    #[error("Camera device error: {0}")]
    Device(String),
}

/// Captioning service errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Captioning service credentials are missing")]
    MissingCredentials,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Service returned HTTP {0}: {1}")]
    Status(u16, String),

    #[error("Service returned an empty response")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Rejected view controller events
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransitionError {
    #[error("Event '{event}' is not allowed in {from:?}")]
    NotAllowed { from: ViewState, event: &'static str },

    #[error("Cannot confirm setup without an image")]
    EmptyImage,
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => CaptureError::PermissionDenied,
            std::io::ErrorKind::NotFound => CaptureError::NoDevice,
            _ => CaptureError::Device(err.to_string()),
        }
    }
}
