pub mod gemini;
pub(crate) mod http_errors;

use thiserror::Error;

/// A failed call to a model provider.
///
/// `status` carries the upstream HTTP status when the provider answered;
/// transport failures leave it empty.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.status == Some(503)
    }
}
