//! Error types for the procgate gateway.
//!
//! Every failure a request handler can see falls in one of three buckets:
//! the identifier resolved to nothing (`ProcessNotFound`), the caller sent
//! something the manager cannot act on (`Validation`), or an external call
//! failed (`Transport`). The HTTP layer maps these onto 404/400/500.

use thiserror::Error;

/// Result type alias for procgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gateway operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller-supplied identifier matched no managed process.
    #[error("Process not found: {token}")]
    ProcessNotFound { token: String },

    /// Malformed or insufficient input.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        /// Manager-supplied detail, when available.
        details: Option<String>,
    },

    /// A process-manager RPC or subprocess invocation failed.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        /// Captured standard-error text, when available.
        stderr: Option<String>,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a ProcessNotFound error.
    pub fn not_found(token: impl Into<String>) -> Self {
        Self::ProcessNotFound {
            token: token.into(),
        }
    }

    /// Creates a Validation error without manager detail.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Creates a Validation error carrying manager-supplied detail.
    pub fn validation_with_details(
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a Transport error without captured stderr.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            stderr: None,
        }
    }

    /// Creates a Transport error carrying captured stderr.
    pub fn transport_with_stderr(
        message: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        let stderr = stderr.into();
        let stderr = if stderr.trim().is_empty() {
            None
        } else {
            Some(stderr.trim().to_string())
        };
        Self::Transport {
            message: message.into(),
            stderr,
        }
    }

    /// The text a caller should see for this error.
    ///
    /// For transport failures the captured stderr is preferred over the
    /// generic message, since the subprocess usually says what actually
    /// went wrong.
    pub fn display_detail(&self) -> String {
        if let Self::Transport {
            stderr: Some(stderr),
            ..
        } = self
        {
            if !stderr.is_empty() {
                return stderr.clone();
            }
        }
        match self {
            Self::ProcessNotFound { token } => format!("Process not found: {}", token),
            Self::Validation { message, .. } | Self::Transport { message, .. } => message.clone(),
            Self::Configuration(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
        }
    }
}
