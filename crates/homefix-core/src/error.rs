//! Error types for homefix-core
//!
//! Every failure crosses the entrypoint boundary as one of these variants,
//! never as partially populated success data.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Caller mistake (missing description, bad metadata shape)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upload content type outside the whitelist
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Upload exceeds the per-file ceiling
    #[error("payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Actual size in bytes
        size: usize,
        /// Configured ceiling in bytes
        limit: usize,
    },

    /// More files than allowed in one request
    #[error("too many files: {count} uploaded, at most {max} allowed")]
    TooManyFiles {
        /// Files received
        count: usize,
        /// Files allowed
        max: usize,
    },

    /// Model output contained no locatable JSON object
    #[error("malformed model output: {0}")]
    MalformedModelOutput(String),

    /// Upstream generation call failed (transport, auth, quota, timeout)
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(#[from] homefix_llm::Error),

    /// Internal error (worker panic)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Get a stable error code for API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::TooManyFiles { .. } => "too_many_files",
            Self::MalformedModelOutput(_) => "malformed_model_output",
            Self::GenerationUnavailable(_) => "generation_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the caller can fix the problem by changing the request
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::UnsupportedMediaType(_)
                | Self::PayloadTooLarge { .. }
                | Self::TooManyFiles { .. }
        )
    }

    /// Message safe to show to an end user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::UnsupportedMediaType(_) => {
                "Unsupported photo format. Please upload JPEG, PNG, WEBP or HEIC images."
                    .to_string()
            }
            Self::PayloadTooLarge { limit, .. } => format!(
                "Photo is too large. Each photo must be under {} MB.",
                limit / (1024 * 1024)
            ),
            Self::TooManyFiles { max, .. } => {
                format!("Too many photos. Please upload at most {}.", max)
            }
            Self::MalformedModelOutput(_) => {
                "We couldn't read the diagnosis. Please try again.".to_string()
            }
            Self::GenerationUnavailable(_) | Self::Internal(_) => {
                "The diagnosis service is temporarily unavailable. Please try again.".to_string()
            }
        }
    }
}
