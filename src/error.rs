//! Domain-specific error types for curious-mind

use thiserror::Error;

/// Main error type for the curious-mind question engine
#[derive(Error, Debug)]
pub enum CuriousMindError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unsafe input rejected: {}", issues.join(", "))]
    UnsafeInput { issues: Vec<String> },

    #[error("Provider error {status}: {message} (retryable)")]
    ProviderTransient { status: u16, message: String },

    #[error("Provider error: {message}")]
    ProviderFatal {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed provider response: {message}")]
    MalformedResponse { message: String },

    #[error("Failed to generate a valid result after {attempts} attempts: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: String },

    #[error("Invalid image payload: {message}")]
    ImageFormat { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CuriousMindError {
    /// Rate-limit and 5xx-class provider failures are worth another attempt;
    /// everything else surfaces immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CuriousMindError::ProviderTransient { .. })
    }
}

impl From<anyhow::Error> for CuriousMindError {
    fn from(err: anyhow::Error) -> Self {
        CuriousMindError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CuriousMindError {
    fn from(err: serde_json::Error) -> Self {
        CuriousMindError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CuriousMindError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        match status {
            Some(code) if is_transient_status(code) => CuriousMindError::ProviderTransient {
                status: code,
                message: format!("HTTP request failed: {}", err),
            },
            _ => CuriousMindError::ProviderFatal {
                status,
                message: format!("HTTP request failed: {}", err),
            },
        }
    }
}

/// Status codes the completion client treats as transient (408/429/5xx class).
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for curious-mind operations
pub type Result<T> = std::result::Result<T, CuriousMindError>;
