//! Error types for FeedForge.
//!
//! Library crates use [`FeedForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Every variant maps onto a small closed set of [`ErrorCode`]s. Orchestrating
//! layers never swallow a lower-level failure: they re-wrap it under their own
//! code, keeping the original as `cause` and, when it was itself coded, its
//! code as `original_code`.

use std::fmt;
use std::path::PathBuf;

/// Closed set of machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ApiKeyMissing,
    InitializationFailed,
    ConfigError,
    NetworkError,
    ProviderError,
    EmbeddingFailed,
    DecompositionFailed,
    BoundaryDetectionFailed,
    SegmentationFailed,
    ValidationError,
    BuildFailed,
    NoChapters,
    NoTextChunks,
    InvalidConcepts,
    IoError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKeyMissing => "API_KEY_MISSING",
            Self::InitializationFailed => "INITIALIZATION_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::EmbeddingFailed => "EMBEDDING_FAILED",
            Self::DecompositionFailed => "DECOMPOSITION_FAILED",
            Self::BoundaryDetectionFailed => "BOUNDARY_DETECTION_FAILED",
            Self::SegmentationFailed => "SEGMENTATION_FAILED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BuildFailed => "BUILD_FAILED",
            Self::NoChapters => "NO_CHAPTERS",
            Self::NoTextChunks => "NO_TEXT_CHUNKS",
            Self::InvalidConcepts => "INVALID_CONCEPTS",
            Self::IoError => "IO_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for all FeedForge operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedForgeError {
    /// A provider API key is not configured. Construction-time only.
    #[error("API key missing: {message}")]
    ApiKeyMissing { message: String },

    /// A component could not be constructed from its configuration.
    #[error("initialization failed: {message}")]
    Initialization { message: String },

    /// Configuration loading or parsing error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP failure talking to a provider.
    #[error("network error: {0}")]
    Network(String),

    /// A provider answered, but with an error status or unusable body.
    #[error("provider error: {0}")]
    Provider(String),

    /// Obtaining embedding vectors failed.
    #[error("embedding failed: {message}")]
    Embedding {
        message: String,
        original_code: Option<ErrorCode>,
        #[source]
        cause: Option<Box<FeedForgeError>>,
    },

    /// Turning prose into propositions failed.
    #[error("decomposition failed: {message}")]
    Decomposition {
        message: String,
        original_code: Option<ErrorCode>,
        #[source]
        cause: Option<Box<FeedForgeError>>,
    },

    /// Topic-shift detection failed.
    #[error("boundary detection failed: {message}")]
    BoundaryDetection {
        message: String,
        original_code: Option<ErrorCode>,
        #[source]
        cause: Option<Box<FeedForgeError>>,
    },

    /// Video segmentation failed.
    #[error("segmentation failed: {message}")]
    Segmentation {
        message: String,
        original_code: Option<ErrorCode>,
        #[source]
        cause: Option<Box<FeedForgeError>>,
    },

    /// Malformed input (mismatched vectors, non-array LLM response, ...).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Feed assembly could not produce a feed from degenerate input.
    #[error("feed build failed ({code}): {message}")]
    FeedBuild {
        code: ErrorCode,
        message: String,
        #[source]
        cause: Option<Box<FeedForgeError>>,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FeedForgeError>;

impl FeedForgeError {
    /// Create an API-key-missing error.
    pub fn api_key_missing(msg: impl Into<String>) -> Self {
        Self::ApiKeyMissing {
            message: msg.into(),
        }
    }

    /// Create an initialization error.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a feed-build error without an underlying cause.
    pub fn feed_build(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::FeedBuild {
            code,
            message: msg.into(),
            cause: None,
        }
    }

    /// Wrap a failure as `EMBEDDING_FAILED`.
    pub fn embedding_failed(cause: FeedForgeError) -> Self {
        Self::wrap(ErrorCode::EmbeddingFailed, cause)
    }

    /// Wrap a failure as `DECOMPOSITION_FAILED`.
    pub fn decomposition_failed(cause: FeedForgeError) -> Self {
        Self::wrap(ErrorCode::DecompositionFailed, cause)
    }

    /// Wrap a failure as `BOUNDARY_DETECTION_FAILED`.
    pub fn boundary_detection_failed(cause: FeedForgeError) -> Self {
        Self::wrap(ErrorCode::BoundaryDetectionFailed, cause)
    }

    /// Wrap a failure as `SEGMENTATION_FAILED`.
    pub fn segmentation_failed(cause: FeedForgeError) -> Self {
        Self::wrap(ErrorCode::SegmentationFailed, cause)
    }

    /// Wrap a failure as `BUILD_FAILED`.
    pub fn build_failed(cause: FeedForgeError) -> Self {
        Self::wrap(ErrorCode::BuildFailed, cause)
    }

    /// The machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ApiKeyMissing { .. } => ErrorCode::ApiKeyMissing,
            Self::Initialization { .. } => ErrorCode::InitializationFailed,
            Self::Config { .. } => ErrorCode::ConfigError,
            Self::Network(_) => ErrorCode::NetworkError,
            Self::Provider(_) => ErrorCode::ProviderError,
            Self::Embedding { .. } => ErrorCode::EmbeddingFailed,
            Self::Decomposition { .. } => ErrorCode::DecompositionFailed,
            Self::BoundaryDetection { .. } => ErrorCode::BoundaryDetectionFailed,
            Self::Segmentation { .. } => ErrorCode::SegmentationFailed,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::FeedBuild { code, .. } => *code,
            Self::Io { .. } => ErrorCode::IoError,
        }
    }

    /// Code of the wrapped lower-level error, if this error wraps a coded one.
    pub fn original_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Embedding { original_code, .. }
            | Self::Decomposition { original_code, .. }
            | Self::BoundaryDetection { original_code, .. }
            | Self::Segmentation { original_code, .. } => *original_code,
            Self::FeedBuild { cause, .. } => cause.as_ref().and_then(|c| c.coded()),
            _ => None,
        }
    }

    /// The wrapped lower-level error, if any.
    pub fn cause(&self) -> Option<&FeedForgeError> {
        match self {
            Self::Embedding { cause, .. }
            | Self::Decomposition { cause, .. }
            | Self::BoundaryDetection { cause, .. }
            | Self::Segmentation { cause, .. }
            | Self::FeedBuild { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    /// Generic provider-side failures carry no pipeline code of their own.
    fn is_generic(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Provider(_) | Self::Io { .. })
    }

    fn coded(&self) -> Option<ErrorCode> {
        (!self.is_generic()).then(|| self.code())
    }

    /// Re-wrap `cause` under `code`.
    ///
    /// Errors already carrying `code` pass through untouched. Coded errors keep
    /// their code as `original_code`; generic ones are coerced, with their
    /// message interpolated into the new one.
    fn wrap(code: ErrorCode, cause: FeedForgeError) -> Self {
        if cause.code() == code {
            return cause;
        }

        let message = if cause.is_generic() {
            format!("{} ({cause})", generic_prefix(code))
        } else {
            cause.to_string()
        };
        let original_code = cause.coded();
        let cause = Some(Box::new(cause));

        match code {
            ErrorCode::EmbeddingFailed => Self::Embedding {
                message,
                original_code,
                cause,
            },
            ErrorCode::DecompositionFailed => Self::Decomposition {
                message,
                original_code,
                cause,
            },
            ErrorCode::BoundaryDetectionFailed => Self::BoundaryDetection {
                message,
                original_code,
                cause,
            },
            ErrorCode::SegmentationFailed => Self::Segmentation {
                message,
                original_code,
                cause,
            },
            other => Self::FeedBuild {
                code: other,
                message,
                cause,
            },
        }
    }
}

fn generic_prefix(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::EmbeddingFailed => "failed to generate embeddings",
        ErrorCode::DecompositionFailed => "failed to decompose text into propositions",
        ErrorCode::BoundaryDetectionFailed => "failed to detect topic boundaries",
        ErrorCode::SegmentationFailed => "failed to segment transcript",
        _ => "failed to build feed",
    }
}
