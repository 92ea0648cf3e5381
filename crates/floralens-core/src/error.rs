//! Error types for floralens

/// Result type alias using floralens' Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for floralens operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote artifact could not be fetched or written to the cache
    #[error("failed to download artifact '{artifact}': {reason}")]
    Download { artifact: String, reason: String },

    /// Artifacts are present but the model could not be constructed
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Image could not be decoded or preprocessed
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new download error for the given artifact
    pub fn download(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Download {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new invalid image error
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable category name, used by HTTP callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Download { .. } => "download",
            Self::ModelLoad(_) => "model_load",
            Self::InvalidImage(_) => "invalid_image",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}
