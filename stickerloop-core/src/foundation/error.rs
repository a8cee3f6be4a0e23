/// Convenience result type used across stickerloop.
pub type StickerResult<T> = Result<T, StickerError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum StickerError {
    /// Invalid caller-provided options or input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A frame has no foreground pixels left after background removal.
    #[error("empty frame: '{key}' has no foreground pixels")]
    EmptyFrame {
        /// Filename key of the offending frame.
        key: String,
    },

    /// Sprite-sheet grid detection could not settle on a consistent partition.
    #[error("ambiguous grid: {0}")]
    AmbiguousGrid(String),

    /// An explicit per-frame duration list does not match the frame count.
    #[error("timing mismatch: {got} durations for {expected} frames")]
    TimingMismatch {
        /// Number of frames being assembled.
        expected: usize,
        /// Number of durations supplied.
        got: usize,
    },

    /// Auto-resize exhausted its attempts while still over the size budget.
    #[error("size budget exceeded: {size} bytes after {attempts} resize attempts (budget {budget})")]
    SizeBudget {
        /// Final encoded size in bytes.
        size: u64,
        /// Budget in bytes (exclusive upper bound).
        budget: u64,
        /// Number of resize attempts performed.
        attempts: u32,
    },

    /// Errors while encoding or decoding the animated artifact.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when deserializing anchor or animation spec JSON.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StickerError {
    /// Build a [`StickerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StickerError::EmptyFrame`] value.
    pub fn empty_frame(key: impl Into<String>) -> Self {
        Self::EmptyFrame { key: key.into() }
    }

    /// Build a [`StickerError::AmbiguousGrid`] value.
    pub fn ambiguous_grid(msg: impl Into<String>) -> Self {
        Self::AmbiguousGrid(msg.into())
    }

    /// Build a [`StickerError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`StickerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<png::EncodingError> for StickerError {
    fn from(value: png::EncodingError) -> Self {
        Self::Encode(value.to_string())
    }
}

impl From<image::ImageError> for StickerError {
    fn from(value: image::ImageError) -> Self {
        Self::Other(anyhow::Error::new(value))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
