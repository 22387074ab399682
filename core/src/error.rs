//! Validation errors raised by the model.
//!
//! These are the "invalid argument" conditions: the call is rejected and no
//! model state is touched. I/O problems are not represented here; they travel
//! as `std::io::Error` or `anyhow::Error`.

/// Errors returned when a caller hands the model something it cannot use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A Prefix Index key was the empty string.
    EmptyKey,
    /// A token inside a sequence or a token/tag pair was empty.
    EmptyToken,
    /// A tag inside a sequence or a token/tag pair was empty.
    EmptyTag,
    /// Token and tag sequences of a phrase differ in length.
    LengthMismatch { tokens: usize, tags: usize },
    /// A sequence is shorter than the model needs to score it.
    PhraseTooShort { len: usize, min: usize },
    /// A scoring window does not have exactly the model order.
    WindowLength { expected: usize, got: usize },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::EmptyKey => write!(f, "empty key"),
            ModelError::EmptyToken => write!(f, "empty token"),
            ModelError::EmptyTag => write!(f, "empty tag"),
            ModelError::LengthMismatch { tokens, tags } => {
                write!(f, "{} tokens but {} tags", tokens, tags)
            }
            ModelError::PhraseTooShort { len, min } => {
                write!(f, "sequence of length {} is shorter than {}", len, min)
            }
            ModelError::WindowLength { expected, got } => {
                write!(f, "window of length {} (expected {})", got, expected)
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// Result alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
