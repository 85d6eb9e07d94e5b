//! Error type for render target construction

use core::fmt;

/// Render target error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    /// Width or height is zero
    EmptyDimensions,
    /// Smaller than one block
    TooSmall { width: usize, height: usize },
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDimensions => write!(f, "render target has zero width or height"),
            Self::TooSmall { width, height } => {
                write!(f, "render target {}x{} is smaller than one block", width, height)
            }
        }
    }
}

impl core::error::Error for TargetError {}

/// Result type for render target operations
pub type TargetResult<T> = Result<T, TargetError>;
