//! Errors raised while decoding host input.
//!
//! The search itself never fails: it either returns a collision or stops on
//! cancellation. Only malformed chaining values and blocks end up here.

pub type Result<T> = std::result::Result<T, ColliderError>;

/// Error types for input decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColliderError {
    /// Chaining value was not 16 bytes (carries the actual length)
    InvalidChainingValueLength(usize),
    /// Text contained a non-hex character or an odd number of digits
    InvalidHex(String),
    /// Message block was not 64 bytes (carries the actual length)
    InvalidBlockLength(usize),
}

impl std::fmt::Display for ColliderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColliderError::InvalidChainingValueLength(len) => {
                write!(f, "Chaining value must be 16 bytes, got {}", len)
            }
            ColliderError::InvalidHex(text) => write!(f, "Invalid hex string: {:?}", text),
            ColliderError::InvalidBlockLength(len) => {
                write!(f, "Message block must be 64 bytes, got {}", len)
            }
        }
    }
}

impl std::error::Error for ColliderError {}
