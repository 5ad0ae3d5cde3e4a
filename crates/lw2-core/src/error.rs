//! Error types for LW2

use thiserror::Error;

/// Result type alias for LW2 operations
pub type Result<T> = std::result::Result<T, Error>;

/// LW2 error types
///
/// Protocol chatter never produces an error; unknown or malformed lines are
/// classified as [`Response::Unrecognized`](crate::Response::Unrecognized).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Host is not an IP literal
    #[error("invalid host: {0:?} is not an IP address")]
    InvalidHost(String),

    /// Configured input count outside the accepted range
    #[error("input count {0} out of range (max {max})", max = crate::MAX_INPUT_COUNT)]
    InputCountOutOfRange(u32),

    /// No host configured
    #[error("no device host configured")]
    NotConfigured,
}
