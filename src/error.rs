//! # Error Types
//!
//! Error handling for the segment codec.
//!
//! Every failure aborts the current read or write immediately and is returned
//! to the direct caller. This layer never retries; retry policy belongs to
//! whoever owns the source or sink.
//!
//! ## Error Categories
//! - **End of input**: a bounded read or write could not be satisfied before the
//!   source was exhausted or the sink signaled completion
//! - **Cancellation**: a cancellation token fired at a suspension point
//! - **Configuration**: an unusable length-prefix format or parameter, detected
//!   before any I/O
//! - **Malformed data**: a variable-length integer that overruns its byte budget
//! - **I/O**: failures reported by the underlying reader or writer
//!
//! ## Example Usage
//! ```rust
//! use segment_codec::error::{CodecError, Result};
//! use segment_codec::utils::length::LengthPrefix;
//!
//! fn parse_format(byte: u8) -> Result<LengthPrefix> {
//!     LengthPrefix::try_from(byte)
//! }
//!
//! match parse_format(42) {
//!     Err(CodecError::InvalidConfiguration(msg)) => println!("rejected: {msg}"),
//!     other => println!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Length-prefix errors
    pub const ERR_NO_LENGTH_PREFIX: &str = "Length prefix format 'None' cannot carry a length";
    pub const ERR_UNKNOWN_LENGTH_PREFIX: &str = "Unrecognized length prefix format";

    /// Digest errors
    pub const ERR_DIGEST_OUTPUT_SIZE: &str = "Digest output region does not match algorithm size";

    /// Sink errors
    pub const ERR_REGION_TOO_SMALL: &str = "Sink returned a region smaller than one encoded character";
}

/// CodecError is the error type for all read and write operations
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("End of input reached before the operation was satisfied")]
    EndOfInput,

    #[error("Operation canceled")]
    Canceled,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Malformed variable-length integer")]
    MalformedVarint,

    #[error("Invalid length: {0}")]
    InvalidLength(i64),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CodecError {
    /// Whether this error came from an observed cancellation
    pub fn is_canceled(&self) -> bool {
        matches!(self, CodecError::Canceled)
    }

    /// Whether this error means the source or sink finished early
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, CodecError::EndOfInput)
    }
}

/// Type alias for Results using CodecError
pub type Result<T> = std::result::Result<T, CodecError>;
