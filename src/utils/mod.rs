//! # Utility Modules
//!
//! Pure helpers and ambient concerns shared by the read and write engines.
//!
//! ## Components
//! - **Endian**: fixed-layout primitives and byte-order normalization
//! - **Length**: length-prefix formats and their wire encoding
//! - **Varint**: 7-bit variable-length integer encoding
//! - **Logging**: tracing subscriber setup
//! - **Metrics**: atomic operation counters

pub mod endian;
pub mod length;
pub mod logging;
pub mod metrics;
pub mod varint;

// Re-export public types for advanced users
pub use endian::{Endian, Primitive};
pub use length::LengthPrefix;
