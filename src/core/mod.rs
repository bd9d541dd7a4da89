//! # Core Codec Components
//!
//! Incremental parsers, the engines that drive them, and the sink
//! abstraction used on the write path.
//!
//! Bytes arrive as segments of arbitrary size. Every parser tolerates any
//! split of its input, so a value may straddle any number of segments.
//!
//! ## Components
//! - **Parser**: the `Parse` contract and the `drive` loop
//! - **Parsers**: fixed-size, raw block, varint, length, text and hash parsers
//! - **Read**: typed read entry points
//! - **Sink**: `ByteSink` with stream-backed and in-memory implementations
//! - **Write**: typed write entry points with a flush per unit of work
//! - **Text**: incremental text decoding and encoding
//! - **Digest**: streaming hashes fed by the hash parser
//! - **Codec**: `tokio_util` framing for length-prefixed text
//!
//! ## Wire Format
//! ```text
//! [prefix?][payload]
//! prefix  = i32 (native, little or big endian) | varint (1..=5 bytes)
//! ```

pub mod codec;
pub mod digest;
pub mod parser;
pub mod parsers;
pub mod read;
pub mod sink;
pub mod text;
pub mod write;
