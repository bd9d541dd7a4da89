//! # Segment Codec
//!
//! Asynchronous incremental binary codec over segmented byte streams.
//!
//! Values are decoded by small step-wise parsers that accept their input in
//! segments of any size, so nothing has to be buffered up front and a value
//! may straddle any number of reads. Writes go through a sink that hands out
//! regions and reports backpressure on every flush.
//!
//! ## Features
//! - Fixed-size primitives in native, little or big endian order
//! - 7-bit variable-length integers (up to 5 bytes for `u32`)
//! - Length prefixes: 4-byte signed integers or varints
//! - Text in UTF-8, UTF-16LE, UTF-16BE or Latin-1, counted in characters
//! - Streaming SHA-2 and CRC-32 digests over exact or unbounded input
//! - Cancellation at every suspension point via `CancellationToken`
//! - `tokio_util` framing for length-prefixed text
//!
//! ## Layout
//! - [`core`]: parsers, read and write engines, sinks, text and digests
//! - [`stream`]: `WireReader` / `WireWriter` facades
//! - [`utils`]: endian, varint and length-prefix helpers, logging, metrics
//! - [`config`]: TOML / environment configuration
//! - [`error`]: `CodecError` and the crate `Result`
//!
//! ## Quick Start
//! ```rust,no_run
//! use segment_codec::core::read::read_varint;
//! use segment_codec::core::sink::MemorySink;
//! use segment_codec::core::write::write_varint;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> segment_codec::Result<()> {
//! let cancel = CancellationToken::new();
//! let mut sink = MemorySink::new();
//! write_varint(&mut sink, 300, &cancel).await?;
//!
//! let bytes = sink.into_bytes();
//! let mut source = &bytes[..];
//! assert_eq!(read_varint(&mut source, &cancel).await?, 300);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod stream;
pub mod utils;

pub use crate::config::CodecConfig;
pub use crate::core::codec::TextFrameCodec;
pub use crate::core::digest::StreamingDigest;
pub use crate::core::parser::{drive, Parse};
pub use crate::core::sink::{ByteSink, FlushStatus, MemorySink, StreamSink};
pub use crate::core::text::{DecodeContext, EncodeContext, TextEncoding};
pub use crate::error::{CodecError, Result};
pub use crate::stream::{WireReader, WireWriter};
pub use crate::utils::endian::{Endian, Primitive};
pub use crate::utils::length::LengthPrefix;
pub use crate::utils::metrics::CodecMetrics;
