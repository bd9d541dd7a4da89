//! # Stream Facades
//!
//! Owned wrappers that bind a byte source or sink to its text context,
//! cancellation token, configured limits and optional metrics.
//!
//! The free functions in [`crate::core::read`] and [`crate::core::write`]
//! take every collaborator explicitly. `WireReader` and `WireWriter` hold
//! them instead, which is usually what a protocol implementation wants.
//!
//! ## Example
//! ```rust,no_run
//! use segment_codec::stream::{WireReader, WireWriter};
//! use segment_codec::core::sink::MemorySink;
//!
//! # async fn demo() -> segment_codec::error::Result<()> {
//! let mut writer = WireWriter::new(MemorySink::new());
//! writer.write_le(42u32).await?;
//! writer.write_string("hello").await?;
//!
//! let bytes = writer.into_inner().into_bytes();
//! let mut reader = WireReader::new(&bytes[..]);
//! assert_eq!(reader.read_le::<u32>().await?, 42);
//! assert_eq!(reader.read_string().await?, "hello");
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::WireReader;
pub use writer::WireWriter;
