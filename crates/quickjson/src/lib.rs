//! # quickjson
//!
//! High-performance in-memory JSON: a SIMD-accelerated recursive-descent
//! parser, a compact mutable value tree with small-string optimization and
//! hash-indexed objects, a monotonic arena for zero-copy parse workloads,
//! and a buffered serializer with compile-time-dispatched formatting modes.
//!
//! ```
//! let value = quickjson::parse(r#"{"name":"John","age":30,"active":true,"score":95.5}"#).unwrap();
//! assert_eq!(value["name"].as_str().unwrap(), "John");
//! assert_eq!(value["score"].as_float().unwrap(), 95.5);
//!
//! let compact = quickjson::to_string(&value);
//! assert_eq!(compact, r#"{"name":"John","age":30,"active":true,"score":95.5}"#);
//! ```
//!
//! Repeated parsing of small messages goes fastest through an arena
//! document, which recycles one allocation across messages:
//!
//! ```
//! let mut doc = quickjson::ArenaDocument::new();
//! for message in [r#"{"seq":1}"#, r#"{"seq":2}"#] {
//!     let root = doc.parse(message).unwrap();
//!     assert!(root["seq"].as_integer().unwrap() >= 1);
//!     doc.reset();
//! }
//! ```

mod arena;
mod convert;
mod dtoa;
mod error;
#[cfg(feature = "serde")]
mod impls;
mod macros;
mod options;
mod parser;
mod pointer;
mod ser;
mod simd;
mod sync;
mod utf8;
mod value;
mod writer;

use std::io;

pub use arena::{Arena, ArenaDocument, ArenaScope, DEFAULT_ARENA_CAPACITY};
pub use convert::FromValue;
pub use error::{Error, ErrorKind, Result, SourceLocation};
pub use options::{ParseOptions, SerializeOptions, DEFAULT_MAX_DEPTH};
pub use parser::{COUNT_AHEAD_INPUT_THRESHOLD, COUNT_AHEAD_SCAN_LIMIT};
pub use pointer::{resolve, JsonPointer};
pub use sync::SharedValue;
pub use value::{Array, JsonType, Object, Value};
pub use writer::JsonWriter;

/// Parse strict (RFC 8259) JSON text.
pub fn parse(input: &str) -> Result<Value> {
    parser::parse_slice(input.as_bytes(), &ParseOptions::strict())
}

/// Parse JSON text with explicit options.
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Value> {
    parser::parse_slice(input.as_bytes(), options)
}

/// Parse strict JSON from raw bytes.
pub fn parse_bytes(input: &[u8]) -> Result<Value> {
    parser::parse_slice(input, &ParseOptions::strict())
}

/// Parse raw bytes with explicit options.
pub fn parse_bytes_with(input: &[u8], options: &ParseOptions) -> Result<Value> {
    parser::parse_slice(input, options)
}

/// Parse with long strings and container storage allocated from `arena`.
///
/// Prefer [`ArenaDocument`], which packages the lifetime contract safely.
///
/// # Safety
///
/// The returned tree holds raw pointers into `arena`: it must be dropped
/// before the arena is reset or dropped, and must not be handed to another
/// thread that could outlive it. See [`ArenaScope::new`].
pub unsafe fn parse_in(input: &str, arena: &Arena, options: &ParseOptions) -> Result<Value> {
    let _scope = ArenaScope::new(arena);
    parser::parse_slice(input.as_bytes(), options)
}

/// Serialize compactly.
pub fn to_string(value: &Value) -> String {
    ser::value_to_string(value, &SerializeOptions::compact())
}

/// Serialize pretty-printed with two-space indentation.
pub fn to_string_pretty(value: &Value) -> String {
    ser::value_to_string(value, &SerializeOptions::pretty(2))
}

/// Serialize with explicit options.
pub fn to_string_with(value: &Value, options: &SerializeOptions) -> String {
    ser::value_to_string(value, options)
}

/// Serialize to an `io::Write` sink through an 8 KiB buffer.
pub fn to_writer<W: io::Write>(
    writer: W,
    value: &Value,
    options: &SerializeOptions,
) -> io::Result<()> {
    ser::value_to_writer(writer, value, options)
}
