//! Buffered serializer over the value tree.
//!
//! Two sinks (an owned string and any `io::Write`) and four monomorphized
//! writer instantiations: pretty and ensure-ascii are const generics, so
//! the compact hot loop carries no per-byte mode branches. Strings scan
//! for the next byte needing an escape with the SIMD predicate and
//! bulk-copy the safe run in between.

use std::io;

use smallvec::SmallVec;

use crate::dtoa;
use crate::options::SerializeOptions;
use crate::simd;
use crate::utf8;
use crate::value::{Array, Object, Value};
use crate::value::Repr;

const STRING_BUF_SIZE: usize = 4096;
const IO_BUF_SIZE: usize = 8192;

pub(crate) trait Sink {
    fn write(&mut self, bytes: &[u8]);
    fn write_byte(&mut self, byte: u8);
}

/// Buffered accumulation into an owned string.
struct StringSink {
    buf: [u8; STRING_BUF_SIZE],
    pos: usize,
    out: Vec<u8>,
}

impl StringSink {
    fn with_hint(hint: usize) -> StringSink {
        let mut out = Vec::new();
        if hint > STRING_BUF_SIZE {
            out.reserve(hint);
        }
        StringSink {
            buf: [0; STRING_BUF_SIZE],
            pos: 0,
            out,
        }
    }

    fn flush(&mut self) {
        if self.pos > 0 {
            self.out.extend_from_slice(&self.buf[..self.pos]);
            self.pos = 0;
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        // SAFETY: the serializer emits ASCII plus byte-copies of `&str`
        // content, so the output is valid UTF-8.
        unsafe { String::from_utf8_unchecked(self.out) }
    }

    #[cold]
    fn write_slow(&mut self, bytes: &[u8]) {
        self.flush();
        if bytes.len() >= STRING_BUF_SIZE {
            self.out.extend_from_slice(bytes);
        } else {
            self.buf[..bytes.len()].copy_from_slice(bytes);
            self.pos = bytes.len();
        }
    }
}

impl Sink for StringSink {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        if self.pos + bytes.len() <= STRING_BUF_SIZE {
            self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
            self.pos += bytes.len();
        } else {
            self.write_slow(bytes);
        }
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) {
        if self.pos >= STRING_BUF_SIZE {
            self.flush();
        }
        self.buf[self.pos] = byte;
        self.pos += 1;
    }
}

/// Buffered writing to an `io::Write`. The first I/O error is stored and
/// reported by `finish`; subsequent writes are dropped.
struct IoSink<W: io::Write> {
    writer: W,
    buf: [u8; IO_BUF_SIZE],
    pos: usize,
    error: Option<io::Error>,
}

impl<W: io::Write> IoSink<W> {
    fn new(writer: W) -> IoSink<W> {
        IoSink {
            writer,
            buf: [0; IO_BUF_SIZE],
            pos: 0,
            error: None,
        }
    }

    fn flush_buf(&mut self) {
        if self.pos > 0 {
            if self.error.is_none() {
                if let Err(err) = self.writer.write_all(&self.buf[..self.pos]) {
                    self.error = Some(err);
                }
            }
            self.pos = 0;
        }
    }

    fn finish(mut self) -> io::Result<()> {
        self.flush_buf();
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    #[cold]
    fn write_slow(&mut self, bytes: &[u8]) {
        self.flush_buf();
        if bytes.len() >= IO_BUF_SIZE {
            if self.error.is_none() {
                if let Err(err) = self.writer.write_all(bytes) {
                    self.error = Some(err);
                }
            }
        } else {
            self.buf[..bytes.len()].copy_from_slice(bytes);
            self.pos = bytes.len();
        }
    }
}

impl<W: io::Write> Sink for IoSink<W> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        if self.pos + bytes.len() <= IO_BUF_SIZE {
            self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
            self.pos += bytes.len();
        } else {
            self.write_slow(bytes);
        }
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) {
        if self.pos >= IO_BUF_SIZE {
            self.flush_buf();
        }
        self.buf[self.pos] = byte;
        self.pos += 1;
    }
}

// ─── Escape table ───

#[derive(Clone, Copy)]
pub(crate) struct EscapeEntry {
    pub(crate) len: u8,
    pub(crate) bytes: [u8; 6],
}

const HEX_DIGITS: [u8; 16] = *b"0123456789abcdef";

const fn short_escape(c: u8) -> EscapeEntry {
    EscapeEntry {
        len: 2,
        bytes: [b'\\', c, 0, 0, 0, 0],
    }
}

/// Precomputed escapes for control bytes 0x00..0x1F: two-byte aliases
/// where JSON defines them, six-byte `\u00XX` otherwise.
pub(crate) static CONTROL_ESCAPES: [EscapeEntry; 32] = {
    let mut table = [EscapeEntry {
        len: 6,
        bytes: [0; 6],
    }; 32];
    let mut i = 0;
    while i < 32 {
        table[i].bytes = [
            b'\\',
            b'u',
            b'0',
            b'0',
            HEX_DIGITS[(i >> 4) & 0xF],
            HEX_DIGITS[i & 0xF],
        ];
        i += 1;
    }
    table[0x08] = short_escape(b'b');
    table[0x09] = short_escape(b't');
    table[0x0A] = short_escape(b'n');
    table[0x0C] = short_escape(b'f');
    table[0x0D] = short_escape(b'r');
    table
};

static SPACES: [u8; 256] = [b' '; 256];

// ─── Writer core ───

struct Writer<'a, S: Sink, const PRETTY: bool, const ENSURE_ASCII: bool> {
    sink: &'a mut S,
    options: &'a SerializeOptions,
    indent: usize,
}

impl<S: Sink, const PRETTY: bool, const ENSURE_ASCII: bool> Writer<'_, S, PRETTY, ENSURE_ASCII> {
    fn write_value(&mut self, value: &Value) {
        match &value.repr {
            Repr::Null => self.sink.write(b"null"),
            Repr::Bool(true) => self.sink.write(b"true"),
            Repr::Bool(false) => self.sink.write(b"false"),
            Repr::Integer(i) => {
                let mut buf = [0u8; 21];
                let n = dtoa::write_i64(&mut buf, *i);
                self.sink.write(&buf[..n]);
            }
            Repr::UInteger(u) => {
                let mut buf = [0u8; 20];
                let n = dtoa::write_u64(&mut buf, *u);
                self.sink.write(&buf[..n]);
            }
            Repr::Float(v) => self.write_float(*v),
            Repr::String(s) => self.write_string(s.as_str()),
            Repr::Array(a) => self.write_array(a),
            Repr::Object(o) => self.write_object(o.get()),
        }
    }

    fn write_float(&mut self, value: f64) {
        if value.is_nan() {
            if self.options.allow_nan_inf {
                self.sink.write(b"NaN");
            } else {
                self.sink.write(b"null");
            }
            return;
        }
        if value.is_infinite() {
            if self.options.allow_nan_inf {
                if value < 0.0 {
                    self.sink.write_byte(b'-');
                }
                self.sink.write(b"Infinity");
            } else {
                self.sink.write(b"null");
            }
            return;
        }
        let mut buf = [0u8; 40];
        let n = dtoa::format_f64(&mut buf, value);
        self.sink.write(&buf[..n]);
    }

    fn write_newline(&mut self) {
        if PRETTY {
            self.sink.write_byte(b'\n');
        }
    }

    fn write_indent(&mut self) {
        if PRETTY {
            let mut remaining = self.indent;
            while remaining > 0 {
                let chunk = remaining.min(SPACES.len());
                self.sink.write(&SPACES[..chunk]);
                remaining -= chunk;
            }
        }
    }

    fn write_string(&mut self, s: &str) {
        self.sink.write_byte(b'"');
        let bytes = s.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            let safe_end = simd::find_needs_escape::<ENSURE_ASCII>(bytes, pos);
            if safe_end > pos {
                self.sink.write(&bytes[pos..safe_end]);
                pos = safe_end;
                if pos >= bytes.len() {
                    break;
                }
            }
            let byte = bytes[pos];
            if byte < 0x20 {
                let escape = &CONTROL_ESCAPES[byte as usize];
                self.sink.write(&escape.bytes[..escape.len as usize]);
                pos += 1;
            } else if byte == b'"' {
                self.sink.write(b"\\\"");
                pos += 1;
            } else if byte == b'\\' {
                self.sink.write(b"\\\\");
                pos += 1;
            } else if ENSURE_ASCII && byte >= 0x80 {
                let cp = utf8::decode(bytes, &mut pos);
                let mut escape = [0u8; 12];
                let n = utf8::encode_escaped(cp, &mut escape);
                self.sink.write(&escape[..n]);
            } else {
                pos += 1;
            }
        }
        self.sink.write_byte(b'"');
    }

    fn write_array(&mut self, array: &Array) {
        if array.is_empty() {
            self.sink.write(b"[]");
            return;
        }
        self.sink.write_byte(b'[');
        if PRETTY {
            self.indent += self.options.indent as usize;
        }
        self.write_newline();
        for (i, item) in array.iter().enumerate() {
            if i > 0 {
                self.sink.write_byte(b',');
                self.write_newline();
            }
            self.write_indent();
            self.write_value(item);
        }
        if PRETTY {
            self.indent -= self.options.indent as usize;
        }
        self.write_newline();
        self.write_indent();
        self.sink.write_byte(b']');
    }

    fn write_object(&mut self, object: &Object) {
        if object.is_empty() {
            self.sink.write(b"{}");
            return;
        }
        self.sink.write_byte(b'{');
        if PRETTY {
            self.indent += self.options.indent as usize;
        }
        self.write_newline();
        if self.options.sort_keys {
            self.write_object_sorted(object);
        } else {
            self.write_object_ordered(object);
        }
        if PRETTY {
            self.indent -= self.options.indent as usize;
        }
        self.write_newline();
        self.write_indent();
        self.sink.write_byte(b'}');
    }

    fn write_entry(&mut self, key: &str, value: &Value) {
        self.write_indent();
        self.write_string(key);
        self.sink.write_byte(b':');
        if PRETTY {
            self.sink.write_byte(b' ');
        }
        self.write_value(value);
    }

    fn write_object_ordered(&mut self, object: &Object) {
        for (i, (key, value)) in object.iter().enumerate() {
            if i > 0 {
                self.sink.write_byte(b',');
                self.write_newline();
            }
            self.write_entry(key, value);
        }
    }

    fn write_object_sorted(&mut self, object: &Object) {
        let entries = object.entries();
        // Objects of up to 64 keys sort on the stack.
        let mut order: SmallVec<[usize; 64]> = (0..entries.len()).collect();
        order.sort_unstable_by(|&a, &b| entries[a].key.as_str().cmp(entries[b].key.as_str()));
        for (i, &idx) in order.iter().enumerate() {
            if i > 0 {
                self.sink.write_byte(b',');
                self.write_newline();
            }
            self.write_entry(entries[idx].key.as_str(), &entries[idx].value);
        }
    }
}

/// Select one of the four monomorphized writers.
fn write_document<S: Sink>(sink: &mut S, value: &Value, options: &SerializeOptions) {
    let pretty = options.indent >= 0;
    match (pretty, options.ensure_ascii) {
        (true, true) => Writer::<S, true, true> {
            sink,
            options,
            indent: 0,
        }
        .write_value(value),
        (true, false) => Writer::<S, true, false> {
            sink,
            options,
            indent: 0,
        }
        .write_value(value),
        (false, true) => Writer::<S, false, true> {
            sink,
            options,
            indent: 0,
        }
        .write_value(value),
        (false, false) => Writer::<S, false, false> {
            sink,
            options,
            indent: 0,
        }
        .write_value(value),
    }
}

/// O(1) output-size estimate from the root's shape only; pre-reserves the
/// result buffer when the document is clearly larger than one buffer flush.
pub(crate) fn size_hint(value: &Value) -> usize {
    match &value.repr {
        Repr::Array(a) => a.len() * 64 + 2,
        Repr::Object(o) => o.get().len() * 80 + 2,
        Repr::String(s) => s.len() + 2,
        _ => 16,
    }
}

pub(crate) fn value_to_string(value: &Value, options: &SerializeOptions) -> String {
    let mut sink = StringSink::with_hint(size_hint(value));
    write_document(&mut sink, value, options);
    sink.finish()
}

pub(crate) fn value_to_writer<W: io::Write>(
    writer: W,
    value: &Value,
    options: &SerializeOptions,
) -> io::Result<()> {
    let mut sink = IoSink::new(writer);
    write_document(&mut sink, value, options);
    sink.finish()
}
