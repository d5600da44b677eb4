//! Recursive-descent JSON parser over a byte span.
//!
//! Hot paths: SIMD whitespace skipping with 0/1/2-byte fast checks first,
//! SIMD string-delimiter search with a zero-copy path for escape-free
//! strings, and inline integer/mantissa accumulation so most numbers never
//! reach the general float conversion. Containers pre-size their storage
//! with a bounded comma-counting look-ahead on large inputs.

use ahash::AHashSet;

use crate::arena::{self, Arena};
use crate::error::{self, Error, ErrorKind, Result};
use crate::options::ParseOptions;
use crate::simd;
use crate::utf8;
use crate::value::string::Str;
use crate::value::{Array, Object, Value};

/// Inputs smaller than this skip the capacity look-ahead entirely; below
/// it the second scan costs more than the reallocations it saves.
pub const COUNT_AHEAD_INPUT_THRESHOLD: usize = 256;

/// Upper bound on the capacity look-ahead scan.
pub const COUNT_AHEAD_SCAN_LIMIT: usize = 512;

const DEFAULT_CONTAINER_RESERVE: usize = 8;

/// Parse a byte span into a value, honoring the active arena scope.
pub(crate) fn parse_slice(input: &[u8], options: &ParseOptions) -> Result<Value> {
    arena::with_active(|active| {
        let mut parser = Parser {
            input,
            pos: 0,
            options: *options,
            depth: 0,
            arena: active,
        };
        let value = parser.parse_value()?;
        parser.skip_ws_and_comments();
        if parser.pos < parser.input.len() {
            return Err(parser.error_here(ErrorKind::TrailingContent, "unexpected trailing content"));
        }
        Ok(value)
    })
}

/// 256-entry hex lookup: 0xFF marks an invalid digit. One load and one
/// compare per nibble, no branching on letter case.
const HEX_TABLE: [u8; 256] = {
    let mut table = [0xFFu8; 256];
    let mut i = 0;
    while i < 10 {
        table[b'0' as usize + i] = i as u8;
        i += 1;
    }
    let mut i = 0;
    while i < 6 {
        table[b'a' as usize + i] = 10 + i as u8;
        table[b'A' as usize + i] = 10 + i as u8;
        i += 1;
    }
    table
};

/// Exact powers of ten for mantissa * 10^e reconstruction; products and
/// quotients in [-22, 22] round correctly.
const PARSE_POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

enum RawString<'a> {
    /// Escape-free span borrowed straight from the input.
    Borrowed(&'a str),
    /// Escapes processed into an owned buffer.
    Owned(String),
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    options: ParseOptions,
    depth: usize,
    /// Active arena captured once at entry; avoids a thread-local lookup
    /// per string and per container.
    arena: Option<&'a Arena>,
}

impl<'a> Parser<'a> {
    // ─── Error reporting ───

    fn error_at(&self, offset: usize, kind: ErrorKind, message: impl Into<Box<str>>) -> Error {
        Error::with_location(kind, message, error::locate(self.input, offset))
    }

    fn error_here(&self, kind: ErrorKind, message: impl Into<Box<str>>) -> Error {
        self.error_at(self.pos, kind, message)
    }

    fn error_unexpected(&self) -> Error {
        match self.peek() {
            Some(b) => self.error_here(
                ErrorKind::UnexpectedCharacter,
                format!("unexpected character '{}'", b as char),
            ),
            None => self.error_here(ErrorKind::UnexpectedEndOfInput, "unexpected end of input"),
        }
    }

    // ─── Character reading ───

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn digit_at(&self, pos: usize) -> Option<u64> {
        match self.input.get(pos).copied() {
            Some(b @ b'0'..=b'9') => Some(u64::from(b - b'0')),
            _ => None,
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.error_here(
                ErrorKind::UnexpectedCharacter,
                format!("expected '{}', got '{}'", expected as char, b as char),
            )),
            None => Err(self.error_here(ErrorKind::UnexpectedEndOfInput, "unexpected end of input")),
        }
    }

    fn expect_literal(&mut self, literal: &str) -> Result<()> {
        let bytes = literal.as_bytes();
        if self.input.len() - self.pos < bytes.len()
            || &self.input[self.pos..self.pos + bytes.len()] != bytes
        {
            return Err(self.error_here(ErrorKind::InvalidLiteral, format!("expected '{literal}'")));
        }
        self.pos += bytes.len();
        Ok(())
    }

    // ─── Depth tracking ───

    fn push_depth(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(self.error_here(
                ErrorKind::MaxDepthExceeded,
                "maximum nesting depth exceeded",
            ));
        }
        Ok(())
    }

    fn pop_depth(&mut self) {
        self.depth -= 1;
    }

    // ─── Whitespace and comments ───

    #[inline]
    fn skip_whitespace(&mut self) {
        fn is_ws(b: u8) -> bool {
            matches!(b, b' ' | b'\t' | b'\n' | b'\r')
        }
        // Fast checks for 0, 1, or 2 whitespace bytes (", " and ":\n" are
        // the overwhelmingly common shapes) before the SIMD scan.
        match self.input.get(self.pos) {
            Some(&b) if is_ws(b) => {}
            _ => return,
        }
        if matches!(self.input.get(self.pos + 1), Some(&b) if !is_ws(b)) {
            self.pos += 1;
            return;
        }
        if self.pos + 2 <= self.input.len()
            && matches!(self.input.get(self.pos + 2), Some(&b) if !is_ws(b))
            && matches!(self.input.get(self.pos + 1), Some(&b) if is_ws(b))
        {
            self.pos += 2;
            return;
        }
        self.pos = simd::skip_whitespace(self.input, self.pos);
    }

    fn skip_comments(&mut self) {
        while self.pos + 1 < self.input.len() && self.input[self.pos] == b'/' {
            match self.input[self.pos + 1] {
                b'/' => {
                    self.pos += 2;
                    while self.pos < self.input.len() && self.input[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                    if self.pos < self.input.len() {
                        self.pos += 1;
                    }
                    self.skip_whitespace();
                }
                b'*' => {
                    self.pos += 2;
                    while self.pos + 1 < self.input.len() {
                        if self.input[self.pos] == b'*' && self.input[self.pos + 1] == b'/' {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                    self.skip_whitespace();
                }
                _ => break,
            }
        }
    }

    #[inline]
    fn skip_ws_and_comments(&mut self) {
        self.skip_whitespace();
        if self.options.allow_comments {
            self.skip_comments();
        }
    }

    // ─── Value dispatch ───

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_ws_and_comments();
        let byte = match self.peek() {
            Some(b) => b,
            None => {
                return Err(self.error_here(ErrorKind::UnexpectedEndOfInput, "unexpected end of input"))
            }
        };
        match byte {
            b'"' => self.parse_string_value(b'"'),
            b'\'' if self.options.allow_single_quotes => self.parse_string_value(b'\''),
            b'{' => self.parse_object(),
            b'[' => self.parse_array(),
            b't' => {
                self.expect_literal("true")?;
                Ok(Value::from(true))
            }
            b'f' => {
                self.expect_literal("false")?;
                Ok(Value::from(false))
            }
            b'n' => {
                self.expect_literal("null")?;
                Ok(Value::null())
            }
            b'-' | b'0'..=b'9' => self.parse_number(),
            b'N' if self.options.allow_nan_inf => {
                self.expect_literal("NaN")?;
                Ok(Value::from(f64::NAN))
            }
            b'I' if self.options.allow_nan_inf => self.parse_infinity(false),
            _ => Err(self.error_unexpected()),
        }
    }

    fn parse_infinity(&mut self, negative: bool) -> Result<Value> {
        self.expect_literal("Infinity")?;
        Ok(Value::from(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }))
    }

    // ─── Strings ───

    /// Reject raw string bytes the options disallow and anything that is
    /// not valid UTF-8; the value accessors hand out `&str` afterwards.
    fn check_raw_segment(&self, segment: &[u8], start: usize) -> Result<()> {
        if !self.options.allow_control_chars {
            if let Some(i) = segment.iter().position(|&b| b < 0x20) {
                return Err(self.error_at(
                    start + i,
                    ErrorKind::UnexpectedCharacter,
                    "unescaped control character in string",
                ));
            }
        }
        if !utf8::validate(segment) {
            return Err(self.error_at(start, ErrorKind::InvalidUtf8, "invalid UTF-8 in string"));
        }
        Ok(())
    }

    fn parse_string_core(&mut self, quote: u8) -> Result<RawString<'a>> {
        self.pos += 1; // opening quote, dispatched on by the caller

        if quote == b'"' {
            let delim = simd::find_string_delimiter(self.input, self.pos);
            if delim < self.input.len() && self.input[delim] == b'"' {
                // No escapes: borrow straight from the input.
                let span = &self.input[self.pos..delim];
                self.check_raw_segment(span, self.pos)?;
                self.pos = delim + 1;
                // SAFETY: `check_raw_segment` validated UTF-8.
                return Ok(RawString::Borrowed(unsafe {
                    std::str::from_utf8_unchecked(span)
                }));
            }
            let mut buf = String::new();
            if delim > self.pos {
                let segment = &self.input[self.pos..delim];
                self.check_raw_segment(segment, self.pos)?;
                // SAFETY: validated above.
                buf.push_str(unsafe { std::str::from_utf8_unchecked(segment) });
                self.pos = delim;
            }
            self.parse_string_content(&mut buf, quote)?;
            Ok(RawString::Owned(buf))
        } else {
            let mut buf = String::new();
            self.parse_string_content(&mut buf, quote)?;
            Ok(RawString::Owned(buf))
        }
    }

    fn parse_string_content(&mut self, out: &mut String, quote: u8) -> Result<()> {
        loop {
            let run_start = self.pos;
            let delim = if quote == b'"' {
                simd::find_string_delimiter(self.input, self.pos)
            } else {
                let mut i = self.pos;
                while i < self.input.len() && self.input[i] != quote && self.input[i] != b'\\' {
                    i += 1;
                }
                i
            };
            if delim > run_start {
                let segment = &self.input[run_start..delim];
                self.check_raw_segment(segment, run_start)?;
                // SAFETY: validated above.
                out.push_str(unsafe { std::str::from_utf8_unchecked(segment) });
                self.pos = delim;
            }

            let byte = match self.peek() {
                Some(b) => b,
                None => {
                    return Err(
                        self.error_here(ErrorKind::UnterminatedString, "unterminated string")
                    )
                }
            };
            if byte == quote {
                self.pos += 1;
                return Ok(());
            }
            // The delimiter search only stops at the quote or a backslash.
            self.pos += 1;
            self.parse_escape(out)?;
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<()> {
        let byte = match self.peek() {
            Some(b) => b,
            None => {
                return Err(
                    self.error_here(ErrorKind::InvalidEscape, "unterminated escape sequence")
                )
            }
        };
        self.pos += 1;
        match byte {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000C}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'\'' if self.options.allow_single_quotes => out.push('\''),
            b'u' => self.parse_unicode_escape(out)?,
            _ => {
                return Err(self.error_at(
                    self.pos - 1,
                    ErrorKind::InvalidEscape,
                    format!("invalid escape '\\{}'", byte as char),
                ))
            }
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        if self.input.len() - self.pos < 4 {
            return Err(self.error_here(
                ErrorKind::InvalidUnicodeEscape,
                "incomplete unicode escape",
            ));
        }
        let mut val = 0u32;
        for i in 0..4 {
            let nibble = HEX_TABLE[self.input[self.pos + i] as usize];
            if nibble > 15 {
                return Err(self.error_at(
                    self.pos + i,
                    ErrorKind::InvalidUnicodeEscape,
                    "invalid hex digit in unicode escape",
                ));
            }
            val = (val << 4) | u32::from(nibble);
        }
        self.pos += 4;
        Ok(val)
    }

    fn parse_unicode_escape(&mut self, out: &mut String) -> Result<()> {
        let mut cp = self.parse_hex4()?;

        if (0xD800..=0xDBFF).contains(&cp) {
            if self.input.len() - self.pos < 2
                || self.input[self.pos] != b'\\'
                || self.input[self.pos + 1] != b'u'
            {
                return Err(
                    self.error_here(ErrorKind::InvalidUnicodeEscape, "missing low surrogate")
                );
            }
            self.pos += 2;
            let low = self.parse_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.error_here(
                    ErrorKind::InvalidUnicodeEscape,
                    "invalid low surrogate value",
                ));
            }
            cp = 0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00);
        } else if (0xDC00..=0xDFFF).contains(&cp) {
            return Err(
                self.error_here(ErrorKind::InvalidUnicodeEscape, "unexpected low surrogate")
            );
        }

        let mut buf = [0u8; 4];
        let n = utf8::encode(cp, &mut buf);
        // SAFETY: `cp` is a validated non-surrogate scalar value, so the
        // encoder produced `n` bytes of valid UTF-8.
        out.push_str(unsafe { std::str::from_utf8_unchecked(&buf[..n]) });
        Ok(())
    }

    fn make_str(&self, raw: RawString<'_>) -> Str {
        match raw {
            RawString::Borrowed(s) => Str::with_arena(self.arena, s),
            RawString::Owned(s) => match self.arena {
                Some(active) => Str::with_arena(Some(active), &s),
                None => Str::from_string(s),
            },
        }
    }

    fn parse_string_value(&mut self, quote: u8) -> Result<Value> {
        let raw = self.parse_string_core(quote)?;
        Ok(Value::from_str_value(self.make_str(raw)))
    }

    fn parse_key(&mut self, quote: u8) -> Result<Str> {
        let raw = self.parse_string_core(quote)?;
        Ok(self.make_str(raw))
    }

    fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_' || b == b'$'
    }

    fn is_ident_char(b: u8) -> bool {
        Self::is_ident_start(b) || b.is_ascii_digit()
    }

    fn parse_unquoted_key(&mut self) -> Result<Str> {
        let start = self.pos;
        match self.peek() {
            Some(b) if Self::is_ident_start(b) => self.pos += 1,
            _ => {
                return Err(self.error_here(
                    ErrorKind::UnexpectedCharacter,
                    "expected identifier for unquoted key",
                ))
            }
        }
        while matches!(self.peek(), Some(b) if Self::is_ident_char(b)) {
            self.pos += 1;
        }
        // SAFETY: identifier characters are ASCII.
        let key = unsafe { std::str::from_utf8_unchecked(&self.input[start..self.pos]) };
        Ok(Str::with_arena(self.arena, key))
    }

    // ─── Numbers ───

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        let mut negative = false;

        if self.input[self.pos] == b'-' {
            negative = true;
            self.pos += 1;
            if self.pos >= self.input.len() {
                return Err(self.error_here(ErrorKind::InvalidNumber, "invalid number"));
            }
            if self.options.allow_nan_inf && self.input[self.pos] == b'I' {
                return self.parse_infinity(true);
            }
        }

        if self.options.allow_hex_numbers
            && self.input[self.pos] == b'0'
            && matches!(self.input.get(self.pos + 1).copied(), Some(b'x' | b'X'))
        {
            return self.parse_hex_number(negative);
        }

        if self.digit_at(self.pos).is_none() {
            return Err(self.error_here(ErrorKind::InvalidNumber, "invalid number"));
        }

        // Integer part, accumulated inline with overflow tracking. The
        // digit count is maintained as we go so the float path below never
        // re-counts via division.
        let mut int_val = 0u64;
        let mut int_overflow = false;
        let mut int_digits = 0i32;

        if self.input[self.pos] == b'0' {
            self.pos += 1;
        } else {
            int_val = u64::from(self.input[self.pos] - b'0');
            self.pos += 1;
            int_digits = 1;
            const OVERFLOW_THRESHOLD: u64 = u64::MAX / 10;
            const OVERFLOW_LAST_DIGIT: u64 = u64::MAX % 10;
            while let Some(digit) = self.digit_at(self.pos) {
                if int_val > OVERFLOW_THRESHOLD
                    || (int_val == OVERFLOW_THRESHOLD && digit > OVERFLOW_LAST_DIGIT)
                {
                    int_overflow = true;
                    self.pos += 1;
                    while self.digit_at(self.pos).is_some() {
                        self.pos += 1;
                    }
                    break;
                }
                int_val = int_val * 10 + digit;
                self.pos += 1;
                int_digits += 1;
            }
        }

        let mut is_float = false;

        // Mantissa and exponent accumulate in the same scan; with at most
        // 19 significant digits the double can be rebuilt exactly below.
        let mut mantissa = int_val;
        let mut frac_digits = 0i32;
        let mut explicit_exp = 0i32;
        let mut mantissa_overflow = int_overflow;
        const MAX_MANTISSA_DIGITS: i32 = 19;
        let mut total_digits = int_digits;

        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            if self.digit_at(self.pos).is_none() {
                return Err(self.error_here(
                    ErrorKind::InvalidNumber,
                    "expected digit after decimal point",
                ));
            }
            while let Some(digit) = self.digit_at(self.pos) {
                if total_digits < MAX_MANTISSA_DIGITS {
                    mantissa = mantissa * 10 + digit;
                    frac_digits += 1;
                    total_digits += 1;
                } else {
                    mantissa_overflow = true;
                }
                self.pos += 1;
            }
        }

        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            is_float = true;
            self.pos += 1;
            let mut negative_exp = false;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                negative_exp = self.input[self.pos] == b'-';
                self.pos += 1;
            }
            if self.digit_at(self.pos).is_none() {
                return Err(
                    self.error_here(ErrorKind::InvalidNumber, "expected digit in exponent")
                );
            }
            while let Some(digit) = self.digit_at(self.pos) {
                explicit_exp = explicit_exp * 10 + digit as i32;
                if explicit_exp > 400 {
                    explicit_exp = 400; // clamp; magnitude is already out of range
                }
                self.pos += 1;
            }
            if negative_exp {
                explicit_exp = -explicit_exp;
            }
        }

        if !is_float && !int_overflow {
            if negative {
                const MAX_NEGATIVE: u64 = i64::MAX as u64 + 1;
                if int_val <= MAX_NEGATIVE {
                    return Ok(Value::from((int_val as i64).wrapping_neg()));
                }
            } else {
                if int_val <= i64::MAX as u64 {
                    return Ok(Value::from(int_val as i64));
                }
                return Ok(Value::from(int_val));
            }
        }

        // Exact reconstruction: mantissa fits u64 and the effective power
        // of ten is itself exact in a double.
        if !mantissa_overflow && !int_overflow {
            let exp10 = explicit_exp - frac_digits;
            if (-22..=22).contains(&exp10) {
                let mut value = if exp10 >= 0 {
                    mantissa as f64 * PARSE_POW10[exp10 as usize]
                } else {
                    mantissa as f64 / PARSE_POW10[(-exp10) as usize]
                };
                if negative {
                    value = -value;
                }
                return Ok(Value::from(value));
            }
        }

        self.parse_float_slow(start)
    }

    fn parse_hex_number(&mut self, negative: bool) -> Result<Value> {
        self.pos += 2; // 0x
        if self.pos >= self.input.len() {
            return Err(self.error_here(ErrorKind::InvalidNumber, "incomplete hex number"));
        }

        let mut val = 0u64;
        let mut has_digit = false;
        while let Some(&b) = self.input.get(self.pos) {
            let nibble = HEX_TABLE[b as usize];
            if nibble > 15 {
                break;
            }
            has_digit = true;
            val = match val.checked_mul(16) {
                Some(shifted) => shifted | u64::from(nibble),
                None => {
                    return Err(self.error_here(
                        ErrorKind::IntegerOverflow,
                        "hex number exceeds 64 bits",
                    ))
                }
            };
            self.pos += 1;
        }
        if !has_digit {
            return Err(self.error_here(ErrorKind::InvalidNumber, "expected hex digit"));
        }

        let signed = val as i64;
        Ok(Value::from(if negative { signed.wrapping_neg() } else { signed }))
    }

    fn parse_float_slow(&mut self, start: usize) -> Result<Value> {
        let text = &self.input[start..self.pos];
        // SAFETY: the number scanner only consumed ASCII bytes.
        let text = unsafe { std::str::from_utf8_unchecked(text) };
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Value::from(value)),
            _ => Err(self.error_at(start, ErrorKind::InvalidNumber, "invalid number")),
        }
    }

    // ─── Containers ───

    /// Estimate element count by scanning ahead for top-level commas.
    /// Only worthwhile at shallow depth on large remaining input.
    fn estimate_capacity(&self) -> usize {
        let remaining = self.input.len() - self.pos;
        if self.depth > 2 || remaining <= COUNT_AHEAD_INPUT_THRESHOLD {
            return DEFAULT_CONTAINER_RESERVE;
        }
        let scan_max = remaining.min(COUNT_AHEAD_SCAN_LIMIT);
        let bytes = &self.input[self.pos..self.pos + scan_max];
        let mut estimate = 1usize;
        let mut nesting = 0i32;
        let mut i = 0;
        while i < scan_max {
            match bytes[i] {
                b'{' | b'[' => nesting += 1,
                b'}' | b']' => {
                    if nesting == 0 {
                        break;
                    }
                    nesting -= 1;
                }
                b',' if nesting == 0 => estimate += 1,
                b'"' => {
                    i += 1;
                    while i < scan_max && bytes[i] != b'"' {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        estimate.max(DEFAULT_CONTAINER_RESERVE)
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.pos += 1; // [
        self.push_depth()?;
        self.skip_ws_and_comments();

        if self.peek().is_none() {
            return Err(self.error_here(ErrorKind::UnterminatedArray, "unterminated array"));
        }
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.pop_depth();
            return Ok(Value::from_array_value(Array::with_capacity_in(
                0, self.arena,
            )));
        }

        let capacity = self.estimate_capacity();
        let mut array = Array::with_capacity_in(capacity, self.arena);

        loop {
            let value = self.parse_value()?;
            array.push_with(value, self.arena);
            self.skip_ws_and_comments();

            match self.peek() {
                None => {
                    return Err(self.error_here(ErrorKind::UnterminatedArray, "unterminated array"))
                }
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws_and_comments();
                    if self.options.allow_trailing_commas && self.peek() == Some(b']') {
                        self.pos += 1;
                        self.pop_depth();
                        return Ok(Value::from_array_value(array));
                    }
                }
                Some(b']') => {
                    self.pos += 1;
                    self.pop_depth();
                    return Ok(Value::from_array_value(array));
                }
                Some(b) => {
                    return Err(self.error_here(
                        ErrorKind::UnexpectedCharacter,
                        format!("expected ',' or ']' in array, got '{}'", b as char),
                    ))
                }
            }
        }
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.pos += 1; // {
        self.push_depth()?;
        self.skip_ws_and_comments();

        if self.peek().is_none() {
            return Err(self.error_here(ErrorKind::UnterminatedObject, "unterminated object"));
        }
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.pop_depth();
            return Ok(Value::from_object_in(
                Object::with_capacity_in(0, self.arena),
                self.arena,
            ));
        }

        let capacity = self.estimate_capacity();
        let mut object = Object::with_capacity_in(capacity, self.arena);

        // Entries are appended without per-entry duplicate handling; the
        // finalize pass after `}` establishes last-value-wins. Only the
        // forbid-duplicates mode pays for a lookup per key.
        let mut seen_keys: Option<AHashSet<Box<str>>> = if self.options.allow_duplicate_keys {
            None
        } else {
            Some(AHashSet::new())
        };

        loop {
            self.skip_ws_and_comments();

            let key = match self.peek() {
                Some(b'"') => self.parse_key(b'"')?,
                Some(b'\'') if self.options.allow_single_quotes => self.parse_key(b'\'')?,
                Some(b)
                    if self.options.allow_unquoted_keys && Self::is_ident_start(b) =>
                {
                    self.parse_unquoted_key()?
                }
                _ => {
                    return Err(self.error_here(
                        ErrorKind::UnterminatedObject,
                        "expected string key in object",
                    ))
                }
            };

            self.skip_ws_and_comments();
            self.expect(b':')?;

            let value = self.parse_value()?;

            if let Some(seen) = &mut seen_keys {
                if !seen.insert(Box::from(key.as_str())) {
                    return Err(self.error_here(
                        ErrorKind::DuplicateKey,
                        format!("duplicate key: \"{}\"", key.as_str()),
                    ));
                }
            }
            object.push_entry(key, value, self.arena);

            self.skip_ws_and_comments();
            match self.peek() {
                None => {
                    return Err(
                        self.error_here(ErrorKind::UnterminatedObject, "unterminated object")
                    )
                }
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws_and_comments();
                    if self.options.allow_trailing_commas && self.peek() == Some(b'}') {
                        self.pos += 1;
                        self.pop_depth();
                        object.finalize();
                        return Ok(Value::from_object_in(object, self.arena));
                    }
                }
                Some(b'}') => {
                    self.pos += 1;
                    self.pop_depth();
                    object.finalize();
                    return Ok(Value::from_object_in(object, self.arena));
                }
                Some(b) => {
                    return Err(self.error_here(
                        ErrorKind::UnexpectedCharacter,
                        format!("expected ',' or '}}' in object, got '{}'", b as char),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_ahead_estimates_top_level_commas() {
        // Large flat array: one estimate per element, strings with commas
        // and nested containers must not inflate the count.
        let mut text = String::from("[");
        for i in 0..40 {
            text.push_str(&format!("{{\"k\":\"a,b\",\"n\":[{i},2]}},"));
        }
        text.push_str("null]");
        let value = parse_slice(text.as_bytes(), &ParseOptions::strict()).unwrap();
        assert_eq!(value.len(), 41);
    }

    #[test]
    fn whitespace_fast_paths_cover_zero_one_two_and_many() {
        for ws in ["", " ", "  ", "   ", "                    \n\t "] {
            let text = format!("{ws}1{ws}");
            let value = parse_slice(text.as_bytes(), &ParseOptions::strict()).unwrap();
            assert_eq!(value.as_integer().unwrap(), 1);
        }
    }
}
