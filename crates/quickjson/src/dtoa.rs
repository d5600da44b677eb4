//! Fast number-to-ASCII conversion for the serializer.
//!
//! Integers use a two-digit pair table with a CLZ-based digit count so the
//! buffer is written front-to-back without reversal. Floats try an exact
//! integer form, then a fixed-point form with up to 9 decimal places, and
//! only then fall back to `ryu` for the shortest round-trip representation.

/// Two-digit pair table "00".."99"; halves the number of divisions.
static DIGIT_PAIRS: [u8; 200] = *b"\
0001020304050607080910111213141516171819\
2021222324252627282930313233343536373839\
4041424344454647484950515253545556575859\
6061626364656667686970717273747576777879\
8081828384858687888990919293949596979899";

/// Powers of ten as `u64`; index 0 is a sentinel so that
/// `POW10_U64[count_digits(v)]` is always in range.
static POW10_U64: [u64; 20] = [
    0,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
];

/// Powers of ten exactly representable as `f64`.
static POW10_F64: [f64; 16] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15,
];

/// Largest integer exactly representable in an IEEE 754 double (2^53).
const MAX_SAFE_INTEGER: f64 = 9007199254740992.0;

/// Number of decimal digits in `val` (1..=20).
///
/// log10(2) ~= 1233/4096; the approximation is corrected with one table
/// lookup, and compiles down to a CLZ instruction plus a compare.
#[inline]
pub(crate) fn count_digits(val: u64) -> usize {
    let bits = 64 - (val | 1).leading_zeros() as usize;
    let approx = (bits * 1233) >> 12;
    approx - usize::from(val < POW10_U64[approx]) + 1
}

/// Write `val` as decimal ASCII into `buf` (which must hold >= 20 bytes),
/// returning the number of bytes written.
pub(crate) fn write_u64(buf: &mut [u8], mut val: u64) -> usize {
    if val == 0 {
        buf[0] = b'0';
        return 1;
    }

    let len = count_digits(val);
    let mut p = len;

    while val >= 100 {
        let idx = ((val % 100) * 2) as usize;
        val /= 100;
        p -= 2;
        buf[p] = DIGIT_PAIRS[idx];
        buf[p + 1] = DIGIT_PAIRS[idx + 1];
    }

    if val >= 10 {
        let idx = (val * 2) as usize;
        buf[0] = DIGIT_PAIRS[idx];
        buf[1] = DIGIT_PAIRS[idx + 1];
    } else {
        buf[0] = b'0' + val as u8;
    }
    len
}

/// Write `val` as decimal ASCII into `buf` (>= 21 bytes), handling
/// `i64::MIN` without overflow.
pub(crate) fn write_i64(buf: &mut [u8], val: i64) -> usize {
    if val < 0 {
        buf[0] = b'-';
        1 + write_u64(&mut buf[1..], val.unsigned_abs())
    } else {
        write_u64(buf, val as u64)
    }
}

/// Format a finite double into `buf` (>= 40 bytes), returning the length.
///
/// The output is always a valid JSON number and always contains `.` or `e`
/// so it re-parses as a float. The caller handles NaN and infinities.
pub(crate) fn format_f64(buf: &mut [u8], mut val: f64) -> usize {
    debug_assert!(val.is_finite());
    let mut n = 0;

    if val.is_sign_negative() {
        if val == 0.0 {
            // JSON has no negative zero.
            buf[..3].copy_from_slice(b"0.0");
            return 3;
        }
        buf[0] = b'-';
        n = 1;
        val = -val;
    }

    // Exact integers: a large share of real-world JSON numbers (counters,
    // identifiers, timestamps).
    if val <= MAX_SAFE_INTEGER && val.floor() == val {
        n += write_u64(&mut buf[n..], val as u64);
        buf[n] = b'.';
        buf[n + 1] = b'0';
        return n + 2;
    }

    // Fixed point with k = 1..=9 decimal places: covers coordinates, sensor
    // readings, currency rates. If the scaled value is not an exact integer
    // the check rejects and the shortest-round-trip path runs instead.
    if val < 1e15 && val > 1e-6 {
        for k in 1..=9usize {
            let scaled = val * POW10_F64[k];
            if scaled > MAX_SAFE_INTEGER {
                break;
            }
            if scaled.floor() == scaled {
                let mut digits = [0u8; 24];
                let total = write_u64(&mut digits, scaled as u64);
                let int_digits = total as isize - k as isize;
                if int_digits <= 0 {
                    buf[n] = b'0';
                    buf[n + 1] = b'.';
                    n += 2;
                    for _ in 0..(-int_digits) {
                        buf[n] = b'0';
                        n += 1;
                    }
                    buf[n..n + total].copy_from_slice(&digits[..total]);
                    n += total;
                } else {
                    let id = int_digits as usize;
                    buf[n..n + id].copy_from_slice(&digits[..id]);
                    n += id;
                    buf[n] = b'.';
                    n += 1;
                    buf[n..n + k].copy_from_slice(&digits[id..id + k]);
                    n += k;
                }
                return n;
            }
        }
    }

    // Shortest round-trip form. ryu output for a finite positive double
    // always contains '.' or 'e'.
    let mut shortest = ryu::Buffer::new();
    let formatted = shortest.format_finite(val).as_bytes();
    buf[n..n + formatted.len()].copy_from_slice(formatted);
    n + formatted.len()
}
