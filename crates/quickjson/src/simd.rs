//! SIMD-accelerated byte scanners for the parser and serializer.
//!
//! Three predicates, each available as an AVX2 loop (32 bytes/iteration,
//! runtime-detected), an SSE2 loop (16 bytes/iteration, x86_64 baseline),
//! and a scalar fallback used on other architectures and for short tails.
//! The scalar and SIMD paths are byte-identical in behavior.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;
#[cfg(target_arch = "x86_64")]
use std::sync::atomic::{AtomicU8, Ordering};

/// Cached CPU capability: 0 = undetected, 1 = SSE2 only, 2 = AVX2.
#[cfg(target_arch = "x86_64")]
static CPU_LEVEL: AtomicU8 = AtomicU8::new(0);

#[cfg(target_arch = "x86_64")]
#[inline]
fn cpu_level() -> u8 {
    let level = CPU_LEVEL.load(Ordering::Relaxed);
    if level != 0 {
        return level;
    }
    let detected = if is_x86_feature_detected!("avx2") { 2 } else { 1 };
    CPU_LEVEL.store(detected, Ordering::Relaxed);
    detected
}

/// Advance past ASCII whitespace (space, tab, newline, carriage return),
/// returning the position of the first non-whitespace byte (or `input.len()`).
#[inline]
pub(crate) fn skip_whitespace(input: &[u8], pos: usize) -> usize {
    debug_assert!(pos <= input.len());
    #[cfg(target_arch = "x86_64")]
    {
        if input.len() - pos >= 16 {
            return if cpu_level() == 2 {
                // SAFETY: AVX2 support was just verified.
                unsafe { skip_whitespace_avx2(input, pos) }
            } else {
                // SAFETY: SSE2 is part of the x86_64 baseline.
                unsafe { skip_whitespace_sse2(input, pos) }
            };
        }
    }
    skip_whitespace_scalar(input, pos)
}

/// Advance until `"` or `\`, returning the delimiter position (or `input.len()`).
#[inline]
pub(crate) fn find_string_delimiter(input: &[u8], pos: usize) -> usize {
    debug_assert!(pos <= input.len());
    #[cfg(target_arch = "x86_64")]
    {
        if input.len() - pos >= 16 {
            return if cpu_level() == 2 {
                // SAFETY: AVX2 support was just verified.
                unsafe { find_string_delimiter_avx2(input, pos) }
            } else {
                // SAFETY: SSE2 is part of the x86_64 baseline.
                unsafe { find_string_delimiter_sse2(input, pos) }
            };
        }
    }
    find_string_delimiter_scalar(input, pos)
}

/// Advance until a byte that needs escaping in a JSON string: a control
/// byte below 0x20, `"`, `\`, or (when `ENSURE_ASCII`) any byte >= 0x80.
#[inline]
pub(crate) fn find_needs_escape<const ENSURE_ASCII: bool>(input: &[u8], pos: usize) -> usize {
    debug_assert!(pos <= input.len());
    #[cfg(target_arch = "x86_64")]
    {
        if input.len() - pos >= 16 {
            return if cpu_level() == 2 {
                // SAFETY: AVX2 support was just verified.
                unsafe { find_needs_escape_avx2(input, pos, ENSURE_ASCII) }
            } else {
                // SAFETY: SSE2 is part of the x86_64 baseline.
                unsafe { find_needs_escape_sse2(input, pos, ENSURE_ASCII) }
            };
        }
    }
    find_needs_escape_scalar::<ENSURE_ASCII>(input, pos)
}

// ─── Scalar reference implementations ───

fn skip_whitespace_scalar(input: &[u8], mut pos: usize) -> usize {
    while pos < input.len() {
        match input[pos] {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            _ => break,
        }
    }
    pos
}

fn find_string_delimiter_scalar(input: &[u8], mut pos: usize) -> usize {
    while pos < input.len() {
        let b = input[pos];
        if b == b'"' || b == b'\\' {
            break;
        }
        pos += 1;
    }
    pos
}

fn find_needs_escape_scalar<const ENSURE_ASCII: bool>(input: &[u8], mut pos: usize) -> usize {
    while pos < input.len() {
        let b = input[pos];
        if b < 0x20 || b == b'"' || b == b'\\' {
            break;
        }
        if ENSURE_ASCII && b >= 0x80 {
            break;
        }
        pos += 1;
    }
    pos
}

// ─── x86_64: SSE2 (baseline) and AVX2 (runtime-detected) ───

#[cfg(target_arch = "x86_64")]
unsafe fn skip_whitespace_sse2(input: &[u8], mut pos: usize) -> usize {
    let len = input.len();
    let ptr = input.as_ptr();
    let space = _mm_set1_epi8(b' ' as i8);
    let tab = _mm_set1_epi8(b'\t' as i8);
    let nl = _mm_set1_epi8(b'\n' as i8);
    let cr = _mm_set1_epi8(b'\r' as i8);

    while pos + 16 <= len {
        let chunk = _mm_loadu_si128(ptr.add(pos) as *const __m128i);
        let cmp = _mm_or_si128(
            _mm_or_si128(_mm_cmpeq_epi8(chunk, space), _mm_cmpeq_epi8(chunk, tab)),
            _mm_or_si128(_mm_cmpeq_epi8(chunk, nl), _mm_cmpeq_epi8(chunk, cr)),
        );
        let mask = _mm_movemask_epi8(cmp) as u32;
        if mask == 0xFFFF {
            pos += 16;
            continue;
        }
        return pos + (!mask & 0xFFFF).trailing_zeros() as usize;
    }
    skip_whitespace_scalar(input, pos)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn skip_whitespace_avx2(input: &[u8], mut pos: usize) -> usize {
    let len = input.len();
    let ptr = input.as_ptr();
    let space = _mm256_set1_epi8(b' ' as i8);
    let tab = _mm256_set1_epi8(b'\t' as i8);
    let nl = _mm256_set1_epi8(b'\n' as i8);
    let cr = _mm256_set1_epi8(b'\r' as i8);

    while pos + 32 <= len {
        let chunk = _mm256_loadu_si256(ptr.add(pos) as *const __m256i);
        let cmp = _mm256_or_si256(
            _mm256_or_si256(
                _mm256_cmpeq_epi8(chunk, space),
                _mm256_cmpeq_epi8(chunk, tab),
            ),
            _mm256_or_si256(_mm256_cmpeq_epi8(chunk, nl), _mm256_cmpeq_epi8(chunk, cr)),
        );
        let mask = _mm256_movemask_epi8(cmp) as u32;
        if mask == u32::MAX {
            pos += 32;
            continue;
        }
        return pos + (!mask).trailing_zeros() as usize;
    }
    skip_whitespace_sse2(input, pos)
}

#[cfg(target_arch = "x86_64")]
unsafe fn find_string_delimiter_sse2(input: &[u8], mut pos: usize) -> usize {
    let len = input.len();
    let ptr = input.as_ptr();
    let quote = _mm_set1_epi8(b'"' as i8);
    let bslash = _mm_set1_epi8(b'\\' as i8);

    while pos + 16 <= len {
        let chunk = _mm_loadu_si128(ptr.add(pos) as *const __m128i);
        let cmp = _mm_or_si128(_mm_cmpeq_epi8(chunk, quote), _mm_cmpeq_epi8(chunk, bslash));
        let mask = _mm_movemask_epi8(cmp) as u32;
        if mask != 0 {
            return pos + mask.trailing_zeros() as usize;
        }
        pos += 16;
    }
    find_string_delimiter_scalar(input, pos)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn find_string_delimiter_avx2(input: &[u8], mut pos: usize) -> usize {
    let len = input.len();
    let ptr = input.as_ptr();
    let quote = _mm256_set1_epi8(b'"' as i8);
    let bslash = _mm256_set1_epi8(b'\\' as i8);

    while pos + 32 <= len {
        let chunk = _mm256_loadu_si256(ptr.add(pos) as *const __m256i);
        let cmp = _mm256_or_si256(
            _mm256_cmpeq_epi8(chunk, quote),
            _mm256_cmpeq_epi8(chunk, bslash),
        );
        let mask = _mm256_movemask_epi8(cmp) as u32;
        if mask != 0 {
            return pos + mask.trailing_zeros() as usize;
        }
        pos += 32;
    }
    find_string_delimiter_sse2(input, pos)
}

#[cfg(target_arch = "x86_64")]
unsafe fn find_needs_escape_sse2(input: &[u8], mut pos: usize, ensure_ascii: bool) -> usize {
    let len = input.len();
    let ptr = input.as_ptr();
    let quote = _mm_set1_epi8(b'"' as i8);
    let bslash = _mm_set1_epi8(b'\\' as i8);
    // Unsigned `b < 0x20` via sign-flip: xor with 0x80, then signed compare
    // against 0x80 + 0x20.
    let bias = _mm_set1_epi8(0x80u8 as i8);
    let thresh = _mm_set1_epi8(0xA0u8 as i8);

    while pos + 16 <= len {
        let chunk = _mm_loadu_si128(ptr.add(pos) as *const __m128i);
        let biased = _mm_xor_si128(chunk, bias);
        let ctrl = _mm_cmplt_epi8(biased, thresh);
        let special = _mm_or_si128(_mm_cmpeq_epi8(chunk, quote), _mm_cmpeq_epi8(chunk, bslash));
        let mut needs = _mm_or_si128(ctrl, special);
        if ensure_ascii {
            // Signed `b < 0` is exactly `b >= 0x80` unsigned.
            let high = _mm_cmplt_epi8(chunk, _mm_setzero_si128());
            needs = _mm_or_si128(needs, high);
        }
        let mask = _mm_movemask_epi8(needs) as u32;
        if mask != 0 {
            return pos + mask.trailing_zeros() as usize;
        }
        pos += 16;
    }
    if ensure_ascii {
        find_needs_escape_scalar::<true>(input, pos)
    } else {
        find_needs_escape_scalar::<false>(input, pos)
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn find_needs_escape_avx2(input: &[u8], mut pos: usize, ensure_ascii: bool) -> usize {
    let len = input.len();
    let ptr = input.as_ptr();
    let quote = _mm256_set1_epi8(b'"' as i8);
    let bslash = _mm256_set1_epi8(b'\\' as i8);
    let bias = _mm256_set1_epi8(0x80u8 as i8);
    let thresh = _mm256_set1_epi8(0xA0u8 as i8);

    while pos + 32 <= len {
        let chunk = _mm256_loadu_si256(ptr.add(pos) as *const __m256i);
        let biased = _mm256_xor_si256(chunk, bias);
        let ctrl = _mm256_cmpgt_epi8(thresh, biased);
        let special = _mm256_or_si256(
            _mm256_cmpeq_epi8(chunk, quote),
            _mm256_cmpeq_epi8(chunk, bslash),
        );
        let mut needs = _mm256_or_si256(ctrl, special);
        if ensure_ascii {
            let high = _mm256_cmpgt_epi8(_mm256_setzero_si256(), chunk);
            needs = _mm256_or_si256(needs, high);
        }
        let mask = _mm256_movemask_epi8(needs) as u32;
        if mask != 0 {
            return pos + mask.trailing_zeros() as usize;
        }
        pos += 32;
    }
    find_needs_escape_sse2(input, pos, ensure_ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: &[usize] = &[
        0, 1, 7, 15, 16, 17, 31, 32, 33, 63, 64, 65, 100, 127, 128, 255, 256, 512, 1024,
    ];

    /// Deterministic byte generator, avoids pulling in an RNG crate.
    fn pseudo_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed | 1;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 33) as u8
            })
            .collect()
    }

    #[test]
    fn whitespace_matches_scalar_on_all_sizes() {
        for &size in SIZES {
            let mut input = vec![b' '; size];
            // Flip one byte at each position to a non-whitespace character.
            for stop in 0..=size {
                if stop < size {
                    input[stop] = b'x';
                }
                assert_eq!(
                    skip_whitespace(&input, 0),
                    skip_whitespace_scalar(&input, 0),
                    "size {size}, stop {stop}"
                );
                assert_eq!(skip_whitespace(&input, 0), stop);
                if stop < size {
                    input[stop] = b' ';
                }
            }
        }
    }

    #[test]
    fn string_delimiter_matches_scalar_on_all_sizes() {
        for &size in SIZES {
            for seed in [3, 17, 255] {
                let mut input = pseudo_bytes(size, seed);
                for b in &mut input {
                    // Keep the haystack free of accidental delimiters first.
                    if *b == b'"' || *b == b'\\' {
                        *b = b'a';
                    }
                }
                assert_eq!(find_string_delimiter(&input, 0), size);
                for (pos, delim) in [(size / 2, b'"'), (size.saturating_sub(1), b'\\')] {
                    if size == 0 {
                        continue;
                    }
                    let saved = input[pos];
                    input[pos] = delim;
                    assert_eq!(
                        find_string_delimiter(&input, 0),
                        find_string_delimiter_scalar(&input, 0),
                        "size {size}, pos {pos}"
                    );
                    input[pos] = saved;
                }
            }
        }
    }

    #[test]
    fn needs_escape_matches_scalar_on_all_sizes() {
        for &size in SIZES {
            for seed in [1, 99, 1234567] {
                let input = pseudo_bytes(size, seed);
                assert_eq!(
                    find_needs_escape::<false>(&input, 0),
                    find_needs_escape_scalar::<false>(&input, 0),
                    "plain, size {size}, seed {seed}"
                );
                assert_eq!(
                    find_needs_escape::<true>(&input, 0),
                    find_needs_escape_scalar::<true>(&input, 0),
                    "ascii, size {size}, seed {seed}"
                );
            }
        }
    }

    #[test]
    fn needs_escape_distinguishes_high_bytes() {
        let mut input = vec![b'a'; 40];
        input[33] = 0xC3;
        assert_eq!(find_needs_escape::<false>(&input, 0), 40);
        assert_eq!(find_needs_escape::<true>(&input, 0), 33);
        input[5] = 0x1F;
        assert_eq!(find_needs_escape::<false>(&input, 0), 5);
    }

    #[test]
    fn scanners_respect_start_position() {
        let input = b"   \"abc\\def   ";
        assert_eq!(skip_whitespace(input, 3), 3);
        assert_eq!(find_string_delimiter(input, 4), 7);
        assert_eq!(skip_whitespace(input, input.len()), input.len());
    }
}
