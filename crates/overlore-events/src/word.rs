//! Hex word parsing.
//!
//! Words arrive as base-16 strings, usually `0x`-prefixed and often
//! zero-padded to the full 64-digit field-element width. Values are decoded
//! into `u128`; every field this service reads fits comfortably, and wider
//! values are rejected rather than truncated.

use crate::error::DecodeError;

/// Hex digits that fit in a `u128`.
const MAX_HEX_DIGITS: usize = 32;

/// Strip an optional `0x`/`0X` prefix and any leading zeros.
///
/// Returns `None` if the word is empty or contains a non-hex character.
/// A word consisting only of zeros normalizes to the empty string.
fn significant_digits(word: &str) -> Option<&str> {
    let digits = word
        .strip_prefix("0x")
        .or_else(|| word.strip_prefix("0X"))
        .unwrap_or(word);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(digits.trim_start_matches('0'))
}

/// Normalize a word for equality comparison (lower-case, no prefix, no
/// leading zeros). Invalid words are returned as-is, lower-cased, so they
/// never compare equal to a valid selector.
pub fn normalize_word(word: &str) -> String {
    significant_digits(word).map_or_else(|| word.to_ascii_lowercase(), str::to_ascii_lowercase)
}

/// Parse one hex word.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidWord`] for empty or non-hex input and
/// [`DecodeError::WordOutOfRange`] for values wider than 128 bits.
pub fn parse_word(word: &str) -> Result<u128, DecodeError> {
    let digits = significant_digits(word).ok_or_else(|| DecodeError::InvalidWord(word.to_owned()))?;
    if digits.is_empty() {
        return Ok(0);
    }
    if digits.len() > MAX_HEX_DIGITS {
        return Err(DecodeError::WordOutOfRange {
            field: "word",
            value: u128::MAX,
        });
    }
    u128::from_str_radix(digits, 16).map_err(|e| DecodeError::InvalidWord(format!("{word}: {e}")))
}

/// Narrow a decoded word into a `u64` field.
///
/// # Errors
///
/// Returns [`DecodeError::WordOutOfRange`] if the value does not fit.
pub fn to_u64(value: u128, field: &'static str) -> Result<u64, DecodeError> {
    u64::try_from(value)
        .ok()
        .ok_or(DecodeError::WordOutOfRange { field, value })
}

/// Narrow a decoded word into an `i64` field (timestamps, stored columns).
///
/// # Errors
///
/// Returns [`DecodeError::WordOutOfRange`] if the value does not fit.
pub fn to_i64(value: u128, field: &'static str) -> Result<i64, DecodeError> {
    i64::try_from(value)
        .ok()
        .ok_or(DecodeError::WordOutOfRange { field, value })
}

/// Narrow a decoded word into a `usize` count.
///
/// # Errors
///
/// Returns [`DecodeError::WordOutOfRange`] if the value does not fit.
pub fn to_count(value: u128, field: &'static str) -> Result<usize, DecodeError> {
    usize::try_from(value)
        .ok()
        .ok_or(DecodeError::WordOutOfRange { field, value })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parses_prefixed_and_bare_words() {
        assert_eq!(parse_word("0x1388").unwrap(), 5000);
        assert_eq!(parse_word("0X1a").unwrap(), 26);
        assert_eq!(parse_word("ff").unwrap(), 255);
        assert_eq!(parse_word("0x0").unwrap(), 0);
    }

    #[test]
    fn accepts_full_width_zero_padding() {
        let padded = format!("0x{}2a", "0".repeat(62));
        assert_eq!(parse_word(&padded).unwrap(), 42);
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "0x", "0xzz", "+1f", "12 ", "-0x1"] {
            assert!(
                matches!(parse_word(bad), Err(DecodeError::InvalidWord(_))),
                "{bad:?} should be invalid"
            );
        }
    }

    #[test]
    fn rejects_words_wider_than_u128() {
        let wide = format!("0x1{}", "0".repeat(32));
        assert!(matches!(
            parse_word(&wide),
            Err(DecodeError::WordOutOfRange { .. })
        ));
    }

    #[test]
    fn normalization_ignores_case_prefix_and_padding() {
        assert_eq!(normalize_word("0x00ABc"), "abc");
        assert_eq!(normalize_word("abc"), "abc");
        assert_eq!(normalize_word("0xzz"), "0xzz");
    }

    #[test]
    fn narrowing_checks_range() {
        assert_eq!(to_u64(7, "x").unwrap(), 7);
        assert!(to_i64(u128::from(u64::MAX), "ts").is_err());
        assert!(to_u64(u128::MAX, "x").is_err());
    }
}
