//! Base62 codec for short keys.
//!
//! Digits are ordered `0-9`, `A-Z`, `a-z`, giving values `0..62`. Encoding
//! never pads, so every non-negative integer has exactly one textual form.

use thiserror::Error;

/// Number of symbols in the alphabet.
pub const BASE: u64 = 62;

/// The base62 alphabet, indexed by digit value.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Marker for bytes outside the alphabet in [`REVERSE`].
const INVALID: u8 = u8::MAX;

/// Byte to digit value lookup, built at compile time.
const REVERSE: [u8; 256] = build_reverse();

const fn build_reverse() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Errors produced while decoding a base62 string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A byte outside `0-9A-Za-z` was found.
    #[error("invalid base62 character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("cannot decode an empty string")]
    Empty,

    /// The value does not fit in 64 bits.
    #[error("base62 value of {input:?} overflows u64")]
    Overflow { input: String },
}

/// Encodes `n` as the shortest base62 string.
///
/// `encode(0)` is `"0"`.
///
/// # Examples
///
/// ```
/// use reurl::domain::keyspace::codec::encode;
///
/// assert_eq!(encode(0), "0");
/// assert_eq!(encode(61), "z");
/// assert_eq!(encode(62), "10");
/// ```
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return char::from(ALPHABET[0]).to_string();
    }

    // 62^11 > u64::MAX
    let mut buf = [0u8; 11];
    let mut start = buf.len();
    while n > 0 {
        start -= 1;
        buf[start] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    buf[start..].iter().copied().map(char::from).collect()
}

/// Decodes a base62 string, most significant digit first.
///
/// # Errors
///
/// - [`DecodeError::InvalidCharacter`] on the first byte outside the alphabet
/// - [`DecodeError::Empty`] for `""`
/// - [`DecodeError::Overflow`] if the value exceeds `u64::MAX`
///
/// # Examples
///
/// ```
/// use reurl::domain::keyspace::codec::decode;
///
/// assert_eq!(decode("10"), Ok(62));
/// assert!(decode("a-b").is_err());
/// ```
pub fn decode(s: &str) -> Result<u64, DecodeError> {
    if s.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut value: u64 = 0;
    for (position, byte) in s.bytes().enumerate() {
        let digit = digit_value(byte).ok_or_else(|| invalid_character(s, position))?;

        value = value
            .checked_mul(BASE)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or_else(|| DecodeError::Overflow {
                input: s.to_string(),
            })?;
    }

    Ok(value)
}

/// Checks that `s` is a non-empty run of base62 digits, without computing
/// its value.
///
/// # Errors
///
/// [`DecodeError::Empty`] or [`DecodeError::InvalidCharacter`], as for [`decode`].
pub fn validate(s: &str) -> Result<(), DecodeError> {
    if s.is_empty() {
        return Err(DecodeError::Empty);
    }

    match s.bytes().position(|byte| digit_value(byte).is_none()) {
        Some(position) => Err(invalid_character(s, position)),
        None => Ok(()),
    }
}

fn invalid_character(s: &str, position: usize) -> DecodeError {
    DecodeError::InvalidCharacter {
        character: s[position..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER),
        position,
    }
}

/// Returns the digit value of `byte`, or `None` if it is not in the alphabet.
#[inline]
pub fn digit_value(byte: u8) -> Option<u8> {
    match REVERSE[byte as usize] {
        INVALID => None,
        value => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_is_unique_and_ordered() {
        let mut seen = std::collections::HashSet::new();
        for (i, &b) in ALPHABET.iter().enumerate() {
            assert!(seen.insert(b));
            assert_eq!(digit_value(b), Some(i as u8));
        }
        assert_eq!(seen.len(), 62);
    }

    #[test]
    fn test_encode_zero_is_first_character() {
        assert_eq!(encode(0), "0");
        assert_eq!(decode("0"), Ok(0));
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "A");
        assert_eq!(encode(35), "Z");
        assert_eq!(encode(36), "a");
        assert_eq!(encode(61), "z");
        assert_eq!(encode(62), "10");
        assert_eq!(encode(3843), "zz");
        assert_eq!(encode(238_327), "zzz");
        assert_eq!(encode(238_328), "1000");
    }

    #[test]
    fn test_decode_ten_is_sixty_two() {
        assert_eq!(decode("10"), Ok(62));
    }

    #[test]
    fn test_round_trip_three_digit_keyspace() {
        for n in 0..62u64.pow(3) {
            assert_eq!(decode(&encode(n)), Ok(n), "round trip failed for {n}");
        }
    }

    #[test]
    fn test_round_trip_u64_max() {
        let s = encode(u64::MAX);
        assert_eq!(s.len(), 11);
        assert_eq!(decode(&s), Ok(u64::MAX));
    }

    #[test]
    fn test_encode_never_emits_leading_zero() {
        for n in 1..10_000u64 {
            assert!(!encode(n).starts_with('0'));
        }
    }

    #[test]
    fn test_decode_out_of_alphabet_characters() {
        for input in ["-", "_", "!!", " ", "-_.~", "é"] {
            assert!(
                matches!(decode(input), Err(DecodeError::InvalidCharacter { .. })),
                "expected InvalidCharacter for {input:?}"
            );
        }
    }

    #[test]
    fn test_decode_reports_first_invalid_position() {
        let err = decode("ab$c").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidCharacter {
                character: '$',
                position: 2
            }
        );
    }

    #[test]
    fn test_decode_multibyte_character() {
        let err = decode("aé").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidCharacter {
                character: 'é',
                position: 1
            }
        );
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(""), Err(DecodeError::Empty));
    }

    #[test]
    fn test_decode_overflow() {
        let err = decode("zzzzzzzzzzzz").unwrap_err();
        assert!(matches!(err, DecodeError::Overflow { .. }));
    }

    #[test]
    fn test_decode_leading_zero_is_accepted() {
        assert_eq!(decode("01"), Ok(1));
        assert_ne!(encode(decode("01").unwrap()), "01");
    }

    #[test]
    fn test_validate_without_decoding() {
        assert_eq!(validate("zzzzzzzzzzzzzzzzzzzz"), Ok(()));
        assert_eq!(validate(""), Err(DecodeError::Empty));
        assert_eq!(
            validate("zzzzzzzzzzzzzzzz-"),
            Err(DecodeError::InvalidCharacter {
                character: '-',
                position: 16
            })
        );
    }
}
