//! Bounds-checked cursor over the `data` word stream.
//!
//! The wire format is a flat sequence of words. Variable-length fields are
//! length-prefixed: a count word followed by exactly that many elements (or
//! a fixed multiple of it). Every read checks the remaining length first and
//! fails with [`DecodeError::Truncated`] instead of reading past the end.

use overlore_types::ResourceAmount;

use crate::error::DecodeError;
use crate::word::{parse_word, to_count, to_u64};

/// Words per resource element: `(type, raw_amount)`.
const RESOURCE_WIDTH: usize = 2;

/// A read position within a word slice.
#[derive(Debug, Clone)]
pub struct WordCursor<'a> {
    words: &'a [String],
    pos: usize,
}

impl<'a> WordCursor<'a> {
    /// Start reading at the beginning of `words`.
    pub const fn new(words: &'a [String]) -> Self {
        Self { words, pos: 0 }
    }

    /// Number of words consumed so far.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Number of words left to read.
    pub const fn remaining(&self) -> usize {
        self.words.len().saturating_sub(self.pos)
    }

    /// Consume the next `n` words without interpreting them.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than `n` words remain; the
    /// cursor does not move in that case.
    pub fn read_array(&mut self, n: usize, field: &'static str) -> Result<&'a [String], DecodeError> {
        let words = self.words;
        let start = self.pos;
        let Some((end, slice)) = start
            .checked_add(n)
            .and_then(|end| words.get(start..end).map(|slice| (end, slice)))
        else {
            return Err(DecodeError::Truncated {
                field,
                needed: n,
                remaining: self.remaining(),
            });
        };
        self.pos = end;
        Ok(slice)
    }

    /// Consume one word and parse it.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] at end of stream, or a word parse
    /// error.
    pub fn read_word(&mut self, field: &'static str) -> Result<u128, DecodeError> {
        match self.read_array(1, field)? {
            [word] => parse_word(word),
            _ => Err(DecodeError::Truncated {
                field,
                needed: 1,
                remaining: 0,
            }),
        }
    }

    /// Consume one word as a `u64`.
    ///
    /// # Errors
    ///
    /// See [`WordCursor::read_word`]; also fails if the value exceeds `u64`.
    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        to_u64(self.read_word(field)?, field)
    }

    /// Consume a count word followed by that many words, each parsed as `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the declared count exceeds the
    /// remaining words.
    pub fn read_u64_array(&mut self, field: &'static str) -> Result<Vec<u64>, DecodeError> {
        let count = to_count(self.read_word(field)?, field)?;
        self.read_array(count, field)?
            .iter()
            .map(|word| to_u64(parse_word(word)?, field))
            .collect()
    }

    /// Consume a count word `M` followed by `2 * M` words of
    /// `(type, raw_amount)` pairs. Amounts are scaled down by
    /// [`ResourceAmount::WIRE_SCALE`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the pairs exceed the remaining
    /// words.
    pub fn read_resources(&mut self, field: &'static str) -> Result<Vec<ResourceAmount>, DecodeError> {
        let count = to_count(self.read_word(field)?, field)?;
        let width = count
            .checked_mul(RESOURCE_WIDTH)
            .ok_or(DecodeError::WordOutOfRange {
                field,
                value: u128::MAX,
            })?;
        self.read_array(width, field)?
            .chunks_exact(RESOURCE_WIDTH)
            .map(|pair| match pair {
                [resource_type, raw_amount] => Ok(ResourceAmount {
                    resource_type: to_u64(parse_word(resource_type)?, field)?,
                    amount: to_u64(
                        parse_word(raw_amount)?
                            .checked_div(ResourceAmount::WIRE_SCALE)
                            .unwrap_or_default(),
                        field,
                    )?,
                }),
                _ => Err(DecodeError::Truncated {
                    field,
                    needed: RESOURCE_WIDTH,
                    remaining: pair.len(),
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn words(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|w| (*w).to_owned()).collect()
    }

    #[test]
    fn read_array_consumes_exactly_n() {
        let data = words(&["0x1", "0x2", "0x3"]);
        let mut cursor = WordCursor::new(&data);
        assert_eq!(cursor.read_array(2, "f").unwrap().len(), 2);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn overlong_read_fails_without_moving() {
        let data = words(&["0x1"]);
        let mut cursor = WordCursor::new(&data);
        let err = cursor.read_array(2, "f").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated {
                needed: 2,
                remaining: 1,
                ..
            }
        ));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn length_prefixed_ids() {
        let data = words(&["0x3", "0xa", "0xb", "0xc", "0x63"]);
        let mut cursor = WordCursor::new(&data);
        assert_eq!(cursor.read_u64_array("ids").unwrap(), vec![10, 11, 12]);
        assert_eq!(cursor.read_word("next").unwrap(), 99);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn count_exceeding_stream_is_truncated() {
        let data = words(&["0x5", "0x1", "0x2"]);
        let mut cursor = WordCursor::new(&data);
        assert!(matches!(
            cursor.read_u64_array("ids"),
            Err(DecodeError::Truncated { needed: 5, .. })
        ));
    }

    #[test]
    fn resources_are_scaled_by_wire_factor() {
        // 5000 raw -> 5, 1999 raw -> 1 (integer division).
        let data = words(&["0x2", "0x1", "0x1388", "0x2", "0x7cf"]);
        let mut cursor = WordCursor::new(&data);
        let resources = cursor.read_resources("res").unwrap();
        assert_eq!(
            resources,
            vec![
                ResourceAmount {
                    resource_type: 1,
                    amount: 5
                },
                ResourceAmount {
                    resource_type: 2,
                    amount: 1
                },
            ]
        );
    }

    #[test]
    fn resource_pairs_need_two_words_each() {
        let data = words(&["0x2", "0x1", "0x1388", "0x2"]);
        let mut cursor = WordCursor::new(&data);
        assert!(matches!(
            cursor.read_resources("res"),
            Err(DecodeError::Truncated { needed: 4, .. })
        ));
    }

    #[test]
    fn empty_arrays_are_fine() {
        let data = words(&["0x0", "0x0"]);
        let mut cursor = WordCursor::new(&data);
        assert!(cursor.read_u64_array("ids").unwrap().is_empty());
        assert!(cursor.read_resources("res").unwrap().is_empty());
    }
}
