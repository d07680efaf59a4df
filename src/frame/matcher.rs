//! Byte-at-a-time delimiter recognition.

use bytes::Bytes;

/// Tracks how much of the delimiter the most recent bytes have matched.
///
/// Matching is deliberately naive: a mismatch resets the cursor to zero and
/// the mismatching byte is not re-tested against the first delimiter byte.
/// A delimiter with a repeated prefix such as `AA AA BB` is therefore not
/// found in the input `AA AA AA BB`.
///
/// # Examples
///
/// ```
/// use wiretether::DelimiterMatcher;
///
/// let mut matcher = DelimiterMatcher::new(&b"\r\n"[..]);
/// assert!(!matcher.advance(b'\r'));
/// assert_eq!(matcher.cursor(), 1);
/// assert!(matcher.advance(b'\n'));
/// assert_eq!(matcher.cursor(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct DelimiterMatcher {
    delimiter: Bytes,
    cursor: usize,
}

impl DelimiterMatcher {
    /// Create a matcher for `delimiter`.
    ///
    /// An empty delimiter never matches; client configuration rejects it
    /// before a matcher is built.
    #[must_use]
    pub fn new(delimiter: impl Into<Bytes>) -> Self {
        Self {
            delimiter: delimiter.into(),
            cursor: 0,
        }
    }

    /// Feed the next byte, returning `true` when it completes the delimiter.
    ///
    /// A full match resets the cursor so the next byte starts a fresh match.
    pub fn advance(&mut self, byte: u8) -> bool {
        if self.delimiter.get(self.cursor) != Some(&byte) {
            self.cursor = 0;
            return false;
        }
        self.cursor += 1;
        if self.cursor == self.delimiter.len() {
            self.cursor = 0;
            return true;
        }
        false
    }

    /// Number of delimiter bytes matched so far.
    #[must_use]
    pub const fn cursor(&self) -> usize { self.cursor }

    /// Forget any partial match.
    pub fn reset(&mut self) { self.cursor = 0; }

    /// The delimiter being matched.
    #[must_use]
    pub fn delimiter(&self) -> &[u8] { &self.delimiter }
}
