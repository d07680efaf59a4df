//! Accumulates inbound bytes into delimiter-terminated frames.

use bytes::{BufMut, Bytes, BytesMut};

use super::DelimiterMatcher;

/// Splits bursts of inbound bytes into completed frames.
///
/// Bytes that do not complete the delimiter are appended to a pending buffer.
/// When the delimiter completes, the pending bytes preceding it are emitted
/// as a frame and the buffer is cleared. Bytes after the last delimiter stay
/// pending until a later burst completes them.
///
/// # Examples
///
/// ```
/// use wiretether::FrameAssembler;
///
/// let mut assembler = FrameAssembler::new(&b"\r\n"[..]);
/// let frames = assembler.ingest(b"HELLO\r\nWOR");
/// assert_eq!(frames, vec![&b"HELLO"[..]]);
/// assert_eq!(assembler.pending(), b"WOR");
///
/// let frames = assembler.ingest(b"LD\r\n");
/// assert_eq!(frames, vec![&b"WORLD"[..]]);
/// ```
#[derive(Debug)]
pub struct FrameAssembler {
    matcher: DelimiterMatcher,
    pending: BytesMut,
}

impl FrameAssembler {
    /// Create an assembler splitting on `delimiter`.
    #[must_use]
    pub fn new(delimiter: impl Into<Bytes>) -> Self {
        Self {
            matcher: DelimiterMatcher::new(delimiter),
            pending: BytesMut::new(),
        }
    }

    /// Process one burst of bytes and return the frames it completed.
    ///
    /// The delimiter cursor starts from zero for every burst, so a delimiter
    /// split across two bursts is not recognised. The pending buffer carries
    /// over between bursts.
    pub fn ingest(&mut self, burst: &[u8]) -> Vec<Bytes> {
        self.matcher.reset();
        let mut frames = Vec::new();
        for &byte in burst {
            if self.matcher.advance(byte) {
                // Earlier delimiter bytes were buffered while the match was partial.
                let held = self.matcher.delimiter().len() - 1;
                let keep = self.pending.len().saturating_sub(held);
                self.pending.truncate(keep);
                frames.push(self.pending.split().freeze());
            } else {
                self.pending.put_u8(byte);
            }
        }
        frames
    }

    /// Bytes received since the last completed frame.
    #[must_use]
    pub fn pending(&self) -> &[u8] { &self.pending }

    /// The delimiter frames are split on.
    #[must_use]
    pub fn delimiter(&self) -> &[u8] { self.matcher.delimiter() }
}
