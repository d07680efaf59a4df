//! Delimiter framing for the inbound byte stream.
//!
//! [`DelimiterMatcher`] recognises the configured delimiter one byte at a
//! time and [`FrameAssembler`] accumulates the bytes between delimiters into
//! completed frames.

pub mod assembler;
pub mod matcher;

pub use assembler::FrameAssembler;
pub use matcher::DelimiterMatcher;

use crate::encoding::TextEncoding;

/// Encode `text` and terminate it with `delimiter`.
///
/// The delimiter is only appended when the text does not already end with
/// the delimiter decoded through `encoding`.
pub(crate) fn framed_payload(text: &str, delimiter: &[u8], encoding: TextEncoding) -> Vec<u8> {
    let suffix = encoding.decode(delimiter);
    let mut payload = encoding.encode(text);
    if !text.ends_with(suffix.as_str()) {
        payload.extend_from_slice(delimiter);
    }
    payload
}
