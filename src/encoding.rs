//! Text encodings used to decode received frames and encode outbound text.
//!
//! Only single-byte and UTF-8 encodings are supported. Characters that cannot
//! be represented are replaced with `?` on encode, and invalid input decodes
//! to `?` (ASCII) or U+FFFD (UTF-8).

use std::{fmt, str::FromStr};

use crate::client::ConfigError;

/// Encoding applied to frame payloads and outbound text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// 7-bit ASCII. Bytes above `0x7F` decode to `?`.
    #[default]
    Ascii,
    /// UTF-8 with lossy decoding.
    Utf8,
    /// ISO-8859-1, mapping every byte to the code point of the same value.
    Latin1,
}

impl TextEncoding {
    /// Decode `bytes` into a string.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiretether::TextEncoding;
    ///
    /// assert_eq!(TextEncoding::Ascii.decode(b"OK\xff"), "OK?");
    /// assert_eq!(TextEncoding::Latin1.decode(b"\xe9"), "\u{e9}");
    /// ```
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
                .collect(),
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    /// Encode `text` into bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiretether::TextEncoding;
    ///
    /// assert_eq!(TextEncoding::Ascii.encode("caf\u{e9}"), b"caf?".to_vec());
    /// assert_eq!(TextEncoding::Utf8.encode("\u{e9}"), vec![0xc3, 0xa9]);
    /// ```
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Ascii => text
                .chars()
                .map(|c| u8::try_from(c).ok().filter(u8::is_ascii).unwrap_or(b'?'))
                .collect(),
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c).unwrap_or(b'?'))
                .collect(),
        }
    }

    /// Canonical label of the encoding.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Utf8 => "utf-8",
            Self::Latin1 => "iso-8859-1",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

impl FromStr for TextEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Self::Latin1),
            _ => Err(ConfigError::UnknownEncoding(s.to_owned())),
        }
    }
}
