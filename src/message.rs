//! Messages delivered with frame and burst events.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use bytes::Bytes;

use crate::{
    client::{ClientConfig, ClientError, Link},
    encoding::TextEncoding,
    frame::framed_payload,
};

/// Bytes received from the peer together with the means to answer it.
///
/// Text is decoded on demand with the client's encoding, trimmed when
/// auto-trim is enabled. Replies go to the connection the bytes arrived on;
/// once that connection is gone they fail with [`ClientError::NotConnected`]
/// even if the client has reconnected since.
#[derive(Clone)]
pub struct Message {
    data: Bytes,
    encoding: TextEncoding,
    auto_trim: bool,
    delimiter: Bytes,
    link: Weak<Link>,
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("data", &self.data)
            .field("encoding", &self.encoding)
            .field("auto_trim", &self.auto_trim)
            .finish_non_exhaustive()
    }
}

impl Message {
    pub(crate) fn new(data: Bytes, config: &ClientConfig, link: Weak<Link>) -> Self {
        Self {
            data,
            encoding: config.encoding(),
            auto_trim: config.auto_trim(),
            delimiter: config.delimiter().clone(),
            link,
        }
    }

    /// Raw received bytes.
    #[must_use]
    pub fn data(&self) -> &Bytes { &self.data }

    /// Received bytes decoded as text.
    #[must_use]
    pub fn text(&self) -> String {
        let text = self.encoding.decode(&self.data);
        if self.auto_trim {
            text.trim().to_owned()
        } else {
            text
        }
    }

    /// Whether the originating connection is still open.
    #[must_use]
    pub fn can_reply(&self) -> bool { self.link.upgrade().is_some_and(|link| link.is_active()) }

    /// Send raw bytes back to the peer.
    ///
    /// # Errors
    /// Returns [`ClientError::NotConnected`] if the connection is gone and
    /// [`ClientError::Io`] if the write fails.
    pub async fn reply(&self, data: &[u8]) -> Result<(), ClientError> {
        let link = self.link().ok_or(ClientError::NotConnected)?;
        link.write_all(data).await?;
        Ok(())
    }

    /// Send `text` encoded with the client's encoding. Empty text is ignored.
    ///
    /// # Errors
    /// Fails as [`reply`](Self::reply) does.
    pub async fn reply_text(&self, text: &str) -> Result<(), ClientError> {
        if text.is_empty() {
            return Ok(());
        }
        self.reply(&self.encoding.encode(text)).await
    }

    /// Send `text` terminated by the delimiter, unless it already ends with
    /// it. Empty text is ignored.
    ///
    /// # Errors
    /// Fails as [`reply`](Self::reply) does.
    pub async fn reply_framed(&self, text: &str) -> Result<(), ClientError> {
        if text.is_empty() {
            return Ok(());
        }
        self.reply(&framed_payload(text, &self.delimiter, self.encoding))
            .await
    }

    fn link(&self) -> Option<Arc<Link>> { self.link.upgrade().filter(|link| link.is_active()) }
}
