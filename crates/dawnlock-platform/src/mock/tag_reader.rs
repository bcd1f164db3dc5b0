//! Mock NFC tag reader for testing and simulation.
//!
//! Tags are presented through a [`MockTagReaderHandle`] and delivered to the
//! reader over a channel, the same way a host binding would forward reads
//! from its NFC callback.

use dawnlock_core::TagId;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::Shared;
use crate::{PlatformError, Result, traits::TagReader, types::TagScan};

#[derive(Debug, Default)]
struct ReaderState {
    enabled: bool,
    dropped: usize,
}

/// Mock NFC reader.
///
/// Reads are only delivered while the reader is enabled; tags presented
/// while it is disabled are dropped, as on a host with reader mode off.
///
/// # Examples
///
/// ```
/// use dawnlock_platform::mock::MockTagReader;
/// use dawnlock_platform::traits::TagReader;
///
/// #[tokio::main]
/// async fn main() -> dawnlock_platform::Result<()> {
///     let (mut reader, handle) = MockTagReader::new();
///     reader.enable().await?;
///
///     assert!(handle.present_uid(vec![0x04, 0xA2, 0x2B, 0x9C]).await?);
///
///     let scan = reader.read_tag().await?;
///     assert_eq!(scan.tag_id.to_hex(), "04:a2:2b:9c");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTagReader {
    /// Channel receiver for tag reads
    scan_rx: mpsc::Receiver<TagScan>,

    state: Shared<ReaderState>,
}

impl MockTagReader {
    /// Create a disabled mock reader.
    ///
    /// Returns a tuple of (MockTagReader, MockTagReaderHandle) where the
    /// handle is used to simulate tags entering the field.
    pub fn new() -> (Self, MockTagReaderHandle) {
        let (scan_tx, scan_rx) = mpsc::channel(32);
        let state = Shared::new(ReaderState::default());

        let reader = Self {
            scan_rx,
            state: state.clone(),
        };
        let handle = MockTagReaderHandle { scan_tx, state };

        (reader, handle)
    }
}

impl TagReader for MockTagReader {
    async fn enable(&mut self) -> Result<()> {
        self.state.lock().enabled = true;
        debug!("Mock tag reader enabled");
        Ok(())
    }

    async fn disable(&mut self) -> Result<()> {
        self.state.lock().enabled = false;
        // Drain reads that raced with the disable.
        while self.scan_rx.try_recv().is_ok() {}
        debug!("Mock tag reader disabled");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    async fn read_tag(&mut self) -> Result<TagScan> {
        self.scan_rx
            .recv()
            .await
            .ok_or_else(|| PlatformError::disconnected("tag reader channel closed"))
    }
}

/// Handle for presenting tags to a [`MockTagReader`].
#[derive(Debug, Clone)]
pub struct MockTagReaderHandle {
    /// Channel sender for tag reads
    scan_tx: mpsc::Sender<TagScan>,

    state: Shared<ReaderState>,
}

impl MockTagReaderHandle {
    /// Present a tag to the reader.
    ///
    /// Returns `false` if the reader is disabled and the tag was dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present(&self, tag_id: TagId) -> Result<bool> {
        {
            let mut state = self.state.lock();
            if !state.enabled {
                state.dropped += 1;
                trace!(tag = %tag_id, "Tag presented to disabled reader");
                return Ok(false);
            }
        }

        self.scan_tx
            .send(TagScan::new(tag_id))
            .await
            .map_err(|_| PlatformError::disconnected("tag reader channel closed"))?;
        Ok(true)
    }

    /// Present a tag by raw UID bytes.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::InvalidData` for a UID of invalid length.
    pub async fn present_uid(&self, uid: Vec<u8>) -> Result<bool> {
        self.present(TagId::from_bytes(uid)?).await
    }

    /// Whether the reader is currently delivering reads.
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Number of tags dropped because the reader was disabled.
    pub fn dropped_count(&self) -> usize {
        self.state.lock().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_present_and_read() {
        let (mut reader, handle) = MockTagReader::new();
        reader.enable().await.unwrap();

        tokio::spawn(async move {
            handle.present_uid(vec![0x04, 0xAB, 0xCD, 0xEF]).await.unwrap();
        });

        let scan = reader.read_tag().await.unwrap();
        assert_eq!(scan.tag_id.to_hex(), "04:ab:cd:ef");
    }

    #[tokio::test]
    async fn test_disabled_reader_drops_tags() {
        let (reader, handle) = MockTagReader::new();
        assert!(!reader.is_enabled());

        let delivered = handle.present_uid(vec![0x01, 0x02, 0x03, 0x04]).await.unwrap();

        assert!(!delivered);
        assert_eq!(handle.dropped_count(), 1);
    }

    #[tokio::test]
    async fn test_disable_drains_pending_reads() {
        let (mut reader, handle) = MockTagReader::new();
        reader.enable().await.unwrap();
        handle.present_uid(vec![0x01, 0x02, 0x03, 0x04]).await.unwrap();

        reader.disable().await.unwrap();
        reader.enable().await.unwrap();
        handle.present_uid(vec![0x05, 0x06, 0x07, 0x08]).await.unwrap();

        let scan = reader.read_tag().await.unwrap();
        assert_eq!(scan.tag_id.to_hex(), "05:06:07:08");
    }

    #[tokio::test]
    async fn test_invalid_uid_rejected() {
        let (mut reader, handle) = MockTagReader::new();
        reader.enable().await.unwrap();

        let result = handle.present_uid(vec![0x01]).await;
        assert!(matches!(result, Err(PlatformError::InvalidData { .. })));
    }

    #[tokio::test]
    async fn test_reader_disconnects_when_handle_dropped() {
        let (mut reader, handle) = MockTagReader::new();
        drop(handle);

        let result = reader.read_tag().await;
        assert!(matches!(result, Err(PlatformError::Disconnected { .. })));
    }
}
