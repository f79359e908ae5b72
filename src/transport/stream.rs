//! Event source over any async byte stream

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, trace, warn};

use super::EventSource;
use crate::types::{EVENT_SIZE, Event};
use crate::{RaceControlError, Result};

/// Reads fixed-width event records from a byte stream.
///
/// Records are reassembled across partial reads. A close on a record
/// boundary ends the session normally; a close mid-record also ends it and
/// the incomplete bytes are dropped.
pub struct StreamEventSource<R> {
    reader: R,
    buffer: [u8; EVENT_SIZE],
    records: u64,
}

impl<R> StreamEventSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self { reader, buffer: [0u8; EVENT_SIZE], records: 0 }
    }

    /// Number of complete records read so far.
    pub fn records_read(&self) -> u64 {
        self.records
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[async_trait::async_trait]
impl<R> EventSource for StreamEventSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn next_event(&mut self) -> Result<Option<Event>> {
        let mut filled = 0;
        while filled < EVENT_SIZE {
            let read = self.reader.read(&mut self.buffer[filled..]).await.map_err(|e| {
                RaceControlError::transport(format!("reading event record {}", self.records + 1), e)
            })?;

            if read == 0 {
                if filled > 0 {
                    warn!(
                        "Feed closed mid-record after {} records; discarding {} of {} bytes",
                        self.records, filled, EVENT_SIZE
                    );
                } else {
                    info!("Feed closed after {} records", self.records);
                }
                return Ok(None);
            }
            if filled == 0 && read < EVENT_SIZE {
                debug!("Partial read of {} bytes, waiting for the rest of the record", read);
            }
            filled += read;
        }

        self.records += 1;
        let event = Event::decode(&self.buffer)?;
        trace!("Record {}: {:?}", self.records, event);
        Ok(Some(event))
    }
}
