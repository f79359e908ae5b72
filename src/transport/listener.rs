use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use super::StreamEventSource;
use crate::{RaceControlError, Result};

/// TCP endpoint the timing feed connects to, one connection per session.
pub struct EventListener {
    listener: TcpListener,
}

impl EventListener {
    /// Bind to `address`, e.g. `127.0.0.1:1111`.
    pub async fn bind(address: &str) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| RaceControlError::transport(format!("binding {address}"), e))?;
        info!("Listening for the timing feed on {}", address);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| RaceControlError::transport("querying the listening address", e))
    }

    /// Wait for the feed of the next session.
    pub async fn accept(&self) -> Result<StreamEventSource<TcpStream>> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| RaceControlError::transport("accepting the timing feed", e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| RaceControlError::transport(format!("configuring connection from {peer}"), e))?;
        info!("Timing feed connected from {}", peer);
        Ok(StreamEventSource::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::EventSource;
    use crate::types::{Event, EventKind, Stage};
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn accepts_a_feed_connection() -> anyhow::Result<()> {
        let listener = EventListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let event = Event::new(Stage::Qualifying1, 11, 1, EventKind::Sector3, 92_000).with_sequence(1);

        let feed = tokio::spawn(async move {
            let mut stream = TcpStream::connect(address).await?;
            stream.write_all(&event.encode()).await?;
            stream.shutdown().await?;
            anyhow::Ok(())
        });

        let mut source = listener.accept().await?;
        assert_eq!(source.next_event().await?, Some(event));
        assert_eq!(source.next_event().await?, None);
        feed.await??;
        Ok(())
    }

    #[tokio::test]
    async fn bind_failure_is_a_transport_error() -> anyhow::Result<()> {
        let taken = EventListener::bind("127.0.0.1:0").await?;
        let address = taken.local_addr()?.to_string();

        let error = EventListener::bind(&address).await.err().expect("address in use");
        assert!(error.is_session_scoped());
        assert!(error.to_string().contains(&address));
        Ok(())
    }
}
