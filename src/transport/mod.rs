//! Event transports.
//!
//! A capture session pulls events from an [`EventSource`]. The production
//! source is a TCP connection accepted by [`EventListener`]; any byte stream
//! carrying 28-byte event records can be wrapped in a [`StreamEventSource`].

mod listener;
mod stream;

pub use listener::EventListener;
pub use stream::StreamEventSource;

use crate::Result;
use crate::types::Event;

/// Source of timing events for one capture session.
#[async_trait::async_trait]
pub trait EventSource: Send + 'static {
    /// Get the next event
    ///
    /// Returns:
    /// - `Ok(Some(event))` - Event decoded
    /// - `Ok(None)` - The feed closed; the session ended normally
    /// - `Err(e)` - Transport failure or a record that violates the wire contract
    async fn next_event(&mut self) -> Result<Option<Event>>;
}
