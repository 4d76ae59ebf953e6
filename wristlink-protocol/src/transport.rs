//! The minimum BLE surface the protocol core needs, kept narrow enough to
//! be driven by a deterministic mock in tests (see [`crate::mock`]).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::notification::NotificationLatch;

/// A connected transport to a single BLE peripheral, addressed by the
/// logical attribute handles in [`crate::protocol::handle`].
///
/// Raw I/O only: retries, echo matching, and windowing live in the protocol
/// layer above this trait. A concrete implementation's only job is to move
/// bytes in and out and to keep [`NotificationLatch`] fed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write `payload` (at most [`crate::protocol::MTU`] bytes) to `handle`.
    async fn write(
        &self,
        handle: u16,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError>;

    /// Block up to `timeout` for the next notification to land in the latch
    /// registered via [`Transport::set_notification_sink`], returning it (or
    /// `None` if nothing arrived in time).
    async fn await_notification(
        &self,
        timeout: Duration,
    ) -> Result<Option<crate::notification::Notification>, TransportError>;

    /// Register the latch this transport's background reader pushes
    /// observed notifications into.
    fn set_notification_sink(&self, sink: Arc<NotificationLatch>);

    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Type alias for a boxed transport, mirroring how the higher layers hold it.
pub type BoxedTransport = Arc<dyn Transport>;
