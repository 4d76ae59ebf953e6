//! `Session` ties a concrete [`Transport`] to its notification latch and
//! implements the demultiplexer's `await_expected` step (spec §4.3): clear
//! the latch, wait for the transport to report a notification, and verify
//! it matches whatever the caller expects.

use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::error::ProtocolError;
use crate::notification::{Notification, NotificationLatch};
use crate::transport::Transport;

/// A live connection to one device. Exactly one file-transfer operation may
/// be in flight at a time per `Session` — that exclusion is enforced by
/// construction: callers hold `&mut` or serialize access themselves, as
/// there is no internal locking here (see spec §5: single-threaded,
/// synchronous, strictly serialized).
pub struct Session {
    transport: Arc<dyn Transport>,
    latch: Arc<NotificationLatch>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let latch = NotificationLatch::new();
        transport.set_notification_sink(Arc::clone(&latch));
        Self { transport, latch }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub async fn write(
        &self,
        handle: u16,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), ProtocolError> {
        self.transport
            .write(handle, payload, with_response)
            .await
            .map_err(Into::into)
    }

    /// Clear the latch, await the next notification, and fail unless it
    /// matches every expectation the caller supplied (`None` means "don't
    /// care").
    pub async fn await_expected(
        &self,
        expected_handle: Option<u16>,
        expected_data: Option<&[u8]>,
        expected_integer: Option<u64>,
        timeout: Duration,
    ) -> Result<Notification, ProtocolError> {
        self.latch.clear();
        let notification = self
            .transport
            .await_notification(timeout)
            .await?
            .ok_or(ProtocolError::Timeout(expected_handle))?;

        trace!(
            handle = format_args!("0x{:02x}", notification.handle),
            len = notification.data.len(),
            integer = ?notification.integer_u64(),
            "notification"
        );

        let handle_ok = expected_handle.map_or(true, |h| h == notification.handle);
        let data_ok = expected_data.map_or(true, |d| d == notification.data.as_slice());
        let integer_ok =
            expected_integer.map_or(true, |i| Some(i) == notification.integer_u64());

        if handle_ok && data_ok && integer_ok {
            Ok(notification)
        } else {
            Err(ProtocolError::UnexpectedNotification {
                expected_handle,
                expected_integer,
                got_handle: notification.handle,
                got_data: notification.data,
                got_integer: notification.integer_u64(),
            })
        }
    }
}
