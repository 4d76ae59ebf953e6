//! A deterministic, scriptable [`Transport`] used to drive the protocol
//! state machines without hardware.
//!
//! The device polls in lock-step: for every write the core issues, the mock
//! hands back exactly one scripted notification. This mirrors how the real
//! device behaves (spec §4.3) and is all the end-to-end scenarios in the
//! specification need.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::TransportError;
use crate::notification::{Notification, NotificationLatch};
use crate::transport::Transport;

/// One scripted reaction to a write: the notification the mock should push
/// immediately, as if the device replied instantly.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub notification: Notification,
}

impl MockStep {
    pub fn notify(handle: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            notification: Notification::new(handle, payload.into()),
        }
    }
}

struct Recorded {
    handle: u16,
    payload: Vec<u8>,
    with_response: bool,
}

/// A mock transport driven by a fixed script of notifications, popped one
/// per `await_notification` call in order.
pub struct MockTransport {
    steps: Mutex<std::collections::VecDeque<MockStep>>,
    sink: Mutex<Option<Arc<NotificationLatch>>>,
    writes: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new(steps: Vec<MockStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            sink: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// All writes issued against this mock so far, in order — lets tests
    /// assert on the exact bytes the engine put on the wire.
    pub fn writes(&self) -> Vec<(u16, Vec<u8>, bool)> {
        self.writes
            .lock()
            .iter()
            .map(|r| (r.handle, r.payload.clone(), r.with_response))
            .collect()
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(
        &self,
        handle: u16,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        self.writes.lock().push(Recorded {
            handle,
            payload: payload.to_vec(),
            with_response,
        });
        Ok(())
    }

    async fn await_notification(
        &self,
        _timeout: Duration,
    ) -> Result<Option<Notification>, TransportError> {
        let next = self.steps.lock().pop_front();
        match next {
            Some(step) => {
                if let Some(sink) = self.sink.lock().as_ref() {
                    sink.push(step.notification.clone());
                }
                Ok(Some(step.notification))
            }
            None => Ok(None),
        }
    }

    fn set_notification_sink(&self, sink: Arc<NotificationLatch>) {
        *self.sink.lock() = Some(sink);
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
