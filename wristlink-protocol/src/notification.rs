//! Notification value decoding and the single-slot demultiplexer latch.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout;

/// The integer interpretation of a notification payload, when its length is
/// one of the sizes that has an unambiguous little-endian reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerForm {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl IntegerForm {
    pub fn as_u64(self) -> u64 {
        match self {
            IntegerForm::U8(v) => v as u64,
            IntegerForm::U16(v) => v as u64,
            IntegerForm::U32(v) => v as u64,
            IntegerForm::U64(v) => v,
        }
    }

    fn decode(data: &[u8]) -> Option<Self> {
        match data.len() {
            1 => Some(IntegerForm::U8(data[0])),
            2 => Some(IntegerForm::U16(u16::from_le_bytes(data.try_into().ok()?))),
            4 => Some(IntegerForm::U32(u32::from_le_bytes(data.try_into().ok()?))),
            8 => Some(IntegerForm::U64(u64::from_le_bytes(data.try_into().ok()?))),
            _ => None,
        }
    }
}

/// A single BLE notification: the characteristic handle it arrived on, its
/// raw bytes, and (when decodable) its integer form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub handle: u16,
    pub data: Vec<u8>,
    pub integer: Option<IntegerForm>,
}

impl Notification {
    pub fn new(handle: u16, data: Vec<u8>) -> Self {
        let integer = IntegerForm::decode(&data);
        Self {
            handle,
            data,
            integer,
        }
    }

    pub fn integer_u64(&self) -> Option<u64> {
        self.integer.map(IntegerForm::as_u64)
    }
}

/// A single-slot, last-write-wins latch that a concrete [`crate::Transport`]
/// pushes every observed notification into, and that the protocol layer
/// drains one at a time.
///
/// The device is polled in lock-step — it emits exactly one notification per
/// step the protocol is waiting on — so a depth-1 slot is sufficient; no
/// queue is required. Implementations are still free to queue internally
/// (a `Transport` is allowed to buffer), as long as notifications surface to
/// `wait` in arrival order.
#[derive(Default)]
pub struct NotificationLatch {
    slot: Mutex<Option<Notification>>,
    notify: Notify,
}

impl NotificationLatch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Called by the transport's background reader whenever a notification
    /// arrives from the device.
    pub fn push(&self, notification: Notification) {
        *self.slot.lock() = Some(notification);
        self.notify.notify_waiters();
    }

    /// Clear any stale value before issuing the write that will provoke a
    /// fresh notification.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }

    /// Block until a notification is pushed (or `timeout_duration` elapses),
    /// then return the latched value.
    pub async fn wait(&self, timeout_duration: Duration) -> Option<Notification> {
        if let Some(n) = self.slot.lock().take() {
            return Some(n);
        }
        let notified = self.notify.notified();
        if timeout(timeout_duration, notified).await.is_err() {
            return None;
        }
        self.slot.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_integer_for_known_lengths() {
        assert_eq!(
            Notification::new(0x25, vec![1]).integer,
            Some(IntegerForm::U8(1))
        );
        assert_eq!(
            Notification::new(0x28, vec![0xFE, 0x13, 0x00, 0x00]).integer,
            Some(IntegerForm::U32(0x13FE))
        );
    }

    #[test]
    fn leaves_integer_none_for_other_lengths() {
        assert_eq!(Notification::new(0x2b, vec![1, 2, 3]).integer, None);
        assert_eq!(Notification::new(0x2b, vec![]).integer, None);
    }

    #[tokio::test]
    async fn wait_returns_pushed_value_immediately() {
        let latch = NotificationLatch::new();
        latch.push(Notification::new(0x25, vec![1]));
        let n = latch.wait(Duration::from_millis(50)).await.unwrap();
        assert_eq!(n.handle, 0x25);
    }

    #[tokio::test]
    async fn wait_times_out_when_nothing_pushed() {
        let latch = NotificationLatch::new();
        assert!(latch.wait(Duration::from_millis(20)).await.is_none());
    }

    #[tokio::test]
    async fn wait_wakes_on_later_push() {
        let latch = NotificationLatch::new();
        let latch2 = Arc::clone(&latch);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            latch2.push(Notification::new(0x2b, vec![9]));
        });
        let n = latch.wait(Duration::from_millis(200)).await.unwrap();
        assert_eq!(n.data, vec![9]);
    }
}
