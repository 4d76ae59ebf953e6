//! The pairing/authentication handshake (spec §4.6).
//!
//! The device accepts two distinct preambles depending on whether the
//! caller is establishing a brand-new pairing code or reusing one already
//! known to it. The write order within each preamble is exactly what the
//! reference client sends and must be preserved verbatim — the device's
//! firmware appears to key off the sequence, not just the final write.

use tracing::info;

use crate::error::ProtocolError;
use crate::protocol::{handle, timing};
use crate::session::Session;

/// Which preamble to run before presenting the pairing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingMode {
    /// Establishing a new pairing code for the first time.
    New,
    /// Re-authenticating with a code already paired previously.
    Existing,
}

const ENABLE: [u8; 2] = [0x01, 0x00];
const REGISTER_PAYLOAD: [u8; 8] = [0x01, 0x13, 0x00, 0x00, 0x01, 0x12, 0x00, 0x00];

/// Run the authentication handshake and present `code`. Returns `Ok(())` on
/// acceptance, `Err(ProtocolError::PairingRejected)` if the device refuses
/// the code.
pub async fn pair(session: &Session, mode: PairingMode, code: u32) -> Result<(), ProtocolError> {
    info!(?mode, "starting pairing handshake");

    match mode {
        PairingMode::New => {
            session.write(handle::SESSION_INIT, &ENABLE, false).await?;
            session.write(handle::NOTIFY_ENABLE, &ENABLE, false).await?;
            session.write(handle::DESC_2F, &ENABLE, false).await?;
            session.write(handle::DESC_29, &ENABLE, false).await?;
            session.write(handle::DESC_2C, &ENABLE, false).await?;
            session
                .write(handle::NOTIFY_REGISTER, &REGISTER_PAYLOAD, true)
                .await?;
        }
        PairingMode::Existing => {
            session.write(handle::SESSION_INIT, &ENABLE, false).await?;
            session
                .write(handle::NOTIFY_REGISTER, &REGISTER_PAYLOAD, true)
                .await?;
            session.write(handle::NOTIFY_ENABLE, &ENABLE, false).await?;
        }
    }

    session
        .write(handle::PAIRING_CODE, &code.to_le_bytes(), true)
        .await?;

    let response = session
        .await_expected(Some(handle::PAIRING_CODE), None, None, timing::NORMAL_TIMEOUT)
        .await?;

    if response.integer_u64() == Some(1) {
        info!("pairing accepted");
        Ok(())
    } else {
        Err(ProtocolError::PairingRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockStep, MockTransport};
    use std::sync::Arc;

    #[tokio::test]
    async fn new_pairing_accepted() {
        let mock = MockTransport::new(vec![MockStep::notify(handle::PAIRING_CODE, 1u32.to_le_bytes().to_vec())]);
        let session = Session::new(Arc::new(mock));
        pair(&session, PairingMode::New, 12345).await.unwrap();
    }

    #[tokio::test]
    async fn new_pairing_writes_in_order() {
        let mock = Arc::new(MockTransport::new(vec![MockStep::notify(
            handle::PAIRING_CODE,
            1u32.to_le_bytes().to_vec(),
        )]));
        let session = Session::new(Arc::clone(&mock) as Arc<dyn crate::transport::Transport>);
        pair(&session, PairingMode::New, 12345).await.unwrap();

        let writes = mock.writes();
        let handles: Vec<u16> = writes.iter().map(|(h, _, _)| *h).collect();
        assert_eq!(
            handles,
            vec![
                handle::SESSION_INIT,
                handle::NOTIFY_ENABLE,
                handle::DESC_2F,
                handle::DESC_29,
                handle::DESC_2C,
                handle::NOTIFY_REGISTER,
                handle::PAIRING_CODE,
            ]
        );
    }

    #[tokio::test]
    async fn existing_pairing_writes_in_order() {
        let mock = Arc::new(MockTransport::new(vec![MockStep::notify(
            handle::PAIRING_CODE,
            1u32.to_le_bytes().to_vec(),
        )]));
        let session = Session::new(Arc::clone(&mock) as Arc<dyn crate::transport::Transport>);
        pair(&session, PairingMode::Existing, 12345).await.unwrap();

        let writes = mock.writes();
        let handles: Vec<u16> = writes.iter().map(|(h, _, _)| *h).collect();
        assert_eq!(
            handles,
            vec![
                handle::SESSION_INIT,
                handle::NOTIFY_REGISTER,
                handle::NOTIFY_ENABLE,
                handle::PAIRING_CODE,
            ]
        );
    }

    #[tokio::test]
    async fn rejected_code_is_an_error() {
        let mock = MockTransport::new(vec![MockStep::notify(handle::PAIRING_CODE, 0u32.to_le_bytes().to_vec())]);
        let session = Session::new(Arc::new(mock));
        let err = pair(&session, PairingMode::Existing, 1).await.unwrap_err();
        assert!(matches!(err, ProtocolError::PairingRejected));
    }
}
