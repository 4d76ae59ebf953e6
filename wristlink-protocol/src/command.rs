//! The command channel: issue a 4-byte command on handle `0x25` and wait for
//! the device's "accepted" acknowledgement, retrying a fixed number of times.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ProtocolError;
use crate::fileid::Command;
use crate::protocol::{handle, timing};
use crate::session::Session;

/// Send `cmd`, retrying up to [`timing::COMMAND_RETRIES`] times on a
/// mismatched or missing acknowledgement. Returns the 0-based attempt index
/// on success.
pub async fn send_command(session: &Session, cmd: Command) -> Result<u32, ProtocolError> {
    send_command_with_delay(session, cmd, timing::COMMAND_RETRY_DELAY).await
}

/// Same as [`send_command`] but with an overridable inter-retry delay, so
/// tests don't have to sit through the real 1-second backoff.
async fn send_command_with_delay(
    session: &Session,
    cmd: Command,
    retry_delay: Duration,
) -> Result<u32, ProtocolError> {
    let bytes = cmd.to_bytes();

    for attempt in 0..timing::COMMAND_RETRIES {
        session.write(handle::COMMAND, &bytes, true).await?;

        match session
            .await_expected(Some(handle::COMMAND), None, Some(1), timing::NORMAL_TIMEOUT)
            .await
        {
            Ok(_) => {
                debug!(op = cmd.op, file = %cmd.file, attempt, "command accepted");
                return Ok(attempt);
            }
            Err(e) => {
                warn!(
                    op = cmd.op,
                    file = %cmd.file,
                    attempt,
                    error = %e,
                    "command not accepted, will retry"
                );
                tokio::time::sleep(retry_delay).await;
            }
        }
    }

    Err(ProtocolError::CommandRejected(timing::COMMAND_RETRIES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileid::FileId;
    use crate::mock::{MockStep, MockTransport};
    use std::sync::Arc;

    fn file() -> FileId {
        FileId::new(0x00020002).unwrap()
    }

    #[tokio::test]
    async fn accepts_on_first_try() {
        let mock = MockTransport::new(vec![MockStep::notify(handle::COMMAND, vec![1u8])]);
        let session = Session::new(Arc::new(mock));
        let attempt = send_command(&session, Command::delete(file())).await.unwrap();
        assert_eq!(attempt, 0);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let mock = MockTransport::new(vec![
            MockStep::notify(handle::COMMAND, vec![0u8]),
            MockStep::notify(handle::COMMAND, vec![0u8]),
            MockStep::notify(handle::COMMAND, vec![1u8]),
        ]);
        let session = Session::new(Arc::new(mock));
        let attempt =
            send_command_with_delay(&session, Command::delete(file()), Duration::from_millis(1))
                .await
                .unwrap();
        assert_eq!(attempt, 2);
    }

    #[tokio::test]
    async fn exhausts_retries() {
        let steps = (0..10)
            .map(|_| MockStep::notify(handle::COMMAND, vec![0u8]))
            .collect::<Vec<_>>();
        let mock = MockTransport::new(steps);
        let session = Session::new(Arc::new(mock));
        let err =
            send_command_with_delay(&session, Command::delete(file()), Duration::from_millis(1))
                .await
                .unwrap_err();
        assert!(matches!(err, ProtocolError::CommandRejected(10)));
    }
}
