//! The file-transfer engine: windowed, CRC-checked streaming read/write,
//! plus list and delete. This is the core of the core (spec §4.5).

use async_trait::async_trait;
use tracing::{debug, info};

use crate::command::send_command;
use crate::crc::Crc16;
use crate::error::ProtocolError;
use crate::fileid::{Command, FileId};
use crate::protocol::{handle, timing, MTU, WINDOW};
use crate::session::Session;

/// Abstract destination for bytes read off the device — disk, memory, or a
/// network socket, without the engine ever buffering the whole file.
#[async_trait]
pub trait ByteSink: Send {
    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

#[async_trait]
impl ByteSink for Vec<u8> {
    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

#[async_trait]
impl ByteSink for tokio::fs::File {
    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        tokio::io::AsyncWriteExt::write_all(self, bytes).await
    }
}

/// Abstract source of bytes to write to the device. The engine needs the
/// total length up front (it's sent in the length handshake before any
/// data chunk goes out), then pulls sequential chunks.
#[async_trait]
pub trait ByteSource: Send {
    fn len(&self) -> u64;

    /// Read the next `max_len` bytes (or fewer only at end of stream).
    async fn read_chunk(&mut self, max_len: usize) -> std::io::Result<Vec<u8>>;
}

/// An in-memory [`ByteSource`] for callers that already have the whole
/// buffer (the common case: preferences writes, status strings, the
/// assistance blob).
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

#[async_trait]
impl ByteSource for SliceSource<'_> {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_chunk(&mut self, max_len: usize) -> std::io::Result<Vec<u8>> {
        let end = (self.pos + max_len).min(self.data.len());
        let chunk = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(chunk)
    }
}

/// Read `file` off the device into `sink`, stopping early if `limit` bytes
/// have been written.
///
/// Returns the number of bytes actually transferred.
pub async fn read_file(
    session: &Session,
    file: FileId,
    sink: &mut dyn ByteSink,
    limit: Option<u64>,
) -> Result<u64, ProtocolError> {
    send_command(session, Command::read(file)).await?;

    let length_notification = session
        .await_expected(Some(handle::LENGTH), None, None, timing::NORMAL_TIMEOUT)
        .await?;
    let total_len = length_notification
        .integer_u64()
        .ok_or_else(|| ProtocolError::MalformedListing("length notification not an integer".into()))?;

    info!(file = %file, total_len, "reading file");

    let mut counter: u32 = 0;
    let mut written: u64 = 0;
    let mut window_start: u64 = 0;

    while window_start < total_len {
        let window_end = (window_start + WINDOW as u64).min(total_len);
        let mut crc = Crc16::new();

        let mut offset = window_start;
        while offset < window_end {
            let chunk = session
                .await_expected(Some(handle::DATA), None, None, timing::NORMAL_TIMEOUT)
                .await?;
            let mut d = chunk.data;
            let remaining = (window_end - offset) as usize;

            if remaining > MTU {
                // Interior chunk: no trailer in sight yet, the whole 20 bytes are data.
                sink.write(&d)
                    .await
                    .map_err(|e| ProtocolError::Transport(crate::error::TransportError::Io(e.to_string())))?;
                crc.update(&d);
                offset += MTU as u64;
            } else {
                // Last chunk of the window: `remaining` data bytes followed by a
                // 2-byte CRC trailer, which may spill into one more chunk when
                // `remaining` is 19 or 20 (no room left in this packet).
                let data_len = remaining.min(d.len());
                sink.write(&d[..data_len])
                    .await
                    .map_err(|e| ProtocolError::Transport(crate::error::TransportError::Io(e.to_string())))?;
                if d.len() < remaining + 2 {
                    let straggler = session
                        .await_expected(Some(handle::DATA), None, None, timing::NORMAL_TIMEOUT)
                        .await?;
                    d.extend_from_slice(&straggler.data);
                }
                crc.update(&d);
                offset = window_end;
            }
        }

        if crc.digest() != 0 {
            return Err(ProtocolError::CrcMismatch);
        }
        counter += 1;
        session
            .write(handle::PACING, &counter.to_le_bytes(), false)
            .await?;

        written += window_end - window_start;
        debug!(counter, written, total_len, "window complete");

        if let Some(limit) = limit {
            if written >= limit {
                session.write(handle::PACING, &[0, 0, 0, 0], false).await?;
                window_start = total_len; // force loop exit; terminal ack still expected below
                break;
            }
        }
        window_start = window_end;
    }

    session
        .await_expected(Some(handle::COMMAND), None, Some(0), timing::NORMAL_TIMEOUT)
        .await?;

    Ok(written)
}

/// Write `source`'s full contents to `file` on the device.
///
/// `expect_end` selects whether the final window's pacing echo is awaited.
/// The reference client always awaits it (every call site passes or
/// defaults to `true`); the flag is kept here as an escape hatch per spec
/// §9 for firmware variants that complete without the final echo.
pub async fn write_file(
    session: &Session,
    file: FileId,
    source: &mut dyn ByteSource,
    expect_end: bool,
) -> Result<u64, ProtocolError> {
    send_command(session, Command::write(file)).await?;

    let total_len = source.len();
    session
        .write(handle::LENGTH, &(total_len as u32).to_le_bytes(), true)
        .await?;

    info!(file = %file, total_len, "writing file");

    let mut counter: u32 = 0;
    let mut window_start: u64 = 0;

    loop {
        let window_end = (window_start + WINDOW as u64).min(total_len);
        let mut crc = Crc16::new();

        let mut offset = window_start;
        while offset < window_end {
            let remaining_in_window = (window_end - offset) as usize;
            let chunk_len = remaining_in_window.min(MTU);
            let chunk = source
                .read_chunk(chunk_len)
                .await
                .map_err(|e| ProtocolError::Transport(crate::error::TransportError::Io(e.to_string())))?;
            crc.update(&chunk);
            offset += chunk.len() as u64;

            let is_last_chunk_of_window = offset >= window_end;
            let mut out = chunk;
            if is_last_chunk_of_window {
                out.extend_from_slice(&crc.digest().to_le_bytes());
            }

            if out.len() > MTU {
                session.write(handle::DATA, &out[..MTU], false).await?;
                session.write(handle::DATA, &out[MTU..], false).await?;
            } else {
                session.write(handle::DATA, &out, false).await?;
            }
        }

        counter += 1;
        let is_final_window = window_end >= total_len;
        if !is_final_window || expect_end {
            session
                .await_expected(
                    Some(handle::PACING),
                    None,
                    Some(counter as u64),
                    timing::SLOW_TIMEOUT,
                )
                .await?;
        }

        debug!(counter, window_end, total_len, "window complete");

        if is_final_window {
            break;
        }
        window_start = window_end;
    }

    session
        .await_expected(Some(handle::COMMAND), None, Some(0), timing::NORMAL_TIMEOUT)
        .await?;

    Ok(total_len)
}

/// List the children of `base`: e.g. `list_sub_files(0x00910000)` enumerates
/// recorded activities.
pub async fn list_sub_files(session: &Session, base: FileId) -> Result<Vec<FileId>, ProtocolError> {
    send_command(session, Command::list(base)).await?;

    let mut buf = Vec::new();
    loop {
        let n = session
            .await_expected(None, None, None, timing::NORMAL_TIMEOUT)
            .await?;
        if n.handle == handle::DATA {
            buf.extend_from_slice(&n.data);
        } else if n.handle == handle::COMMAND && n.integer_u64() == Some(0) {
            break;
        } else {
            return Err(ProtocolError::UnexpectedNotification {
                expected_handle: None,
                expected_integer: None,
                got_handle: n.handle,
                got_data: n.data,
                got_integer: n.integer_u64(),
            });
        }
    }

    if buf.len() % 2 != 0 {
        return Err(ProtocolError::MalformedListing(format!(
            "listing buffer has odd length {}",
            buf.len()
        )));
    }
    let counts: Vec<u16> = buf
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    let declared = counts.first().copied().unwrap_or(0) as usize;
    if declared + 1 != counts.len() {
        return Err(ProtocolError::MalformedListing(format!(
            "declared count {} but got {} entries",
            declared,
            counts.len().saturating_sub(1)
        )));
    }

    Ok(counts[1..].iter().map(|&offset| base.with_offset(offset)).collect())
}

/// Delete `file`, returning whatever diagnostic payload the device sends
/// back (opaque to this layer). Deleting a file that doesn't exist is not
/// an error — the device replies with a terminal ack and no data.
pub async fn delete_file(session: &Session, file: FileId) -> Result<Vec<u8>, ProtocolError> {
    send_command(session, Command::delete(file)).await?;

    let mut buf = Vec::new();
    loop {
        let n = session
            .await_expected(None, None, None, timing::SLOW_TIMEOUT)
            .await?;
        if n.handle == handle::DATA {
            buf.extend_from_slice(&n.data);
        } else if n.handle == handle::COMMAND && n.integer_u64() == Some(0) {
            break;
        } else {
            return Err(ProtocolError::UnexpectedNotification {
                expected_handle: None,
                expected_integer: None,
                got_handle: n.handle,
                got_data: n.data,
                got_integer: n.integer_u64(),
            });
        }
    }

    Ok(buf)
}
