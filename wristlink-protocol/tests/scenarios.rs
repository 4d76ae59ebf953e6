//! End-to-end scenario tests, run entirely against the deterministic mock
//! transport exposed by the `test-util` feature. No hardware required.
//!
//! These mirror the six scenarios laid out for the file-transfer engine:
//! a full-window read, a sub-window read whose CRC trailer spills across a
//! chunk boundary, a two-window write, command-channel retry, a corrupted
//! CRC trailer, and sub-file listing.

use std::sync::Arc;

use wristlink_protocol::mock::{MockStep, MockTransport};
use wristlink_protocol::protocol::{handle, WINDOW};
use wristlink_protocol::{
    crc16_modbus, delete_file, list_sub_files, read_file, send_command, write_file, Command,
    FileId, ProtocolError, Session, SliceSource,
};

fn file(id: u32) -> FileId {
    FileId::new(id).unwrap()
}

fn chunks_of(wire: &[u8]) -> Vec<MockStep> {
    wire.chunks(20)
        .map(|c| MockStep::notify(handle::DATA, c.to_vec()))
        .collect()
}

#[tokio::test]
async fn scenario_1_full_window_read_of_5118_bytes() {
    let data = vec![0xAB; WINDOW];
    let crc = crc16_modbus(&data);
    let mut wire = data.clone();
    wire.extend_from_slice(&crc.to_le_bytes());

    let mut steps = vec![
        MockStep::notify(handle::COMMAND, vec![1u8]),
        MockStep::notify(handle::LENGTH, (WINDOW as u32).to_le_bytes().to_vec()),
    ];
    steps.extend(chunks_of(&wire));
    steps.push(MockStep::notify(handle::COMMAND, vec![0u8]));

    let mock = Arc::new(MockTransport::new(steps));
    let session = Session::new(Arc::clone(&mock) as Arc<dyn wristlink_protocol::Transport>);

    let mut sink = Vec::new();
    let written = read_file(&session, file(0x00020002), &mut sink, None)
        .await
        .unwrap();

    assert_eq!(written, WINDOW as u64);
    assert_eq!(sink, data);

    // The pacing counter must have been echoed back exactly once, with value 1.
    let pacing_writes: Vec<_> = mock
        .writes()
        .into_iter()
        .filter(|(h, _, _)| *h == handle::PACING)
        .collect();
    assert_eq!(pacing_writes.len(), 1);
    assert_eq!(pacing_writes[0].1, 1u32.to_le_bytes());
}

#[tokio::test]
async fn scenario_2_read_19_bytes_splits_crc_trailer_across_chunks() {
    let data = vec![0x11u8; 19];
    let crc = crc16_modbus(&data);
    let mut wire = data.clone();
    wire.extend_from_slice(&crc.to_le_bytes()); // 21 bytes: 20 + 1

    let steps = vec![
        MockStep::notify(handle::COMMAND, vec![1u8]),
        MockStep::notify(handle::LENGTH, 19u32.to_le_bytes().to_vec()),
        MockStep::notify(handle::DATA, wire[..20].to_vec()),
        MockStep::notify(handle::DATA, wire[20..].to_vec()),
        MockStep::notify(handle::COMMAND, vec![0u8]),
    ];

    let mock = MockTransport::new(steps);
    let session = Session::new(Arc::new(mock));

    let mut sink = Vec::new();
    let written = read_file(&session, file(0x00020002), &mut sink, None)
        .await
        .unwrap();

    assert_eq!(written, 19);
    assert_eq!(sink, data);
}

#[tokio::test]
async fn scenario_3_write_5119_bytes_spans_two_windows() {
    let data = vec![0x77u8; WINDOW + 1];

    let steps = vec![
        MockStep::notify(handle::COMMAND, vec![1u8]),
        MockStep::notify(handle::PACING, 1u32.to_le_bytes().to_vec()),
        MockStep::notify(handle::PACING, 2u32.to_le_bytes().to_vec()),
        MockStep::notify(handle::COMMAND, vec![0u8]),
    ];

    let mock = Arc::new(MockTransport::new(steps));
    let session = Session::new(Arc::clone(&mock) as Arc<dyn wristlink_protocol::Transport>);

    let mut source = SliceSource::new(&data);
    let written = write_file(&session, file(0x00020002), &mut source, true)
        .await
        .unwrap();

    assert_eq!(written, (WINDOW + 1) as u64);

    // A full 5118-byte window's last data chunk is always 18 bytes (18 + 2
    // trailer = 20 exactly), so neither window here needs a split write.
    let data_writes: Vec<_> = mock
        .writes()
        .into_iter()
        .filter(|(h, _, _)| *h == handle::DATA)
        .collect();
    assert!(data_writes.iter().all(|(_, payload, _)| payload.len() <= 20));
}

#[tokio::test]
async fn write_final_window_of_exactly_20_bytes_splits_trailer_across_two_writes() {
    // Window 1 fills the full 5118-byte window (ends on an 18-byte chunk, no
    // split). Window 2 is then exactly 20 bytes: its only chunk already
    // fills the packet, so the 2-byte trailer needs a second write.
    let data = vec![0x09u8; WINDOW + 20];

    let steps = vec![
        MockStep::notify(handle::COMMAND, vec![1u8]),
        MockStep::notify(handle::PACING, 1u32.to_le_bytes().to_vec()),
        MockStep::notify(handle::PACING, 2u32.to_le_bytes().to_vec()),
        MockStep::notify(handle::COMMAND, vec![0u8]),
    ];

    let mock = Arc::new(MockTransport::new(steps));
    let session = Session::new(Arc::clone(&mock) as Arc<dyn wristlink_protocol::Transport>);

    let mut source = SliceSource::new(&data);
    let written = write_file(&session, file(0x00020002), &mut source, true)
        .await
        .unwrap();
    assert_eq!(written, (WINDOW + 20) as u64);

    let data_writes: Vec<_> = mock
        .writes()
        .into_iter()
        .filter(|(h, _, _)| *h == handle::DATA)
        .map(|(_, payload, _)| payload)
        .collect();

    // The last two writes on the wire are the split trailer: a full 20-byte
    // data chunk followed by a standalone 2-byte CRC write.
    let last = data_writes.last().unwrap();
    let second_last = &data_writes[data_writes.len() - 2];
    assert_eq!(second_last.len(), 20);
    assert_eq!(last.len(), 2);
}

#[tokio::test]
async fn scenario_4_command_channel_retries_twice_then_succeeds() {
    let steps = vec![
        MockStep::notify(handle::COMMAND, vec![0u8]),
        MockStep::notify(handle::COMMAND, vec![0u8]),
        MockStep::notify(handle::COMMAND, vec![1u8]),
    ];
    let mock = MockTransport::new(steps);
    let session = Session::new(Arc::new(mock));

    let attempt = send_command(&session, Command::delete(file(0x00020002)))
        .await
        .unwrap();
    assert_eq!(attempt, 2);
}

#[tokio::test]
async fn scenario_5_corrupted_trailer_fails_with_crc_mismatch() {
    let data = vec![0x03u8; 40]; // two 20-byte chunks, last one carries the trailer
    let crc = crc16_modbus(&data) ^ 0x00FF; // flip a byte of the trailer
    let mut wire = data.clone();
    wire.extend_from_slice(&crc.to_le_bytes());

    let mut steps = vec![
        MockStep::notify(handle::COMMAND, vec![1u8]),
        MockStep::notify(handle::LENGTH, 40u32.to_le_bytes().to_vec()),
    ];
    steps.extend(chunks_of(&wire));
    steps.push(MockStep::notify(handle::COMMAND, vec![0u8]));

    let mock = MockTransport::new(steps);
    let session = Session::new(Arc::new(mock));

    let mut sink = Vec::new();
    let err = read_file(&session, file(0x00020002), &mut sink, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::CrcMismatch));
}

#[tokio::test]
async fn scenario_6_list_sub_files_parses_three_entries() {
    let mut buf = Vec::new();
    for v in [3u16, 1, 2, 3] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    let steps = vec![
        MockStep::notify(handle::COMMAND, vec![1u8]),
        MockStep::notify(handle::DATA, buf),
        MockStep::notify(handle::COMMAND, vec![0u8]),
    ];
    let mock = MockTransport::new(steps);
    let session = Session::new(Arc::new(mock));

    let ids = list_sub_files(&session, file(0x00910000)).await.unwrap();
    assert_eq!(
        ids,
        vec![file(0x00910001), file(0x00910002), file(0x00910003)]
    );
}

#[tokio::test]
async fn deleting_a_nonexistent_file_returns_empty_bytes() {
    let steps = vec![
        MockStep::notify(handle::COMMAND, vec![1u8]),
        MockStep::notify(handle::COMMAND, vec![0u8]),
    ];
    let mock = MockTransport::new(steps);
    let session = Session::new(Arc::new(mock));

    let payload = delete_file(&session, file(0x00020002)).await.unwrap();
    assert!(payload.is_empty());
}
