//! High-level operations against a paired watch, built on the file-transfer
//! primitives in `wristlink-protocol`.

use tracing::info;
use wristlink_protocol::protocol::file;
use wristlink_protocol::{delete_file, list_sub_files, read_file, write_file};
use wristlink_protocol::{ByteSink, FileId, Session, SliceSource};

use crate::error::SyncError;

/// A paired watch, wrapping the authenticated [`Session`] with the
/// higher-level operations a sync run needs.
pub struct Watch<'a> {
    session: &'a Session,
}

impl<'a> Watch<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    fn status_file() -> FileId {
        FileId::new(file::STATUS).expect("well-known file id is always valid")
    }

    /// Overwrite the status string shown on the watch face during sync.
    /// The device only ever shows the most recent write, so the old value
    /// is deleted first — mirroring the reference client's delete-then-write
    /// pattern for every status update.
    pub async fn set_status(&self, text: &str) -> Result<(), SyncError> {
        let file = Self::status_file();
        delete_file(self.session, file).await?;
        let mut source = SliceSource::new(text.as_bytes());
        write_file(self.session, file, &mut source, true).await?;
        Ok(())
    }

    /// Read the device's XML preferences blob (file `0x00f20000`) into `sink`.
    pub async fn fetch_preferences(&self, sink: &mut dyn ByteSink) -> Result<u64, SyncError> {
        let preferences = FileId::new(file::PREFERENCES).expect("well-known file id is always valid");
        Ok(read_file(self.session, preferences, sink, None).await?)
    }

    /// Enumerate recorded activities waiting to be synced.
    pub async fn list_activities(&self) -> Result<Vec<FileId>, SyncError> {
        let base = FileId::new(file::ACTIVITY_BASE).expect("well-known file id is always valid");
        Ok(list_sub_files(self.session, base).await?)
    }

    /// Download one activity recording into `sink`.
    pub async fn drain_activity(&self, id: FileId, sink: &mut dyn ByteSink) -> Result<u64, SyncError> {
        Ok(read_file(self.session, id, sink, None).await?)
    }

    /// Remove an activity recording from the device once it's safely stored
    /// on the host.
    pub async fn delete_activity(&self, id: FileId) -> Result<(), SyncError> {
        delete_file(self.session, id).await?;
        Ok(())
    }

    /// Upload a fresh GPS QuickFix assistance blob (file `0x00010100`).
    pub async fn upload_assistance_data(&self, data: &[u8]) -> Result<(), SyncError> {
        let assistance = FileId::new(file::ASSISTANCE).expect("well-known file id is always valid");
        delete_file(self.session, assistance).await?;
        let mut source = SliceSource::new(data);
        write_file(self.session, assistance, &mut source, true).await?;
        Ok(())
    }
}

/// Callbacks the orchestrator uses to hand transferred bytes to the caller,
/// kept separate from `Watch` so the sync sequence itself stays storage
/// agnostic (tests drive it with in-memory buffers; the CLI wires it to
/// files on disk).
pub trait SyncSink: Send {
    fn preferences_sink(&mut self) -> &mut dyn ByteSink;
    fn activity_sink(&mut self, id: FileId) -> &mut dyn ByteSink;
}

/// Run the full end-to-end sync sequence against an already-paired watch:
/// preferences, every pending activity (drained then deleted), and
/// optionally a freshly fetched GPS assistance blob — each step narrated on
/// the watch's status display, in the same order the reference client uses.
pub async fn run_full_sync(
    watch: &Watch<'_>,
    sinks: &mut dyn SyncSink,
    assistance_data: Option<&[u8]>,
) -> Result<SyncReport, SyncError> {
    watch.set_status("Syncing…").await?;

    let preferences_len = watch.fetch_preferences(sinks.preferences_sink()).await?;
    info!(preferences_len, "fetched device preferences");

    let activities = watch.list_activities().await?;
    info!(count = activities.len(), "activities pending sync");

    let total = activities.len();
    let mut synced = Vec::with_capacity(total);
    for (index, &id) in activities.iter().enumerate() {
        watch
            .set_status(&format!("Activity {}/{}…", index + 1, total))
            .await?;

        let len = watch.drain_activity(id, sinks.activity_sink(id)).await?;
        info!(%id, len, "saved activity");

        watch
            .set_status(&format!("{}/{} synced.", index + 1, total))
            .await?;

        watch.delete_activity(id).await?;
        synced.push(id);
    }

    let assistance_uploaded = if let Some(data) = assistance_data {
        watch.set_status("GPSQuickFix…").await?;
        watch.upload_assistance_data(data).await?;
        true
    } else {
        false
    };

    watch.set_status("wristlink, yo!").await?;

    Ok(SyncReport {
        preferences_len,
        synced_activities: synced,
        assistance_uploaded,
    })
}

/// A summary of what a [`run_full_sync`] call actually did.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub preferences_len: u64,
    pub synced_activities: Vec<FileId>,
    pub assistance_uploaded: bool,
}
