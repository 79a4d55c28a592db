//! Backup/restore bridge.
//!
//! A secondary safety net, not primary sync: the working set is
//! serialized to an external file-like channel after every burst of
//! changes (debounced so a burst becomes one write), and can be
//! restored from it wholesale on demand. Scheduled backups fail
//! silently; only explicit user-initiated backup/restore surfaces
//! errors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::booking::Booking;
use crate::cache::{decode_snapshot, encode_snapshot};
use crate::error::{BookingError, BookingResult};

/// Fixed name of the backup blob on the channel.
pub const BACKUP_FILENAME: &str = "innsync_backup.json";

/// MIME type for backup blobs.
pub const BACKUP_MIME: &str = "application/json";

/// Debounce window: mutations landing within it coalesce into one
/// backup write.
pub const BACKUP_DEBOUNCE: Duration = Duration::from_millis(1300);

/// An external file-like blob store, found by name.
///
/// Requires a prior authentication step that is out of innsync's
/// scope; an unauthorized channel simply fails its calls and the
/// bridge treats that as best-effort-failed.
#[async_trait]
pub trait BackupChannel: Send + Sync {
    /// Resolve a blob name to an opaque id, if the blob exists.
    async fn find_by_name(&self, name: &str) -> BookingResult<Option<String>>;

    /// Create a new blob, returning its id.
    async fn create_with_content(
        &self,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> BookingResult<String>;

    /// Replace the content of an existing blob.
    async fn overwrite(&self, id: &str, bytes: &[u8]) -> BookingResult<()>;

    /// Read a blob whole.
    async fn read_content(&self, id: &str) -> BookingResult<Vec<u8>>;
}

/// Owns the debounced backup schedule and the restore path.
///
/// Cancel-and-reschedule is one atomic step: scheduling aborts any
/// pending write first, so at most one timer exists per bridge.
pub struct BackupBridge {
    channel: Option<Arc<dyn BackupChannel>>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl BackupBridge {
    pub fn new(channel: Option<Arc<dyn BackupChannel>>) -> BackupBridge {
        BackupBridge {
            channel,
            delay: BACKUP_DEBOUNCE,
            pending: None,
        }
    }

    /// Bridge with no channel attached; scheduling becomes a no-op.
    pub fn disabled() -> BackupBridge {
        BackupBridge::new(None)
    }

    pub fn with_delay(mut self, delay: Duration) -> BackupBridge {
        self.delay = delay;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    /// Schedule a debounced backup of `snapshot`, replacing any pending
    /// one. Failures of the eventual write are swallowed.
    pub fn schedule(&mut self, snapshot: Vec<Booking>) {
        let Some(channel) = self.channel.clone() else {
            return;
        };
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = write_backup(channel.as_ref(), &snapshot).await {
                tracing::debug!(error = %err, "scheduled backup failed");
            }
        }));
    }

    /// Write a backup immediately, surfacing errors. Cancels any
    /// pending scheduled write, which the immediate one supersedes.
    pub async fn backup_now(&mut self, snapshot: &[Booking]) -> BookingResult<()> {
        let channel = self
            .channel
            .clone()
            .ok_or_else(|| BookingError::Backup("no backup channel configured".to_string()))?;
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        write_backup(channel.as_ref(), snapshot).await
    }

    /// Fetch the named backup blob and parse it into a full booking
    /// snapshot. The caller replaces the working set and cache with the
    /// result; there is no merge and no undo.
    pub async fn restore(&self) -> BookingResult<Vec<Booking>> {
        let channel = self
            .channel
            .clone()
            .ok_or_else(|| BookingError::Backup("no backup channel configured".to_string()))?;
        let id = channel
            .find_by_name(BACKUP_FILENAME)
            .await?
            .ok_or(BookingError::NoBackupFound)?;
        let bytes = channel.read_content(&id).await?;
        let raw = String::from_utf8(bytes)
            .map_err(|e| BookingError::Serialization(e.to_string()))?;
        decode_snapshot(&raw)
    }
}

impl Drop for BackupBridge {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

async fn write_backup(channel: &dyn BackupChannel, snapshot: &[Booking]) -> BookingResult<()> {
    let body = encode_snapshot(snapshot)?;
    match channel.find_by_name(BACKUP_FILENAME).await? {
        Some(id) => channel.overwrite(&id, body.as_bytes()).await,
        None => channel
            .create_with_content(BACKUP_FILENAME, BACKUP_MIME, body.as_bytes())
            .await
            .map(|_| ()),
    }
}

/// Directory-backed backup channel: one file per blob, name as id.
pub struct DirBackup {
    dir: PathBuf,
}

impl DirBackup {
    pub fn new(dir: impl Into<PathBuf>) -> DirBackup {
        DirBackup { dir: dir.into() }
    }
}

#[async_trait]
impl BackupChannel for DirBackup {
    async fn find_by_name(&self, name: &str) -> BookingResult<Option<String>> {
        if self.dir.join(name).exists() {
            Ok(Some(name.to_string()))
        } else {
            Ok(None)
        }
    }

    async fn create_with_content(
        &self,
        name: &str,
        _mime_type: &str,
        bytes: &[u8],
    ) -> BookingResult<String> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(name), bytes)?;
        Ok(name.to_string())
    }

    async fn overwrite(&self, id: &str, bytes: &[u8]) -> BookingResult<()> {
        std::fs::write(self.dir.join(id), bytes)?;
        Ok(())
    }

    async fn read_content(&self, id: &str) -> BookingResult<Vec<u8>> {
        Ok(std::fs::read(self.dir.join(id))?)
    }
}
