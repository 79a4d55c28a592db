//! The mutation pipeline and session orchestration.
//!
//! `BookingService` owns the working set and writes through it
//! optimistically: validate, commit locally, persist the cache,
//! schedule a backup, then try to confirm with the remote store.
//! Remote failures never roll the local change back; they degrade to a
//! warning carried on the mutation's outcome. The only hard rejections
//! happen before anything is mutated.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::backup::BackupBridge;
use crate::booking::{display_guest, Booking};
use crate::cache::{load_snapshot, persist_snapshot, BookingCache};
use crate::error::{BookingError, BookingResult};
use crate::overlap::may_commit;
use crate::remote::{RemoteStore, RemoteSubscription};
use crate::room::room_by_id;
use crate::store::BookingStore;

/// User-entered booking fields, before validation.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub room_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub guest: String,
    pub note: String,
}

/// How a committed mutation settled.
///
/// Pre-commit rejections are not outcomes; they are `Err` values from
/// the mutation methods, raised before any state changed.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Applied locally and confirmed by the remote store.
    Confirmed { id: String },
    /// Applied locally; the remote store has not confirmed it. The
    /// warning, when present, is user-visible but dismissible.
    LocalOnly {
        id: String,
        warning: Option<String>,
    },
}

impl MutationOutcome {
    /// Id of the booking the mutation settled on.
    pub fn id(&self) -> &str {
        match self {
            MutationOutcome::Confirmed { id } => id,
            MutationOutcome::LocalOnly { id, .. } => id,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            MutationOutcome::Confirmed { .. } => None,
            MutationOutcome::LocalOnly { warning, .. } => warning.as_deref(),
        }
    }
}

/// Owns the working set and coordinates cache, remote store, and
/// backup channel for one session.
pub struct BookingService {
    store: BookingStore,
    cache: Arc<dyn BookingCache>,
    remote: Option<Arc<dyn RemoteStore>>,
    backup: BackupBridge,
    privileged: bool,
}

impl BookingService {
    pub fn new(cache: Arc<dyn BookingCache>, privileged: bool) -> BookingService {
        BookingService {
            store: BookingStore::new(),
            cache,
            remote: None,
            backup: BackupBridge::disabled(),
            privileged,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> BookingService {
        self.remote = Some(remote);
        self
    }

    pub fn with_backup(mut self, backup: BackupBridge) -> BookingService {
        self.backup = backup;
        self
    }

    pub fn store(&self) -> &BookingStore {
        &self.store
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    /// Rebuild the working set from the cache snapshot. Run once at
    /// startup, before the remote feed arrives.
    pub fn seed_from_cache(&mut self) {
        let cached = load_snapshot(self.cache.as_ref());
        self.store.seed(cached);
    }

    /// Open the remote snapshot subscription. The caller drives it by
    /// feeding each snapshot to [`apply_remote_snapshot`]; dropping the
    /// subscription unsubscribes.
    ///
    /// [`apply_remote_snapshot`]: BookingService::apply_remote_snapshot
    pub async fn subscribe_remote(&self) -> BookingResult<RemoteSubscription> {
        let remote = self
            .remote
            .clone()
            .ok_or_else(|| BookingError::Sync("no remote store configured".to_string()))?;
        let rx = remote.subscribe().await?;
        Ok(RemoteSubscription::new(rx))
    }

    /// Fold one pushed remote snapshot into the working set and persist
    /// the result.
    pub fn apply_remote_snapshot(&mut self, snapshot: Vec<Booking>) {
        if snapshot.is_empty() {
            return;
        }
        self.store.reconcile(snapshot);
        self.settle();
    }

    /// Create a booking: validate, commit locally under a provisional
    /// id, then try to confirm remotely and rebind to the
    /// server-assigned id.
    pub async fn create_booking(&mut self, draft: BookingDraft) -> BookingResult<MutationOutcome> {
        self.validate(&draft, None)?;

        let booking = Booking::provisional(
            &draft.room_id,
            draft.start,
            draft.end,
            &draft.guest,
            &draft.note,
        );
        let provisional_id = booking.id.clone();
        self.store.upsert(booking.clone());
        self.settle();

        let Some(remote) = self.remote.clone() else {
            return Ok(MutationOutcome::LocalOnly {
                id: provisional_id,
                warning: None,
            });
        };

        match remote.create_booking(&booking).await {
            Ok(remote_id) => {
                self.store.rebind(&provisional_id, &remote_id);
                self.settle();
                Ok(MutationOutcome::Confirmed { id: remote_id })
            }
            Err(err) => {
                tracing::warn!(error = %err, id = %provisional_id, "remote create failed");
                Ok(MutationOutcome::LocalOnly {
                    id: provisional_id,
                    warning: Some("Save failed. Stored locally only.".to_string()),
                })
            }
        }
    }

    /// Replace the fields of an existing booking in place, keeping its
    /// id. A still-provisional booking is only ever edited locally; the
    /// remote knows nothing to update until its create confirms.
    pub async fn update_booking(
        &mut self,
        id: &str,
        draft: BookingDraft,
    ) -> BookingResult<MutationOutcome> {
        if self.store.get(id).is_none() {
            return Err(BookingError::BookingNotFound(id.to_string()));
        }
        self.validate(&draft, Some(id))?;

        let edited = Booking {
            id: id.to_string(),
            room_id: draft.room_id.clone(),
            guest: display_guest(&draft.guest),
            note: draft.note.clone(),
            start: draft.start,
            end: draft.end,
        };
        self.store.upsert(edited.clone());
        self.settle();

        let remote = match (&self.remote, edited.is_provisional()) {
            (Some(remote), false) => remote.clone(),
            _ => {
                return Ok(MutationOutcome::LocalOnly {
                    id: id.to_string(),
                    warning: None,
                })
            }
        };

        match remote.update_booking(id, &edited).await {
            Ok(()) => Ok(MutationOutcome::Confirmed { id: id.to_string() }),
            Err(err) => {
                tracing::warn!(error = %err, id, "remote update failed");
                Ok(MutationOutcome::LocalOnly {
                    id: id.to_string(),
                    warning: Some("Update failed. Kept local changes.".to_string()),
                })
            }
        }
    }

    /// Cancel a booking: remove it locally first, then try the remote
    /// delete for confirmed ids. A failed remote delete does not bring
    /// the booking back; the remote copy will resurrect it on the next
    /// reconciliation, an accepted asymmetry.
    pub async fn cancel_booking(&mut self, id: &str) -> BookingResult<MutationOutcome> {
        if !self.privileged {
            return Err(BookingError::ReadOnly);
        }
        let removed = self
            .store
            .remove(id)
            .ok_or_else(|| BookingError::BookingNotFound(id.to_string()))?;
        self.settle();

        let remote = match (&self.remote, removed.is_provisional()) {
            (Some(remote), false) => remote.clone(),
            _ => {
                return Ok(MutationOutcome::LocalOnly {
                    id: id.to_string(),
                    warning: None,
                })
            }
        };

        match remote.delete_booking(id).await {
            Ok(()) => Ok(MutationOutcome::Confirmed { id: id.to_string() }),
            Err(err) => {
                tracing::warn!(error = %err, id, "remote delete failed");
                Ok(MutationOutcome::LocalOnly {
                    id: id.to_string(),
                    warning: Some("Delete failed. Removed locally only.".to_string()),
                })
            }
        }
    }

    /// Write a backup immediately, surfacing errors.
    pub async fn backup_now(&mut self) -> BookingResult<()> {
        let snapshot = self.store.snapshot();
        self.backup.backup_now(&snapshot).await
    }

    /// Replace the working set and cache wholesale from the backup
    /// blob. Destructive: no merge, no undo. Returns the number of
    /// restored bookings.
    pub async fn restore_from_backup(&mut self) -> BookingResult<usize> {
        if !self.privileged {
            return Err(BookingError::ReadOnly);
        }
        let restored = self.backup.restore().await?;
        let count = restored.len();
        self.store.seed(restored);
        persist_snapshot(self.cache.as_ref(), &self.store.snapshot());
        Ok(count)
    }

    /// Validation gate shared by create and update. Nothing is mutated
    /// when this fails.
    fn validate(&self, draft: &BookingDraft, ignore_id: Option<&str>) -> BookingResult<()> {
        if !self.privileged {
            return Err(BookingError::ReadOnly);
        }
        if room_by_id(&draft.room_id).is_none() {
            return Err(BookingError::UnknownRoom(draft.room_id.clone()));
        }
        if draft.end <= draft.start {
            return Err(BookingError::InvalidRange);
        }
        let existing = self.store.for_room(&draft.room_id);
        if !may_commit(&draft.room_id, draft.start, draft.end, &existing, ignore_id) {
            return Err(BookingError::Overlap);
        }
        Ok(())
    }

    /// Post-commit bookkeeping after every settled working-set change:
    /// persist the cache (silently) and reschedule the debounced
    /// backup.
    fn settle(&mut self) {
        let snapshot = self.store.snapshot();
        persist_snapshot(self.cache.as_ref(), &snapshot);
        self.backup.schedule(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{load_snapshot, MemoryCache};
    use crate::remote::RemoteStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_draft(room_id: &str, start: NaiveDate, end: NaiveDate) -> BookingDraft {
        BookingDraft {
            room_id: room_id.to_string(),
            start,
            end,
            guest: "Alice".to_string(),
            note: "2 adults".to_string(),
        }
    }

    fn make_remote_booking(id: &str, room_id: &str, guest: &str) -> Booking {
        Booking {
            id: id.to_string(),
            room_id: room_id.to_string(),
            guest: guest.to_string(),
            note: String::new(),
            start: day(2024, 7, 1),
            end: day(2024, 7, 4),
        }
    }

    /// Remote store double with switchable failure modes.
    #[derive(Default)]
    struct MockRemote {
        fail_writes: bool,
        next_id: Mutex<u32>,
        deletes: Mutex<Vec<String>>,
        updates: Mutex<Vec<String>>,
        snapshot_tx: Mutex<Option<mpsc::Sender<Vec<Booking>>>>,
    }

    impl MockRemote {
        fn failing() -> MockRemote {
            MockRemote {
                fail_writes: true,
                ..MockRemote::default()
            }
        }
    }

    #[async_trait]
    impl RemoteStore for MockRemote {
        async fn subscribe(&self) -> BookingResult<mpsc::Receiver<Vec<Booking>>> {
            let (tx, rx) = mpsc::channel(8);
            *self.snapshot_tx.lock().unwrap() = Some(tx);
            Ok(rx)
        }

        async fn create_booking(&self, _booking: &Booking) -> BookingResult<String> {
            if self.fail_writes {
                return Err(BookingError::Sync("network unavailable".to_string()));
            }
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            Ok(format!("srv{}", *next))
        }

        async fn update_booking(&self, id: &str, _booking: &Booking) -> BookingResult<()> {
            if self.fail_writes {
                return Err(BookingError::Sync("network unavailable".to_string()));
            }
            self.updates.lock().unwrap().push(id.to_string());
            Ok(())
        }

        async fn delete_booking(&self, id: &str) -> BookingResult<()> {
            if self.fail_writes {
                return Err(BookingError::Sync("network unavailable".to_string()));
            }
            self.deletes.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }

    fn offline_service() -> BookingService {
        BookingService::new(Arc::new(MemoryCache::new()), true)
    }

    #[tokio::test]
    async fn test_create_confirms_and_rebinds() {
        // Scenario: provisional booking is confirmed under a
        // server-assigned id with all other fields intact
        let mut service =
            offline_service().with_remote(Arc::new(MockRemote::default()));

        let outcome = service
            .create_booking(make_draft("r1", day(2024, 6, 1), day(2024, 6, 3)))
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Confirmed { id: "srv1".to_string() });
        assert_eq!(service.store().len(), 1);
        let confirmed = service.store().get("srv1").unwrap();
        assert_eq!(confirmed.room_id, "r1");
        assert_eq!(confirmed.guest, "Alice");
        assert_eq!(confirmed.note, "2 adults");
        assert_eq!(confirmed.start, day(2024, 6, 1));
        assert_eq!(confirmed.end, day(2024, 6, 3));
        assert!(!service
            .store()
            .snapshot()
            .iter()
            .any(|b| b.is_provisional()));
    }

    #[tokio::test]
    async fn test_create_remote_failure_keeps_local() {
        let mut service = offline_service().with_remote(Arc::new(MockRemote::failing()));

        let outcome = service
            .create_booking(make_draft("r1", day(2024, 6, 1), day(2024, 6, 3)))
            .await
            .unwrap();

        assert_eq!(outcome.warning(), Some("Save failed. Stored locally only."));
        let booking = service.store().get(outcome.id()).unwrap();
        assert!(booking.is_provisional());
    }

    #[tokio::test]
    async fn test_boundary_adjacent_creates_both_accepted() {
        // Back-to-back stays in one room are not an overlap
        let mut service = offline_service();
        service
            .create_booking(make_draft("r1", day(2024, 6, 1), day(2024, 6, 3)))
            .await
            .unwrap();
        service
            .create_booking(make_draft("r1", day(2024, 6, 3), day(2024, 6, 5)))
            .await
            .unwrap();
        assert_eq!(service.store().len(), 2);
    }

    #[tokio::test]
    async fn test_overlap_rejected_before_any_write() {
        let mut service = offline_service();
        service
            .create_booking(make_draft("r1", day(2024, 6, 1), day(2024, 6, 5)))
            .await
            .unwrap();

        let err = service
            .create_booking(make_draft("r1", day(2024, 6, 3), day(2024, 6, 4)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Overlap));
        assert!(err.is_validation());
        assert_eq!(service.store().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_range_rejected() {
        let mut service = offline_service();
        let err = service
            .create_booking(make_draft("r1", day(2024, 6, 3), day(2024, 6, 3)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidRange));
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_room_rejected() {
        let mut service = offline_service();
        let err = service
            .create_booking(make_draft("r9", day(2024, 6, 1), day(2024, 6, 3)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::UnknownRoom(_)));
    }

    #[tokio::test]
    async fn test_read_only_cannot_mutate() {
        let mut service = BookingService::new(Arc::new(MemoryCache::new()), false);
        let err = service
            .create_booking(make_draft("r1", day(2024, 6, 1), day(2024, 6, 3)))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::ReadOnly));
        assert!(matches!(
            service.cancel_booking("x").await.unwrap_err(),
            BookingError::ReadOnly
        ));
    }

    #[tokio::test]
    async fn test_update_edits_in_place() {
        let remote = Arc::new(MockRemote::default());
        let mut service = offline_service().with_remote(remote.clone());
        let id = service
            .create_booking(make_draft("r1", day(2024, 6, 1), day(2024, 6, 3)))
            .await
            .unwrap()
            .id()
            .to_string();

        let mut draft = make_draft("r1", day(2024, 6, 2), day(2024, 6, 6));
        draft.guest = "Bob".to_string();
        let outcome = service.update_booking(&id, draft).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Confirmed { id: id.clone() });
        let edited = service.store().get(&id).unwrap();
        assert_eq!(edited.guest, "Bob");
        assert_eq!(edited.end, day(2024, 6, 6));
        assert_eq!(remote.updates.lock().unwrap().as_slice(), [id]);
    }

    #[tokio::test]
    async fn test_update_provisional_skips_remote() {
        // Unconfirmed records have nothing to update remotely yet
        let remote = Arc::new(MockRemote::failing());
        let mut service = offline_service().with_remote(remote.clone());
        let id = service
            .create_booking(make_draft("r1", day(2024, 6, 1), day(2024, 6, 3)))
            .await
            .unwrap()
            .id()
            .to_string();
        assert!(crate::booking::is_provisional_id(&id));

        let outcome = service
            .update_booking(&id, make_draft("r1", day(2024, 6, 1), day(2024, 6, 4)))
            .await
            .unwrap();

        // Local-only, but without a failure warning: no remote call was made
        assert_eq!(
            outcome,
            MutationOutcome::LocalOnly { id: id.clone(), warning: None }
        );
        assert_eq!(service.store().get(&id).unwrap().end, day(2024, 6, 4));
    }

    #[tokio::test]
    async fn test_update_remote_failure_keeps_edit() {
        let mut service = offline_service();
        service.store.upsert(make_remote_booking("abc", "r1", "Alice"));
        service = service.with_remote(Arc::new(MockRemote::failing()));

        let outcome = service
            .update_booking("abc", make_draft("r1", day(2024, 7, 2), day(2024, 7, 5)))
            .await
            .unwrap();

        assert_eq!(outcome.warning(), Some("Update failed. Kept local changes."));
        assert_eq!(service.store().get("abc").unwrap().start, day(2024, 7, 2));
    }

    #[tokio::test]
    async fn test_cancel_confirmed_booking() {
        let remote = Arc::new(MockRemote::default());
        let mut service = offline_service().with_remote(remote.clone());
        service.store.upsert(make_remote_booking("abc", "r1", "Alice"));

        let outcome = service.cancel_booking("abc").await.unwrap();

        assert_eq!(outcome, MutationOutcome::Confirmed { id: "abc".to_string() });
        assert!(service.store().is_empty());
        assert_eq!(remote.deletes.lock().unwrap().as_slice(), ["abc"]);
    }

    #[tokio::test]
    async fn test_cancel_provisional_skips_remote_delete() {
        let remote = Arc::new(MockRemote::failing());
        let mut service = offline_service().with_remote(remote.clone());
        service
            .store
            .upsert(make_remote_booking("local_1000", "r1", "Alice"));

        let outcome = service.cancel_booking("local_1000").await.unwrap();

        assert_eq!(outcome.warning(), None);
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_is_local_only() {
        // Local deletion is final even when the remote delete fails;
        // the record may resurrect on the next reconciliation.
        let mut service = offline_service().with_remote(Arc::new(MockRemote::failing()));
        service.store.upsert(make_remote_booking("abc", "r1", "Alice"));

        let outcome = service.cancel_booking("abc").await.unwrap();

        assert_eq!(outcome.warning(), Some("Delete failed. Removed locally only."));
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_preserves_provisional_records() {
        // Scenario: remote snapshot without the provisional id leaves
        // it untouched
        let mut service = offline_service();
        service
            .store
            .upsert(make_remote_booking("local_1000", "r2", "Carol"));

        service.apply_remote_snapshot(vec![make_remote_booking("abc", "r1", "Alice")]);

        assert_eq!(service.store().len(), 2);
        assert_eq!(service.store().get("local_1000").unwrap().guest, "Carol");
    }

    #[tokio::test]
    async fn test_subscription_delivers_and_drop_unsubscribes() {
        let remote = Arc::new(MockRemote::default());
        let mut service = offline_service().with_remote(remote.clone());

        let mut sub = service.subscribe_remote().await.unwrap();
        let tx = remote.snapshot_tx.lock().unwrap().clone().unwrap();

        tx.send(vec![make_remote_booking("abc", "r1", "Alice")])
            .await
            .unwrap();
        let snapshot = sub.next_snapshot().await.unwrap();
        service.apply_remote_snapshot(snapshot);
        assert_eq!(service.store().len(), 1);

        // Dropping the subscription tears the push channel down
        sub.unsubscribe();
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_snapshot_persists_to_cache() {
        let cache = Arc::new(MemoryCache::new());
        let mut service = BookingService::new(cache.clone(), true);

        service.apply_remote_snapshot(vec![make_remote_booking("abc", "r1", "Alice")]);

        let cached = load_snapshot(cache.as_ref());
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "abc");
    }

    #[tokio::test]
    async fn test_seed_from_cache() {
        let cache = Arc::new(MemoryCache::new());
        persist_snapshot(
            cache.as_ref(),
            &[make_remote_booking("abc", "r1", "Alice")],
        );

        let mut service = BookingService::new(cache, true);
        service.seed_from_cache();
        assert_eq!(service.store().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_failure_is_silent() {
        /// Cache that rejects every write.
        struct BrokenCache;
        impl BookingCache for BrokenCache {
            fn get(&self, _key: &str) -> BookingResult<Option<String>> {
                Err(BookingError::Cache("quota exceeded".to_string()))
            }
            fn set(&self, _key: &str, _value: &str) -> BookingResult<()> {
                Err(BookingError::Cache("quota exceeded".to_string()))
            }
        }

        let mut service = BookingService::new(Arc::new(BrokenCache), true);
        // The mutation still commits locally
        let outcome = service
            .create_booking(make_draft("r1", day(2024, 6, 1), day(2024, 6, 3)))
            .await
            .unwrap();
        assert!(service.store().get(outcome.id()).is_some());
    }

    #[tokio::test]
    async fn test_restore_replaces_wholesale() {
        use crate::backup::DirBackup;

        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(MemoryCache::new());
        let mut service = BookingService::new(cache.clone(), true)
            .with_backup(BackupBridge::new(Some(Arc::new(DirBackup::new(dir.path())))));

        service.store.upsert(make_remote_booking("old", "r1", "Old"));
        service.backup_now().await.unwrap();

        service.store.upsert(make_remote_booking("extra", "r2", "Extra"));
        let count = service.restore_from_backup().await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(service.store().len(), 1);
        assert!(service.store().get("old").is_some());
        // Cache was replaced along with the working set
        assert_eq!(load_snapshot(cache.as_ref()).len(), 1);
    }
}
