use super::SubmissionError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Millisecond wall clock
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Persisted state of the submission lock
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LockRecord {
    pub active: bool,
    pub timestamp_millis: i64,
}

/// Where the lock record lives
pub trait LockStore: Send + Sync {
    fn load(&self) -> Option<LockRecord>;
    fn store(&self, record: LockRecord);
}

#[derive(Debug, Default)]
pub struct MemoryLockStore {
    record: Mutex<Option<LockRecord>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockStore for MemoryLockStore {
    fn load(&self) -> Option<LockRecord> {
        *self.record.lock()
    }

    fn store(&self, record: LockRecord) {
        *self.record.lock() = Some(record);
    }
}

/// Refuses a new submission while an earlier one, started less than
/// `window` ago, is still active.
///
/// An active record older than the window is treated as stale and taken
/// over. Only excludes submissions going through the same store.
pub struct SubmissionLock {
    store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    window_ms: i64,
    // serializes load+store against the store
    gate: Mutex<()>,
}

impl SubmissionLock {
    pub fn new(store: Arc<dyn LockStore>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            store,
            clock,
            window_ms: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
            gate: Mutex::new(()),
        }
    }

    /// In-memory store on the system clock
    pub fn in_memory(window: Duration) -> Self {
        Self::new(
            Arc::new(MemoryLockStore::new()),
            Arc::new(SystemClock),
            window,
        )
    }

    pub fn acquire(&self) -> Result<LockGuard<'_>, SubmissionError> {
        let _gate = self.gate.lock();
        let now = self.clock.now_millis();

        if let Some(record) = self.store.load() {
            let age = now.saturating_sub(record.timestamp_millis);
            if record.active && age < self.window_ms {
                let retry_after_ms = u64::try_from(self.window_ms - age).unwrap_or(0);
                debug!(age_ms = age, retry_after_ms, "Submission lock held");
                return Err(SubmissionError::StillProcessing { retry_after_ms });
            }
        }

        self.store.store(LockRecord {
            active: true,
            timestamp_millis: now,
        });
        Ok(LockGuard {
            lock: self,
            acquired_at: now,
        })
    }

    pub fn is_held(&self) -> bool {
        let _gate = self.gate.lock();
        match self.store.load() {
            Some(record) if record.active => {
                self.clock.now_millis().saturating_sub(record.timestamp_millis) < self.window_ms
            }
            _ => false,
        }
    }

    fn release(&self, acquired_at: i64) {
        let _gate = self.gate.lock();
        match self.store.load() {
            // a newer holder took over a stale record; leave it alone
            Some(record) if record.timestamp_millis != acquired_at => {}
            _ => self.store.store(LockRecord {
                active: false,
                timestamp_millis: acquired_at,
            }),
        }
    }
}

/// Held for the duration of one submission; releases the lock on drop
pub struct LockGuard<'a> {
    lock: &'a SubmissionLock,
    acquired_at: i64,
}

impl LockGuard<'_> {
    pub fn acquired_at(&self) -> i64 {
        self.acquired_at
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.acquired_at);
        debug!(acquired_at = self.acquired_at, "Submission lock released");
    }
}
