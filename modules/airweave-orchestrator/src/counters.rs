//! Atomic progress counters (spec §5: "counter increments are atomic ...
//! CAS-based under threads" — workers run concurrently on the same tokio
//! runtime, so every counter here is a plain `AtomicU64`).

use std::sync::atomic::{AtomicU64, Ordering};

use airweave_progress::SyncProgressUpdate;

#[derive(Debug, Default)]
pub struct Counters {
    pub inserted: AtomicU64,
    pub updated: AtomicU64,
    pub kept: AtomicU64,
    pub deleted: AtomicU64,
    pub skipped: AtomicU64,
    pub entities_encountered: AtomicU64,
}

impl Counters {
    pub fn snapshot(&self) -> SyncProgressUpdate {
        SyncProgressUpdate {
            inserted: self.inserted.load(Ordering::SeqCst),
            updated: self.updated.load(Ordering::SeqCst),
            kept: self.kept.load(Ordering::SeqCst),
            deleted: self.deleted.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            entities_encountered: self.entities_encountered.load(Ordering::SeqCst),
            is_complete: false,
            is_failed: false,
            error: None,
        }
    }

    pub fn inc_inserted(&self) {
        self.inserted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_updated(&self) {
        self.updated.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_kept(&self) {
        self.kept.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_deleted_by(&self, n: u64) {
        self.deleted.fetch_add(n, Ordering::SeqCst);
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_encountered(&self) {
        self.entities_encountered.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let counters = Counters::default();
        counters.inc_inserted();
        counters.inc_inserted();
        counters.inc_kept();
        let snap = counters.snapshot();
        assert_eq!(snap.inserted, 2);
        assert_eq!(snap.kept, 1);
        assert!(!snap.is_complete);
    }
}
