use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;

use super::domain::FacilityCode;
use super::repository::{
    latest_per_facility, FacilityFilter, NewSubmission, StoreError, SubmissionId,
    SubmissionRecord, SubmissionStore, UpsertOutcome,
};

/// Process-local store. Upserts for one facility code are serialized by a
/// per-code mutex; different codes proceed in parallel. A code's mutex lives
/// only while an upsert for it is in flight, so the lock map stays bounded by
/// concurrent writers rather than by distinct codes.
#[derive(Debug)]
pub struct InMemorySubmissionStore {
    records: RwLock<Vec<SubmissionRecord>>,
    key_locks: Mutex<HashMap<FacilityCode, Arc<Mutex<()>>>>,
    next_id: AtomicI64,
}

impl Default for InMemorySubmissionStore {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            key_locks: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemorySubmissionStore {
    /// Seed with existing rows, e.g. legacy data carrying duplicate codes.
    pub fn with_records(records: Vec<SubmissionRecord>) -> Self {
        let next = records.iter().map(|record| record.id.0).max().unwrap_or(0) + 1;
        Self {
            records: RwLock::new(records),
            key_locks: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(next),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key_lock(&self, code: &FacilityCode) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = self.key_locks.lock().map_err(|_| poisoned())?;
        Ok(locks.entry(code.clone()).or_default().clone())
    }

    /// Drop the code's mutex once no other upsert holds or awaits it.
    fn release_key_lock(
        &self,
        code: &FacilityCode,
        lock: Arc<Mutex<()>>,
    ) -> Result<(), StoreError> {
        let mut locks = self.key_locks.lock().map_err(|_| poisoned())?;
        // One reference in the map plus ours.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(code);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn key_lock_count(&self) -> usize {
        self.key_locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    fn upsert_locked(
        &self,
        code: &FacilityCode,
        submission: NewSubmission,
    ) -> Result<UpsertOutcome, StoreError> {
        let existing = {
            let records = self.records.read().map_err(|_| poisoned())?;
            records
                .iter()
                .filter(|record| record.facility_code.as_ref() == Some(code))
                .max_by_key(|record| record.recency())
                .map(|record| record.id)
        };

        match existing {
            Some(id) => {
                let mut records = self.records.write().map_err(|_| poisoned())?;
                let record = records
                    .iter_mut()
                    .find(|record| record.id == id)
                    .ok_or_else(|| StoreError::Unavailable(format!("record {} vanished", id.0)))?;
                record.replace_with(submission, Utc::now());
                Ok(UpsertOutcome {
                    id,
                    was_update: true,
                })
            }
            None => self.insert(submission),
        }
    }

    fn insert(&self, submission: NewSubmission) -> Result<UpsertOutcome, StoreError> {
        let id = SubmissionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = SubmissionRecord::from_new(id, submission, Utc::now());
        self.records.write().map_err(|_| poisoned())?.push(record);
        Ok(UpsertOutcome {
            id,
            was_update: false,
        })
    }
}

impl SubmissionStore for InMemorySubmissionStore {
    fn upsert(&self, submission: NewSubmission) -> Result<UpsertOutcome, StoreError> {
        let Some(code) = submission.facility_code.clone() else {
            return self.insert(submission);
        };

        let lock = self.key_lock(&code)?;
        let outcome = {
            let _held = lock.lock().map_err(|_| poisoned())?;
            self.upsert_locked(&code, submission)
        };
        self.release_key_lock(&code, lock)?;
        outcome
    }

    fn list_latest_per_facility(
        &self,
        filter: &FacilityFilter,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        let snapshot = self.records.read().map_err(|_| poisoned())?.clone();
        Ok(latest_per_facility(snapshot, filter))
    }

    fn facility_codes(&self) -> Result<Vec<FacilityCode>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let codes: BTreeSet<FacilityCode> = records
            .iter()
            .filter_map(|record| record.facility_code.clone())
            .collect();
        Ok(codes.into_iter().collect())
    }

    fn get(&self, id: SubmissionId) -> Result<Option<SubmissionRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.iter().find(|record| record.id == id).cloned())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}
