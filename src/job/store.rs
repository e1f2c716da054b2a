//! Job store.
//!
//! The trait is the seam between the submission side and the worker pool;
//! the in-memory implementation is a mutex-guarded queue plus a slot map.
//! A claimed job leaves its slot, but its last status snapshot and cancel
//! handle stay behind so callers can still observe and cancel it.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::types::{Job, JobState, JobStatus};
use super::JobError;

// ═══════════════════════════════════════════════════════════
// Trait
// ═══════════════════════════════════════════════════════════

pub trait JobStore: Send + Sync {
    /// Accepts a new job for processing.
    fn enqueue(&self, job: Job) -> Result<Uuid, JobError>;

    /// Hands the next queued job to a worker, if any.
    fn claim(&self) -> Option<Job>;

    /// Returns a finished (or progressed) job to the store.
    fn complete(&self, job: Job) -> Result<(), JobError>;

    /// Best-effort cancellation; takes effect at the next checkpoint.
    fn cancel(&self, id: Uuid) -> Result<(), JobError>;

    fn status(&self, id: Uuid) -> Result<JobStatus, JobError>;

    /// Full job record, available once processing returned it.
    fn job(&self, id: Uuid) -> Result<Job, JobError>;
}

// ═══════════════════════════════════════════════════════════
// In-memory implementation
// ═══════════════════════════════════════════════════════════

struct Slot {
    /// Present while the job sits in the store; taken while a worker owns it.
    job: Option<Job>,
    last_status: JobStatus,
    cancel: Arc<AtomicBool>,
}

#[derive(Default)]
struct Inner {
    queue: VecDeque<Uuid>,
    slots: HashMap<Uuid, Slot>,
}

#[derive(Default)]
pub struct InMemoryJobStore {
    inner: Mutex<Inner>,
}

impl InMemoryJobStore {
    pub fn new() -> InMemoryJobStore {
        InMemoryJobStore::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JobStore for InMemoryJobStore {
    fn enqueue(&self, job: Job) -> Result<Uuid, JobError> {
        let id = job.id;
        let mut inner = self.lock();
        let slot = Slot {
            last_status: JobStatus::snapshot(&job),
            cancel: job.cancel_handle(),
            job: Some(job),
        };
        inner.slots.insert(id, slot);
        inner.queue.push_back(id);
        tracing::info!(job_id = %id, "job enqueued");
        Ok(id)
    }

    fn claim(&self) -> Option<Job> {
        let mut inner = self.lock();
        while let Some(id) = inner.queue.pop_front() {
            let Some(slot) = inner.slots.get_mut(&id) else {
                continue;
            };
            // Jobs cancelled while still queued are finished in place.
            if slot.cancel.load(Ordering::SeqCst) {
                if let Some(mut job) = slot.job.take() {
                    job.state = JobState::Cancelled;
                    slot.last_status = JobStatus::snapshot(&job);
                    slot.job = Some(job);
                }
                continue;
            }
            if let Some(job) = slot.job.take() {
                slot.last_status = JobStatus::snapshot(&job);
                return Some(job);
            }
        }
        None
    }

    fn complete(&self, job: Job) -> Result<(), JobError> {
        let id = job.id;
        let mut inner = self.lock();
        let slot = inner.slots.get_mut(&id).ok_or(JobError::NotFound(id))?;
        slot.last_status = JobStatus::snapshot(&job);
        slot.job = Some(job);
        Ok(())
    }

    fn cancel(&self, id: Uuid) -> Result<(), JobError> {
        let mut inner = self.lock();
        let slot = inner.slots.get_mut(&id).ok_or(JobError::NotFound(id))?;
        if slot.last_status.state.is_terminal() {
            return Err(JobError::AlreadyTerminal(id));
        }
        slot.cancel.store(true, Ordering::SeqCst);
        // Unclaimed jobs can be finished immediately.
        if let Some(mut job) = slot.job.take() {
            job.state = JobState::Cancelled;
            slot.last_status = JobStatus::snapshot(&job);
            slot.job = Some(job);
        }
        tracing::info!(job_id = %id, "cancellation requested");
        Ok(())
    }

    fn status(&self, id: Uuid) -> Result<JobStatus, JobError> {
        let inner = self.lock();
        let slot = inner.slots.get(&id).ok_or(JobError::NotFound(id))?;
        match &slot.job {
            Some(job) => Ok(JobStatus::snapshot(job)),
            None => Ok(slot.last_status.clone()),
        }
    }

    fn job(&self, id: Uuid) -> Result<Job, JobError> {
        let inner = self.lock();
        let slot = inner.slots.get(&id).ok_or(JobError::NotFound(id))?;
        slot.job.clone().ok_or(JobError::NotFound(id))
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::types::ProcessingMode;

    fn store_with_job() -> (InMemoryJobStore, Uuid) {
        let store = InMemoryJobStore::new();
        let job = Job::new("ECG toont sinusritme.", ProcessingMode::Examination, None);
        let id = store.enqueue(job).unwrap();
        (store, id)
    }

    #[test]
    fn enqueue_then_claim_hands_out_fifo() {
        let store = InMemoryJobStore::new();
        let first = store
            .enqueue(Job::new("eerste", ProcessingMode::History, None))
            .unwrap();
        let second = store
            .enqueue(Job::new("tweede", ProcessingMode::History, None))
            .unwrap();
        assert_eq!(store.claim().unwrap().id, first);
        assert_eq!(store.claim().unwrap().id, second);
        assert!(store.claim().is_none());
    }

    #[test]
    fn status_survives_claim() {
        let (store, id) = store_with_job();
        let job = store.claim().unwrap();
        let status = store.status(id).unwrap();
        assert_eq!(status.id, id);
        store.complete(job).unwrap();
    }

    #[test]
    fn complete_updates_status() {
        let (store, id) = store_with_job();
        let mut job = store.claim().unwrap();
        job.state = JobState::Completed;
        job.final_report = Some("ECG op 01-01-2026:".to_string());
        store.complete(job).unwrap();
        let status = store.status(id).unwrap();
        assert_eq!(status.state, JobState::Completed);
        assert!(status.final_report.is_some());
    }

    #[test]
    fn cancel_before_claim_finishes_the_job() {
        let (store, id) = store_with_job();
        store.cancel(id).unwrap();
        assert!(store.claim().is_none());
        assert_eq!(store.status(id).unwrap().state, JobState::Cancelled);
    }

    #[test]
    fn cancel_after_claim_sets_the_shared_flag() {
        let (store, id) = store_with_job();
        let job = store.claim().unwrap();
        store.cancel(id).unwrap();
        assert!(job.is_cancelled());
    }

    #[test]
    fn cancel_of_terminal_job_is_rejected() {
        let (store, id) = store_with_job();
        let mut job = store.claim().unwrap();
        job.state = JobState::Completed;
        store.complete(job).unwrap();
        assert!(matches!(
            store.cancel(id),
            Err(JobError::AlreadyTerminal(_))
        ));
    }

    #[test]
    fn unknown_job_is_not_found() {
        let store = InMemoryJobStore::new();
        assert!(matches!(
            store.status(Uuid::new_v4()),
            Err(JobError::NotFound(_))
        ));
    }
}
