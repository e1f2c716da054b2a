//! Worker pool.
//!
//! A fixed set of threads drains the job store. Each worker claims one job
//! at a time, runs it through the orchestrator, and returns it. Shutdown is
//! cooperative: the pool flips a shared flag and joins on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::PipelineConfig;
use crate::validation::ValidationOrchestrator;

use super::store::JobStore;

/// Queue poll interval when idle.
const IDLE_POLL: Duration = Duration::from_millis(50);

pub struct WorkerPool {
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `config.worker_count` workers over a shared store and
    /// orchestrator.
    pub fn start(
        store: Arc<dyn JobStore>,
        orchestrator: Arc<ValidationOrchestrator>,
        config: &PipelineConfig,
    ) -> WorkerPool {
        let shutdown = Arc::new(AtomicBool::new(false));
        let handles = (0..config.worker_count.max(1))
            .map(|worker_id| {
                let store = Arc::clone(&store);
                let orchestrator = Arc::clone(&orchestrator);
                let shutdown = Arc::clone(&shutdown);
                thread::Builder::new()
                    .name(format!("report-worker-{worker_id}"))
                    .spawn(move || worker_loop(worker_id, store, orchestrator, shutdown))
                    .expect("failed to spawn worker thread")
            })
            .collect();
        WorkerPool { shutdown, handles }
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked during shutdown");
            }
        }
    }
}

fn worker_loop(
    worker_id: usize,
    store: Arc<dyn JobStore>,
    orchestrator: Arc<ValidationOrchestrator>,
    shutdown: Arc<AtomicBool>,
) {
    tracing::debug!(worker_id, "worker started");
    while !shutdown.load(Ordering::SeqCst) {
        let Some(mut job) = store.claim() else {
            thread::sleep(IDLE_POLL);
            continue;
        };
        tracing::debug!(worker_id, job_id = %job.id, "job claimed");
        orchestrator.process(&mut job);
        if let Err(err) = store.complete(job) {
            tracing::error!(worker_id, error = %err, "failed to return job to the store");
        }
    }
    tracing::debug!(worker_id, "worker stopped");
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
