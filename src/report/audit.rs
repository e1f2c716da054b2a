//! Audit artifacts.
//!
//! Every finished job can be persisted as one JSON file: final report, full
//! draft history with validator feedback, and the raw transcript. The file
//! is the review trail a clinician or auditor replays later.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::job::{Draft, Job, JobState, ProcessingMode};
use crate::template::InvestigationType;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("cannot write audit artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot serialize audit artifact: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Snapshot of one job, shaped for persistence.
#[derive(Debug, Serialize)]
pub struct ReportArtifact {
    pub job_id: Uuid,
    pub mode: ProcessingMode,
    pub investigation: Option<InvestigationType>,
    pub state: JobState,
    pub iteration_count: u32,
    pub created_on: NaiveDate,
    pub transcript_text: String,
    pub drafts: Vec<Draft>,
    pub final_report: Option<String>,
    pub error: Option<String>,
}

impl ReportArtifact {
    pub fn from_job(job: &Job) -> ReportArtifact {
        ReportArtifact {
            job_id: job.id,
            mode: job.mode,
            investigation: job.investigation,
            state: job.state,
            iteration_count: job.iteration_count,
            created_on: job.created_on,
            transcript_text: job.transcript_text.clone(),
            drafts: job.drafts.clone(),
            final_report: job.final_report.clone(),
            error: job.error.clone(),
        }
    }
}

/// Writes one pretty-printed JSON file per job into a flat directory.
pub struct AuditStore {
    dir: PathBuf,
}

impl AuditStore {
    pub fn new(dir: impl Into<PathBuf>) -> AuditStore {
        AuditStore { dir: dir.into() }
    }

    pub fn write(&self, artifact: &ReportArtifact) -> Result<PathBuf, AuditError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.artifact_path(artifact.job_id);
        let json = serde_json::to_string_pretty(artifact)?;
        fs::write(&path, json)?;
        tracing::info!(job_id = %artifact.job_id, path = %path.display(), "audit artifact written");
        Ok(path)
    }

    pub fn artifact_path(&self, job_id: Uuid) -> PathBuf {
        self.dir.join(format!("{job_id}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_job() -> Job {
        let mut job = Job::new("ECG toont sinusritme.", ProcessingMode::Examination, None);
        job.investigation = Some(InvestigationType::Ecg);
        job.drafts.push(Draft::new(0, Vec::new()));
        job.state = JobState::Completed;
        job.final_report = Some("ECG op 14-03-2026:\n".to_string());
        job
    }

    #[test]
    fn artifact_round_trips_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuditStore::new(dir.path());
        let job = finished_job();

        let path = store.write(&ReportArtifact::from_job(&job)).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["job_id"], job.id.to_string());
        assert_eq!(parsed["state"], "completed");
        assert_eq!(parsed["investigation"], "ecg");
        assert!(parsed["drafts"].as_array().unwrap().len() == 1);
    }

    #[test]
    fn artifact_keeps_the_full_draft_history() {
        let mut job = finished_job();
        job.drafts.push(Draft::new(1, Vec::new()));
        job.iteration_count = 1;
        let artifact = ReportArtifact::from_job(&job);
        assert_eq!(artifact.drafts.len(), 2);
        assert_eq!(artifact.iteration_count, 1);
    }

    #[test]
    fn writing_twice_overwrites_deterministically() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuditStore::new(dir.path());
        let job = finished_job();
        let artifact = ReportArtifact::from_job(&job);

        store.write(&artifact).unwrap();
        let first = std::fs::read_to_string(store.artifact_path(job.id)).unwrap();
        store.write(&artifact).unwrap();
        let second = std::fs::read_to_string(store.artifact_path(job.id)).unwrap();
        assert_eq!(first, second);
    }
}
