//! Job lifecycle types.
//!
//! A job owns the raw dictation, every draft the pipeline produced for it,
//! and its position in the processing state machine. Drafts are append-only:
//! revision never rewrites history, it adds a new version.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extraction::ExtractedFact;
use crate::template::InvestigationType;
use crate::validation::critique::Critique;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Doctor-patient conversation, free-form anamnesis.
    History,
    /// Dictated investigation findings, templated.
    Examination,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::History => "history",
            ProcessingMode::Examination => "examination",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Extracting,
    Validating,
    Revising,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Extracting => "extracting",
            JobState::Validating => "validating",
            JobState::Revising => "revising",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

/// One version of the structured report content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub version: u32,
    pub facts: Vec<ExtractedFact>,
    pub overall_confidence: f32,
    /// Verdict of the critique round this draft went through, if any.
    pub validator_feedback: Option<Critique>,
}

impl Draft {
    pub fn new(version: u32, facts: Vec<ExtractedFact>) -> Draft {
        let overall_confidence = crate::confidence::score_draft(&facts);
        Draft {
            version,
            facts,
            overall_confidence,
            validator_feedback: None,
        }
    }

    pub fn rescore(&mut self) {
        self.overall_confidence = crate::confidence::score_draft(&self.facts);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub transcript_text: String,
    pub mode: ProcessingMode,
    /// Caller-forced template; skips classification when set.
    pub template_override: Option<InvestigationType>,
    /// Resolved during extraction (examination mode only).
    pub investigation: Option<InvestigationType>,
    pub drafts: Vec<Draft>,
    /// Revision rounds performed so far.
    pub iteration_count: u32,
    pub state: JobState,
    pub final_report: Option<String>,
    pub error: Option<String>,
    /// Report date; fixed at submission so rendering stays idempotent.
    pub created_on: NaiveDate,
    #[serde(skip, default)]
    cancel: Arc<AtomicBool>,
}

impl Job {
    pub fn new(
        transcript_text: &str,
        mode: ProcessingMode,
        template_override: Option<InvestigationType>,
    ) -> Job {
        Job {
            id: Uuid::new_v4(),
            transcript_text: transcript_text.to_string(),
            mode,
            template_override,
            investigation: None,
            drafts: Vec::new(),
            iteration_count: 0,
            state: JobState::Created,
            final_report: None,
            error: None,
            created_on: chrono::Utc::now().date_naive(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Handle shared with the store so cancellation reaches a claimed job.
    pub(crate) fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn current_draft(&self) -> Option<&Draft> {
        self.drafts.last()
    }

    pub fn current_draft_mut(&mut self) -> Option<&mut Draft> {
        self.drafts.last_mut()
    }
}

/// Caller-facing progress snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: Uuid,
    pub state: JobState,
    pub iteration_count: u32,
    pub confidence: Option<f32>,
    pub progress_hint: String,
    pub final_report: Option<String>,
    pub error: Option<String>,
}

impl JobStatus {
    pub fn snapshot(job: &Job) -> JobStatus {
        let progress_hint = match job.current_draft() {
            Some(draft) => format!(
                "{}, ontwerp {}, betrouwbaarheid {:.2}",
                job.state.as_str(),
                draft.version + 1,
                draft.overall_confidence
            ),
            None => job.state.as_str().to_string(),
        };
        JobStatus {
            id: job.id,
            state: job.state,
            iteration_count: job.iteration_count,
            confidence: job.current_draft().map(|d| d.overall_confidence),
            progress_hint,
            final_report: job.final_report.clone(),
            error: job.error.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
