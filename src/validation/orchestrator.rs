//! Validation orchestrator.
//!
//! Drives one job through extract → validate → revise until the reviewer
//! accepts the draft or the iteration cap is hit. Revision only ever
//! downgrades, removes, or re-grounds facts; it never invents values the
//! extractor did not find in the transcript.

use crate::config::PipelineConfig;
use crate::confidence::score_draft;
use crate::extraction::{history, templated, ExtractedFact, FactStatus};
use crate::job::{Draft, Job, JobState, ProcessingMode};
use crate::report::assembler;
use crate::template::{bind_fields, classify_investigation, template_for, InvestigationType};
use crate::transcript::{segmenter, Transcript};

use super::critique::{CritiqueClient, CritiqueError, IssueKind, IssueSeverity};
use super::hallucination::verify_spans;
use super::ValidationError;

pub struct ValidationOrchestrator {
    critique: Box<dyn CritiqueClient>,
    config: PipelineConfig,
}

impl ValidationOrchestrator {
    pub fn new(critique: Box<dyn CritiqueClient>, config: PipelineConfig) -> ValidationOrchestrator {
        ValidationOrchestrator { critique, config }
    }

    /// Processes a job to a terminal state. Never panics, never leaves the
    /// job in a non-terminal state.
    pub fn process(&self, job: &mut Job) {
        let span = tracing::info_span!("process_job", job_id = %job.id, mode = job.mode.as_str());
        let _guard = span.enter();

        match self.run(job) {
            Ok(()) => {
                tracing::info!(
                    state = job.state.as_str(),
                    iterations = job.iteration_count,
                    drafts = job.drafts.len(),
                    "job finished"
                );
            }
            Err(ValidationError::Cancelled) => {
                job.state = JobState::Cancelled;
                tracing::info!("job cancelled");
            }
            Err(err) => {
                // Drafts produced so far are kept for inspection.
                job.error = Some(err.to_string());
                job.state = JobState::Failed;
                tracing::error!(error = %err, "job failed");
            }
        }
    }

    fn run(&self, job: &mut Job) -> Result<(), ValidationError> {
        job.state = JobState::Extracting;
        if job.is_cancelled() {
            return Err(ValidationError::Cancelled);
        }

        let transcript = segmenter::segment(&job.transcript_text)?;
        let facts = self.extract(job, &transcript);
        job.drafts.push(Draft::new(0, facts));

        loop {
            job.state = JobState::Validating;
            if job.is_cancelled() {
                return Err(ValidationError::Cancelled);
            }

            // Local grounding check first: an external reviewer never sees a
            // draft whose confirmed facts are unverifiable.
            if let Some(draft) = job.current_draft_mut() {
                let verification = verify_spans(&mut draft.facts, transcript.text())?;
                if !verification.is_clean() {
                    tracing::warn!(
                        fields = ?verification.downgraded,
                        "downgraded unverifiable facts before critique"
                    );
                    draft.rescore();
                }
            }

            let facts_snapshot: Vec<ExtractedFact> = job
                .current_draft()
                .map(|d| d.facts.clone())
                .unwrap_or_default();
            let verdict = match self.critique.critique(&facts_snapshot, transcript.text()) {
                Ok(verdict) => verdict,
                Err(CritiqueError::Timeout(secs)) => {
                    // Local checks already ran; ship the draft rather than
                    // blocking the report on a slow reviewer.
                    tracing::warn!(
                        timeout_secs = secs,
                        "critique service timed out, completing with local validation only"
                    );
                    finalize(job);
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            if job.is_cancelled() {
                // Verdict arrived after cancellation; discard it.
                return Err(ValidationError::Cancelled);
            }
            if let Some(draft) = job.current_draft_mut() {
                draft.validator_feedback = Some(verdict.clone());
            }

            if verdict.acceptable {
                finalize(job);
                return Ok(());
            }
            if job.iteration_count >= self.config.max_iterations {
                tracing::warn!(
                    iterations = job.iteration_count,
                    "iteration cap reached, completing with open issues"
                );
                finalize(job);
                return Ok(());
            }

            job.state = JobState::Revising;
            job.iteration_count += 1;
            let (version, facts) = match job.current_draft() {
                Some(d) => (d.version + 1, d.facts.clone()),
                None => (1, Vec::new()),
            };
            let revised = self.revise(job, &transcript, facts, &verdict.issues);
            tracing::info!(
                iteration = job.iteration_count,
                version,
                confidence = score_draft(&revised),
                "draft revised"
            );
            job.drafts.push(Draft::new(version, revised));
        }
    }

    fn extract(&self, job: &mut Job, transcript: &Transcript) -> Vec<ExtractedFact> {
        match job.mode {
            ProcessingMode::History => history::extract_history(transcript),
            ProcessingMode::Examination => {
                let investigation =
                    classify_investigation(transcript.text(), job.template_override);
                job.investigation = Some(investigation);
                let template = template_for(investigation);
                let candidates = templated::extract_template_fields(transcript, template);
                bind_fields(template, candidates)
            }
        }
    }

    /// Applies reviewer issues to a fact set.
    fn revise(
        &self,
        job: &Job,
        transcript: &Transcript,
        mut facts: Vec<ExtractedFact>,
        issues: &[super::critique::CritiqueIssue],
    ) -> Vec<ExtractedFact> {
        let mut removals: Vec<String> = Vec::new();

        for issue in issues {
            match issue.kind {
                IssueKind::Unsupported => {
                    let Some(fact) = facts.iter_mut().find(|f| f.field_name == issue.field) else {
                        continue;
                    };
                    match fact.status {
                        FactStatus::Confirmed => {
                            fact.downgrade(&format!("validatie: {}", issue.reason));
                        }
                        FactStatus::Ambiguous if issue.severity == IssueSeverity::Critical => {
                            removals.push(fact.field_name.clone());
                        }
                        _ => {}
                    }
                }
                IssueKind::Terminology => {
                    if let Some(fact) = facts.iter_mut().find(|f| f.field_name == issue.field) {
                        fact.append_note(&format!("terminologie: {}", issue.reason));
                    }
                }
                IssueKind::MissingField => {
                    self.refill_missing(job, transcript, &mut facts, &issue.field);
                }
            }
        }

        if !removals.is_empty() {
            tracing::warn!(fields = ?removals, "removing facts the transcript cannot support");
            let template = match job.mode {
                ProcessingMode::Examination => Some(template_for(
                    job.investigation.unwrap_or(InvestigationType::Generic),
                )),
                ProcessingMode::History => None,
            };
            for field in &removals {
                // A required template field keeps its slot: the report must
                // show the hole, not drop the line.
                let keeps_slot = template
                    .and_then(|t| t.field(field))
                    .is_some_and(|spec| spec.required);
                if keeps_slot {
                    if let Some(slot) = facts.iter_mut().find(|f| &f.field_name == field) {
                        *slot = ExtractedFact::missing(field);
                    }
                } else {
                    facts.retain(|f| &f.field_name != field);
                }
            }
        }
        facts
    }

    /// Re-runs the extractor for one reported-missing field and fills the
    /// slot when a grounded candidate exists.
    fn refill_missing(
        &self,
        job: &Job,
        transcript: &Transcript,
        facts: &mut [ExtractedFact],
        field: &str,
    ) {
        let candidates: Vec<ExtractedFact> = match job.mode {
            ProcessingMode::History => history::extract_history(transcript),
            ProcessingMode::Examination => {
                let template =
                    template_for(job.investigation.unwrap_or(InvestigationType::Generic));
                templated::extract_template_fields(transcript, template)
            }
        };
        let Some(found) = candidates
            .into_iter()
            .filter(|c| c.field_name == field && c.status != FactStatus::Missing)
            .max_by_key(|c| c.span.map_or(0, |s| s.start))
        else {
            tracing::debug!(field, "reviewer reported a missing field the transcript cannot fill");
            return;
        };
        if let Some(slot) = facts
            .iter_mut()
            .find(|f| f.field_name == field && f.status == FactStatus::Missing)
        {
            *slot = found;
        }
    }
}

/// Renders the final report from the last draft and completes the job.
fn finalize(job: &mut Job) {
    if let Some(draft) = job.drafts.last() {
        for warning in
            crate::confidence::confidence_warnings(draft.overall_confidence, &draft.facts)
        {
            tracing::warn!(%warning, "report caution");
        }
        job.final_report = Some(assembler::render(
            job.mode,
            job.investigation,
            draft,
            job.created_on,
        ));
    }
    job.state = JobState::Completed;
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
