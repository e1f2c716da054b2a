//! External critique service client.
//!
//! The reviewer receives the draft facts plus the full transcript and answers
//! with a structured verdict. The trait seam keeps the orchestrator testable
//! without a running service; the HTTP client speaks the local Ollama-style
//! generate API with bounded retries.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{PipelineConfig, APP_VERSION};
use crate::extraction::ExtractedFact;

// ═══════════════════════════════════════════════════════════
// Verdict types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl IssueSeverity {
    fn parse(s: &str) -> IssueSeverity {
        match s.to_lowercase().as_str() {
            "critical" | "kritiek" => IssueSeverity::Critical,
            "high" | "hoog" => IssueSeverity::High,
            "low" | "laag" => IssueSeverity::Low,
            _ => IssueSeverity::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The fact is not supported by the transcript.
    Unsupported,
    /// Wrong or non-standard medical wording.
    Terminology,
    /// The transcript mentions something the draft omitted.
    MissingField,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueIssue {
    pub field: String,
    pub reason: String,
    pub severity: IssueSeverity,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub acceptable: bool,
    pub issues: Vec<CritiqueIssue>,
}

impl Critique {
    pub fn accept() -> Critique {
        Critique {
            acceptable: true,
            issues: Vec::new(),
        }
    }

    pub fn has_unsupported(&self) -> bool {
        self.issues.iter().any(|i| i.kind == IssueKind::Unsupported)
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum CritiqueError {
    #[error("cannot reach critique service: {0}")]
    Connection(String),

    #[error("critique request timed out after {0}s")]
    Timeout(u64),

    #[error("critique service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("critique response was not valid JSON: {0}")]
    MalformedResponse(String),
}

impl CritiqueError {
    /// Connection blips, timeouts and transient service errors are worth a
    /// retry; a malformed verdict usually is too (models misformat once).
    pub fn is_retryable(&self) -> bool {
        match self {
            CritiqueError::Connection(_) | CritiqueError::Timeout(_) => true,
            CritiqueError::Service { status, .. } => *status >= 500,
            CritiqueError::MalformedResponse(_) => true,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Trait seam
// ═══════════════════════════════════════════════════════════

pub trait CritiqueClient: Send + Sync {
    /// Reviews a draft's facts against the transcript they claim to cite.
    fn critique(&self, facts: &[ExtractedFact], transcript: &str)
        -> Result<Critique, CritiqueError>;
}

// ═══════════════════════════════════════════════════════════
// HTTP client
// ═══════════════════════════════════════════════════════════

const SYSTEM_PROMPT: &str = "You are a strict medical report reviewer for Dutch \
cardiology dictations. You receive extracted facts with source spans and the \
full transcript. Flag every fact the transcript does not literally support, \
every non-standard medical term, and every clearly dictated value the draft \
missed. Never invent findings. Answer with JSON only: \
{\"acceptable\": bool, \"issues\": [{\"field\", \"reason\", \"severity\", \"kind\"}]} \
where kind is one of unsupported, terminology, missing_field.";

pub struct HttpCritiqueClient {
    base_url: String,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
    client: reqwest::blocking::Client,
}

impl HttpCritiqueClient {
    /// Timeout and retry budget come from the pipeline configuration.
    pub fn new(base_url: &str, model: &str, config: &PipelineConfig) -> HttpCritiqueClient {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("cardioscribe/{APP_VERSION}"))
            .timeout(Duration::from_secs(config.critique_timeout_secs))
            .build()
            .unwrap_or_default();
        HttpCritiqueClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout_secs: config.critique_timeout_secs,
            max_retries: config.critique_retries,
            client,
        }
    }

    fn call_once(&self, prompt: &str) -> Result<Critique, CritiqueError> {
        let body = serde_json::json!({
            "model": self.model,
            "system": SYSTEM_PROMPT,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": 0.0 }
        });
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    CritiqueError::Timeout(self.timeout_secs)
                } else {
                    CritiqueError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CritiqueError::Service {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            response: String,
        }
        let generated: GenerateResponse = response
            .json()
            .map_err(|e| CritiqueError::MalformedResponse(e.to_string()))?;
        parse_verdict(&generated.response)
    }
}

impl CritiqueClient for HttpCritiqueClient {
    fn critique(
        &self,
        facts: &[ExtractedFact],
        transcript: &str,
    ) -> Result<Critique, CritiqueError> {
        let prompt = build_prompt(facts, transcript);
        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            match self.call_once(&prompt) {
                Ok(verdict) => return Ok(verdict),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    tracing::warn!(attempt = attempt + 1, error = %err, "critique attempt failed, retrying");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or(CritiqueError::Connection("no attempts made".to_string())))
    }
}

fn build_prompt(facts: &[ExtractedFact], transcript: &str) -> String {
    let facts_json = serde_json::to_string_pretty(facts).unwrap_or_else(|_| "[]".to_string());
    format!("TRANSCRIPT:\n{transcript}\n\nEXTRACTED FACTS:\n{facts_json}\n\nReview the facts against the transcript.")
}

/// Parses the model output into a verdict, tolerating a markdown fence and
/// leading prose around the JSON object.
fn parse_verdict(raw: &str) -> Result<Critique, CritiqueError> {
    let json = extract_json_block(raw)
        .ok_or_else(|| CritiqueError::MalformedResponse("no JSON object found".to_string()))?;

    #[derive(Deserialize)]
    struct RawIssue {
        #[serde(default)]
        field: String,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        severity: Option<String>,
        #[serde(default)]
        kind: Option<String>,
    }
    #[derive(Deserialize)]
    struct RawVerdict {
        #[serde(default)]
        acceptable: Option<bool>,
        #[serde(default)]
        issues: Vec<RawIssue>,
    }

    let raw_verdict: RawVerdict =
        serde_json::from_str(json).map_err(|e| CritiqueError::MalformedResponse(e.to_string()))?;

    let issues: Vec<CritiqueIssue> = raw_verdict
        .issues
        .into_iter()
        .map(|i| {
            let kind = match i.kind.as_deref() {
                Some("terminology") => IssueKind::Terminology,
                Some("missing_field") | Some("missing") => IssueKind::MissingField,
                Some("unsupported") => IssueKind::Unsupported,
                // Unknown kinds default to the safe interpretation.
                _ => IssueKind::Unsupported,
            };
            CritiqueIssue {
                field: i.field,
                reason: i.reason,
                severity: IssueSeverity::parse(i.severity.as_deref().unwrap_or("medium")),
                kind,
            }
        })
        .collect();

    let acceptable = raw_verdict
        .acceptable
        .unwrap_or_else(|| !issues.iter().any(|i| i.kind == IssueKind::Unsupported));
    Ok(Critique { acceptable, issues })
}

fn extract_json_block(raw: &str) -> Option<&str> {
    if let Some(start) = raw.find("```json") {
        let rest = &raw[start + 7..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

// ═══════════════════════════════════════════════════════════
// Scripted client for tests
// ═══════════════════════════════════════════════════════════

/// One scripted reply of the mock reviewer.
pub enum ScriptedReply {
    Verdict(Critique),
    Timeout,
    Unavailable,
}

/// Deterministic `CritiqueClient` used by orchestrator tests: pops scripted
/// replies in order and accepts everything once the script runs out.
pub struct MockCritiqueClient {
    script: Mutex<VecDeque<ScriptedReply>>,
}

impl MockCritiqueClient {
    pub fn scripted(replies: Vec<ScriptedReply>) -> MockCritiqueClient {
        MockCritiqueClient {
            script: Mutex::new(replies.into()),
        }
    }

    pub fn accepting() -> MockCritiqueClient {
        MockCritiqueClient::scripted(Vec::new())
    }

    pub fn rejection(field: &str, kind: IssueKind, severity: IssueSeverity) -> ScriptedReply {
        ScriptedReply::Verdict(Critique {
            acceptable: false,
            issues: vec![CritiqueIssue {
                field: field.to_string(),
                reason: "gemarkeerd door validatie".to_string(),
                severity,
                kind,
            }],
        })
    }
}

impl CritiqueClient for MockCritiqueClient {
    fn critique(
        &self,
        _facts: &[ExtractedFact],
        _transcript: &str,
    ) -> Result<Critique, CritiqueError> {
        let reply = self
            .script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        match reply {
            None => Ok(Critique::accept()),
            Some(ScriptedReply::Verdict(v)) => Ok(v),
            Some(ScriptedReply::Timeout) => Err(CritiqueError::Timeout(60)),
            Some(ScriptedReply::Unavailable) => {
                Err(CritiqueError::Connection("connection refused".to_string()))
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
