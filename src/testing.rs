// src/testing.rs
//! In-memory backend used by unit tests

use async_trait::async_trait;
use std::sync::Mutex;

use crate::core::PipelineApi;
use crate::error::ApiError;
use crate::pipeline::state::Stage;
use crate::types::{
    AnalysisResult, DeepScrapedCandidate, OutreachRequest, RankedCandidate, SourcedCandidate,
    StartRequest, StatusResponse,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(Stage, StartRequest),
    Status,
    Sourced,
    Ranked,
    DeepScraped,
    Results,
    Generate { candidate_id: String, role: String },
    Send(OutreachRequest),
    CheckReplies,
}

#[derive(Default)]
struct Backend {
    status: StatusResponse,
    sourced: Vec<SourcedCandidate>,
    ranked: Vec<RankedCandidate>,
    deep_scraped: Vec<DeepScrapedCandidate>,
    results: Vec<AnalysisResult>,
    poll_failure: Option<ApiError>,
    start_failure: Option<ApiError>,
    generate_failure: Option<ApiError>,
    send_failure: Option<ApiError>,
    replies: Option<u64>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeApi {
    backend: Mutex<Backend>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        let mut backend = self.backend.lock().unwrap();
        f(&mut backend)
    }

    pub fn set_stage(&self, stage: &str, message: &str) {
        self.with(|b| {
            b.status = StatusResponse {
                stage: stage.to_string(),
                message: message.to_string(),
                timestamp: None,
            }
        });
    }

    pub fn set_sourced(&self, list: Vec<SourcedCandidate>) {
        self.with(|b| b.sourced = list);
    }

    pub fn set_ranked(&self, list: Vec<RankedCandidate>) {
        self.with(|b| b.ranked = list);
    }

    pub fn set_deep_scraped(&self, list: Vec<DeepScrapedCandidate>) {
        self.with(|b| b.deep_scraped = list);
    }

    pub fn set_results(&self, list: Vec<AnalysisResult>) {
        self.with(|b| b.results = list);
    }

    pub fn fail_polls(&self, failure: Option<ApiError>) {
        self.with(|b| b.poll_failure = failure);
    }

    pub fn reject_starts(&self, detail: &str) {
        self.with(|b| {
            b.start_failure = Some(ApiError::Rejected {
                status: 500,
                detail: detail.to_string(),
            })
        });
    }

    pub fn fail_generate(&self, failure: ApiError) {
        self.with(|b| b.generate_failure = Some(failure));
    }

    pub fn fail_send(&self, failure: Option<ApiError>) {
        self.with(|b| b.send_failure = failure);
    }

    pub fn set_replies(&self, replies: Option<u64>) {
        self.with(|b| b.replies = replies);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|b| b.calls.clone())
    }

    pub fn count(&self, call: &Call) -> usize {
        self.with(|b| b.calls.iter().filter(|c| *c == call).count())
    }

    pub fn starts(&self) -> Vec<(Stage, StartRequest)> {
        self.with(|b| {
            b.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Start(stage, req) => Some((*stage, req.clone())),
                    _ => None,
                })
                .collect()
        })
    }

    fn poll<T>(&self, call: Call, read: impl FnOnce(&Backend) -> T) -> Result<T, ApiError> {
        self.with(|b| {
            b.calls.push(call);
            match &b.poll_failure {
                Some(e) => Err(e.clone()),
                None => Ok(read(b)),
            }
        })
    }
}

#[async_trait]
impl PipelineApi for FakeApi {
    async fn start_stage(&self, stage: Stage, request: &StartRequest) -> Result<(), ApiError> {
        self.with(|b| {
            b.calls.push(Call::Start(stage, request.clone()));
            match &b.start_failure {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        })
    }

    async fn fetch_status(&self) -> Result<StatusResponse, ApiError> {
        self.poll(Call::Status, |b| b.status.clone())
    }

    async fn fetch_sourced(&self) -> Result<Vec<SourcedCandidate>, ApiError> {
        self.poll(Call::Sourced, |b| b.sourced.clone())
    }

    async fn fetch_ranked(&self) -> Result<Vec<RankedCandidate>, ApiError> {
        self.poll(Call::Ranked, |b| b.ranked.clone())
    }

    async fn fetch_deep_scraped(&self) -> Result<Vec<DeepScrapedCandidate>, ApiError> {
        self.poll(Call::DeepScraped, |b| b.deep_scraped.clone())
    }

    async fn fetch_results(&self) -> Result<Vec<AnalysisResult>, ApiError> {
        self.poll(Call::Results, |b| b.results.clone())
    }

    async fn generate_message(&self, candidate_id: &str, role: &str) -> Result<String, ApiError> {
        self.with(|b| {
            b.calls.push(Call::Generate {
                candidate_id: candidate_id.to_string(),
                role: role.to_string(),
            });
            match &b.generate_failure {
                Some(e) => Err(e.clone()),
                None => Ok(format!("Hi {}, let's talk about the {} role.", candidate_id, role)),
            }
        })
    }

    async fn send_outreach(&self, request: &OutreachRequest) -> Result<(), ApiError> {
        self.with(|b| {
            b.calls.push(Call::Send(request.clone()));
            match &b.send_failure {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        })
    }

    async fn check_replies(&self) -> Result<u64, ApiError> {
        self.with(|b| {
            b.calls.push(Call::CheckReplies);
            b.replies
                .ok_or_else(|| ApiError::Transport("connection refused".to_string()))
        })
    }
}

pub fn sourced(name: &str) -> SourcedCandidate {
    SourcedCandidate {
        id: Some(format!("https://linkedin.com/in/{}", name.to_lowercase())),
        name: Some(name.to_string()),
        headline: Some("Engineer".to_string()),
        profile_url: Some(format!("https://linkedin.com/in/{}", name.to_lowercase())),
        ..Default::default()
    }
}

pub fn ranked(name: &str, score: f64) -> RankedCandidate {
    RankedCandidate {
        candidate: sourced(name),
        ai_score: Some(score),
    }
}

pub fn deep_scraped(name: &str, score: f64) -> DeepScrapedCandidate {
    DeepScrapedCandidate {
        ranked: ranked(name, score),
        about: Some("Builds agentic systems in Rust and Python.".to_string()),
        experience_text: Some("Senior Engineer at Acme (2021 - present)".to_string()),
        education_text: None,
    }
}

pub fn result(candidate_id: &str, score: u32) -> AnalysisResult {
    serde_json::from_value(serde_json::json!({
        "candidate_id": candidate_id,
        "candidate_name": candidate_id,
        "overall_score": score,
        "tier": 1,
        "recommended_action": "Shortlist",
        "reasoning_summary": "Strong agent framework experience.",
        "role_fit_analysis": {
            "score": score,
            "strengths": ["LangChain", "Rust", "Distributed systems", "Mentoring"],
            "gaps": [],
            "evidence": "Led the agent platform rewrite."
        },
        "risk_flags": ["Short tenure at last role"]
    }))
    .unwrap()
}
