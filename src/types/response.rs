// src/types/response.rs
use serde::{Deserialize, Serialize};

use super::candidates::{
    null_as_default, AnalysisResult, DeepScrapedCandidate, RankedCandidate, SourcedCandidate,
};

// ===== Stage-start Requests =====

/// Number of search results requested from the sourcing stage.
pub const DEFAULT_SEARCH_DEPTH: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcingRequest {
    pub role: String,
    pub location: String,
    pub search_depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRequest {
    pub role: String,
    pub persona: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StartRequest {
    Sourcing(SourcingRequest),
    Stage(StageRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachRequest {
    pub candidate_id: String,
    pub personalized_message: String,
}

// ===== Service Response Types =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub stage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SourcedResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sourced: Vec<SourcedCandidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankedResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ranked: Vec<RankedCandidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeepScrapedResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub deep_scraped: Vec<DeepScrapedCandidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<AnalysisResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedMessageResponse {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRepliesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub replies_found: u64,
}

/// Error body returned by the backend on rejected requests.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub detail: Option<serde_json::Value>,
}
