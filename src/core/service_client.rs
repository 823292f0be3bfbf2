// src/core/service_client.rs
//! HTTP client for the TalentScout pipeline backend - JSON over HTTP for every call

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, trace};

use crate::error::ApiError;
use crate::pipeline::state::Stage;
use crate::types::response::{
    CheckRepliesResponse, DeepScrapedResponse, ErrorDetail, GeneratedMessageResponse,
    RankedResponse, ResultsResponse, SourcedResponse,
};
use crate::types::{
    AnalysisResult, DeepScrapedCandidate, OutreachRequest, RankedCandidate, SourcedCandidate,
    StartRequest, StatusResponse,
};
use crate::utils::cache_buster;

const STATUS_ENDPOINT: &str = "/status";
const SOURCED_ENDPOINT: &str = "/sourced";
const RANKED_ENDPOINT: &str = "/ranked";
const DEEP_SCRAPED_ENDPOINT: &str = "/deep-scraped";
const RESULTS_ENDPOINT: &str = "/results";
const GENERATE_MESSAGE_ENDPOINT: &str = "/generate-message";
const SEND_OUTREACH_ENDPOINT: &str = "/send-outreach";
const CHECK_REPLIES_ENDPOINT: &str = "/check-replies";

/// Operations the pipeline backend exposes to the client.
#[async_trait]
pub trait PipelineApi: Send + Sync + 'static {
    async fn start_stage(&self, stage: Stage, request: &StartRequest) -> Result<(), ApiError>;

    async fn fetch_status(&self) -> Result<StatusResponse, ApiError>;
    async fn fetch_sourced(&self) -> Result<Vec<SourcedCandidate>, ApiError>;
    async fn fetch_ranked(&self) -> Result<Vec<RankedCandidate>, ApiError>;
    async fn fetch_deep_scraped(&self) -> Result<Vec<DeepScrapedCandidate>, ApiError>;
    async fn fetch_results(&self) -> Result<Vec<AnalysisResult>, ApiError>;

    async fn generate_message(&self, candidate_id: &str, role: &str) -> Result<String, ApiError>;
    async fn send_outreach(&self, request: &OutreachRequest) -> Result<(), ApiError>;
    async fn check_replies(&self) -> Result<u64, ApiError>;
}

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// Create new service client with configuration
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// GET that must observe live server state: every request carries a
    /// fresh `t` token and asks intermediaries not to serve a cached copy.
    async fn get_fresh<R>(&self, endpoint: &str) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        trace!("Polling {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("t", cache_buster())])
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        read_json(response).await
    }

    async fn post_json<T>(&self, endpoint: &str, payload: &T) -> Result<Response, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        let response = self.client.post(&url).json(payload).send().await?;
        ensure_success(response).await
    }
}

#[async_trait]
impl PipelineApi for ServiceClient {
    async fn start_stage(&self, stage: Stage, request: &StartRequest) -> Result<(), ApiError> {
        info!("Starting stage '{}' via {}", stage, stage.start_endpoint());
        match self.post_json(stage.start_endpoint(), request).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Stage '{}' was not started: {}", stage, e);
                Err(e)
            }
        }
    }

    async fn fetch_status(&self) -> Result<StatusResponse, ApiError> {
        self.get_fresh(STATUS_ENDPOINT).await
    }

    async fn fetch_sourced(&self) -> Result<Vec<SourcedCandidate>, ApiError> {
        let body: SourcedResponse = self.get_fresh(SOURCED_ENDPOINT).await?;
        Ok(body.sourced)
    }

    async fn fetch_ranked(&self) -> Result<Vec<RankedCandidate>, ApiError> {
        let body: RankedResponse = self.get_fresh(RANKED_ENDPOINT).await?;
        Ok(body.ranked)
    }

    async fn fetch_deep_scraped(&self) -> Result<Vec<DeepScrapedCandidate>, ApiError> {
        let body: DeepScrapedResponse = self.get_fresh(DEEP_SCRAPED_ENDPOINT).await?;
        Ok(body.deep_scraped)
    }

    async fn fetch_results(&self) -> Result<Vec<AnalysisResult>, ApiError> {
        let body: ResultsResponse = self.get_fresh(RESULTS_ENDPOINT).await?;
        Ok(body.results)
    }

    async fn generate_message(&self, candidate_id: &str, role: &str) -> Result<String, ApiError> {
        let url = self.url(GENERATE_MESSAGE_ENDPOINT);
        debug!("Requesting outreach draft for {} ({})", candidate_id, role);

        let response = self
            .client
            .get(&url)
            .query(&[("candidate_id", candidate_id), ("role", role)])
            .send()
            .await?;
        let body: GeneratedMessageResponse = read_json(response).await?;

        body.message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ApiError::Decode("response carried no message".to_string()))
    }

    async fn send_outreach(&self, request: &OutreachRequest) -> Result<(), ApiError> {
        info!("Sending outreach to {}", request.candidate_id);
        self.post_json(SEND_OUTREACH_ENDPOINT, request).await?;
        Ok(())
    }

    async fn check_replies(&self) -> Result<u64, ApiError> {
        let url = self.url(CHECK_REPLIES_ENDPOINT);
        let response = self.client.post(&url).send().await?;
        let body: CheckRepliesResponse = read_json(response).await?;
        Ok(body.replies_found)
    }
}

/// Turn a non-2xx response into `ApiError::Rejected` carrying the
/// backend's detail message.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(ApiError::Rejected {
        status: status.as_u16(),
        detail: rejection_detail(status, &error_text),
    })
}

async fn read_json<R>(response: Response) -> Result<R, ApiError>
where
    R: DeserializeOwned,
{
    let response = ensure_success(response).await?;
    let response_text = response.text().await?;
    serde_json::from_str(&response_text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Extract the `detail` field of an error body, falling back to the raw
/// body and finally to the status line.
pub fn rejection_detail(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorDetail>(body) {
        match parsed.detail {
            Some(serde_json::Value::String(detail)) => return detail,
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("error")
    )
}
