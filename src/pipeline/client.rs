// src/pipeline/client.rs
//! Stage controller: validates operator input, applies the local
//! transition, issues the start command and keeps the poller in step.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use super::state::{PipelineState, Stage, StageStatus};
use super::sync::Synchronizer;
use crate::core::{LocalStore, PipelineApi};
use crate::error::ControlError;
use crate::outreach::Outreach;
use crate::types::{SourcingRequest, StageRequest, StartRequest, DEFAULT_SEARCH_DEPTH};
use crate::utils::{normalize_input, normalize_location};

/// Inputs the operator last submitted in this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub role: String,
    pub location: String,
    pub persona: String,
}

pub struct PipelineClient<A: PipelineApi> {
    api: Arc<A>,
    sync: Synchronizer<A>,
    store: LocalStore,
    form: Mutex<SearchForm>,
}

impl<A: PipelineApi> PipelineClient<A> {
    pub fn new(api: A, store: LocalStore, poll_interval: Duration) -> Self {
        let api = Arc::new(api);
        let (state, _) = watch::channel(PipelineState::new());
        Self {
            sync: Synchronizer::new(Arc::clone(&api), state, poll_interval),
            api,
            store,
            form: Mutex::new(SearchForm::default()),
        }
    }

    /// Initial load: the run may already be in progress or finished from
    /// a previous session, so fetch everything once and resume polling if
    /// the backend reports a running stage.
    pub async fn load(&self) {
        self.sync.refresh().await;
        self.sync.reconcile().await;
    }

    pub fn snapshot(&self) -> PipelineState {
        self.sync.state().borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.sync.state().subscribe()
    }

    pub async fn is_polling(&self) -> bool {
        self.sync.is_polling().await
    }

    pub async fn form(&self) -> SearchForm {
        self.form.lock().await.clone()
    }

    pub async fn update_form(&self, update: impl FnOnce(&mut SearchForm)) {
        update(&mut *self.form.lock().await);
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Outreach drafting for analyzed candidates, sharing this client's
    /// backend and local store.
    pub fn outreach(&self) -> Outreach<A> {
        Outreach::new(Arc::clone(&self.api), self.store.clone())
    }

    pub async fn start_sourcing(&self, role: &str, location: &str) -> Result<(), ControlError> {
        let role = normalize_input(role)
            .ok_or_else(|| ControlError::Validation("Enter a target role first.".to_string()))?;
        self.ensure_can_start(Stage::Sourcing)?;

        let location = normalize_location(Some(location));
        self.update_form(|form| {
            form.role = role.clone();
            form.location = location.clone();
        })
        .await;

        let request = StartRequest::Sourcing(SourcingRequest {
            role: role.clone(),
            location,
            search_depth: DEFAULT_SEARCH_DEPTH,
        });

        if let Err(e) = self.store.remember_role(&role).await {
            warn!("Could not retain last search role: {:#}", e);
        }

        self.launch(Stage::Sourcing, request).await
    }

    pub async fn start_ranking(&self, persona: &str) -> Result<(), ControlError> {
        let persona = normalize_input(persona).ok_or_else(|| {
            ControlError::Validation("Describe an ideal candidate persona first.".to_string())
        })?;
        self.ensure_can_start(Stage::Ranking)?;

        self.update_form(|form| form.persona = persona).await;
        let request = self.stage_request().await;
        self.launch(Stage::Ranking, request).await
    }

    pub async fn start_deep_scrape(&self) -> Result<(), ControlError> {
        self.ensure_can_start(Stage::DeepScrape)?;
        let request = self.stage_request().await;
        self.launch(Stage::DeepScrape, request).await
    }

    pub async fn start_analyze(&self) -> Result<(), ControlError> {
        self.ensure_can_start(Stage::Analyze)?;
        let request = self.stage_request().await;
        self.launch(Stage::Analyze, request).await
    }

    /// Inbox check. Only the status message changes; stage statuses are
    /// never touched.
    pub async fn check_replies(&self) -> Result<u64, ControlError> {
        self.set_message("Checking LinkedIn Inbox for replies...");
        match self.api.check_replies().await {
            Ok(count) => {
                info!("Inbox check found {} new replies", count);
                self.set_message(format!(
                    "✅ Inbox check complete. {} new replies detected.",
                    count
                ));
                Ok(count)
            }
            Err(e) => {
                warn!("Inbox check failed: {}", e);
                self.set_message("❌ Failed to check inbox.");
                Err(e.into())
            }
        }
    }

    /// Wait until `stage` leaves `running` and return where it ended.
    pub async fn wait_for(&self, stage: Stage) -> StageStatus {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|state| state.status(stage) != StageStatus::Running)
            .await
            .map(|state| state.status(stage));
        // The sender lives as long as `self`, so the channel cannot close here.
        settled.unwrap_or_else(|_| self.snapshot().status(stage))
    }

    pub async fn shutdown(&self) {
        self.sync.stop().await;
    }

    fn ensure_can_start(&self, stage: Stage) -> Result<(), ControlError> {
        self.sync
            .state()
            .borrow()
            .can_start(stage)
            .map_err(ControlError::Validation)
    }

    async fn stage_request(&self) -> StartRequest {
        let form = self.form.lock().await;
        StartRequest::Stage(StageRequest {
            role: form.role.clone(),
            persona: form.persona.clone(),
        })
    }

    async fn launch(&self, stage: Stage, request: StartRequest) -> Result<(), ControlError> {
        self.sync.state().send_modify(|state| state.begin(stage));
        self.sync.reconcile().await;

        info!("Starting {}", stage);
        match self.api.start_stage(stage, &request).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.sync
                    .state()
                    .send_modify(|state| state.fail(stage, e.to_string()));
                self.sync.reconcile().await;
                Err(e.into())
            }
        }
    }

    fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.sync
            .state()
            .send_modify(|state| state.set_message(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{deep_scraped, ranked, result, sourced, Call, FakeApi};
    use tempfile::TempDir;
    use tokio::time;

    const TICK: Duration = Duration::from_secs(3);

    fn client(dir: &TempDir) -> PipelineClient<FakeApi> {
        PipelineClient::new(
            FakeApi::new(),
            LocalStore::new(dir.path().join("state.toml")),
            TICK,
        )
    }

    fn api(client: &PipelineClient<FakeApi>) -> &FakeApi {
        &client.api
    }

    /// Let one poll tick elapse.
    async fn tick() {
        time::sleep(TICK + Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_sourcing_defaults_location() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);

        client
            .start_sourcing("AI Agent Developer", "")
            .await
            .unwrap();

        let starts = api(&client).starts();
        assert_eq!(
            starts,
            vec![(
                Stage::Sourcing,
                StartRequest::Sourcing(SourcingRequest {
                    role: "AI Agent Developer".to_string(),
                    location: "Pakistan".to_string(),
                    search_depth: 10,
                })
            )]
        );

        let state = client.snapshot();
        assert_eq!(state.status(Stage::Sourcing), StageStatus::Running);
        assert_eq!(state.status_message, "Starting sourcing...");
        assert!(client.is_polling().await);
        assert_eq!(
            client.store().last_role().await,
            Some("AI Agent Developer".to_string())
        );
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_validation_blocks_network_calls() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);

        let err = client.start_sourcing("   ", "Lahore").await.unwrap_err();
        assert_eq!(
            err,
            ControlError::Validation("Enter a target role first.".to_string())
        );

        let err = client.start_ranking("").await.unwrap_err();
        assert!(matches!(err, ControlError::Validation(_)));

        let err = client.start_deep_scrape().await.unwrap_err();
        assert!(matches!(err, ControlError::Validation(_)));

        assert!(api(&client).calls().is_empty());
        assert_eq!(client.snapshot().statuses(), [StageStatus::Idle; 4]);
        assert_eq!(client.store().last_role().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_start_marks_stage_error() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        api(&client).reject_starts("PhantomBuster agent is busy");

        let err = client.start_sourcing("Data Engineer", "Karachi").await;
        assert!(matches!(err, Err(ControlError::Api(_))));

        let state = client.snapshot();
        assert_eq!(state.status(Stage::Sourcing), StageStatus::Error);
        assert_eq!(state.status_message, "PhantomBuster agent is busy");
        assert!(!client.is_polling().await);

        time::sleep(TICK * 5).await;
        assert_eq!(api(&client).count(&Call::Status), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_pipeline_flow_resets_downstream() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        let backend = api(&client);

        client.start_sourcing("AI Agent Developer", "Lahore").await.unwrap();
        backend.set_stage("sourcing_done", "Found 3 candidates");
        backend.set_sourced(vec![sourced("Ayesha"), sourced("Bilal"), sourced("Sana")]);
        tick().await;
        assert_eq!(client.wait_for(Stage::Sourcing).await, StageStatus::Done);
        assert!(!client.is_polling().await);

        client
            .start_ranking("Senior engineer with LangChain experience")
            .await
            .unwrap();
        backend.set_stage("ranking_done", "Ranked");
        backend.set_ranked(vec![
            ranked("Ayesha", 90.0),
            ranked("Bilal", 55.0),
            ranked("Sana", 81.0),
        ]);
        tick().await;
        assert_eq!(client.snapshot().promoted_count(), 2);

        client.start_deep_scrape().await.unwrap();
        backend.set_stage("deep_scrape_done", "Scraped");
        backend.set_deep_scraped(vec![deep_scraped("Ayesha", 90.0), deep_scraped("Sana", 81.0)]);
        tick().await;

        client.start_analyze().await.unwrap();
        backend.set_stage("done", "Analysis complete");
        backend.set_results(vec![result("ayesha", 88), result("sana", 79)]);
        tick().await;

        let state = client.snapshot();
        assert_eq!(state.statuses(), [StageStatus::Done; 4]);
        assert_eq!(state.results.len(), 2);

        let stage_requests: Vec<_> = backend.starts().into_iter().skip(1).collect();
        for (_, req) in &stage_requests {
            assert_eq!(
                req,
                &StartRequest::Stage(StageRequest {
                    role: "AI Agent Developer".to_string(),
                    persona: "Senior engineer with LangChain experience".to_string(),
                })
            );
        }

        // Re-ranking invalidates deep scrape and analysis locally.
        client.start_ranking("Staff-level agent engineer").await.unwrap();
        let state = client.snapshot();
        assert_eq!(state.status(Stage::Sourcing), StageStatus::Done);
        assert_eq!(state.status(Stage::Ranking), StageStatus::Running);
        assert_eq!(state.status(Stage::DeepScrape), StageStatus::Idle);
        assert_eq!(state.status(Stage::Analyze), StageStatus::Idle);
        assert!(state.ranked.is_empty());
        assert!(state.deep_scraped.is_empty());
        assert!(state.results.is_empty());
        assert_eq!(state.sourced.len(), 3);
        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_error_fails_running_stage() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        let backend = api(&client);

        client.start_sourcing("QA Lead", "").await.unwrap();
        backend.set_stage("error", "Sourcing failed: no results");
        tick().await;

        let state = client.snapshot();
        assert_eq!(state.status(Stage::Sourcing), StageStatus::Error);
        assert_eq!(state.status_message, "Sourcing failed: no results");
        assert_eq!(client.wait_for(Stage::Sourcing).await, StageStatus::Error);
        assert!(!client.is_polling().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_resumes_polling_for_running_job() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        api(&client).set_stage("DEEP_SCRAPING", "Scraping profile 2 of 3");

        client.load().await;
        assert_eq!(
            client.snapshot().status(Stage::DeepScrape),
            StageStatus::Running
        );
        assert!(client.is_polling().await);

        api(&client).set_stage("deep_scrape_done", "Scraped 3 profiles");
        tick().await;
        assert!(!client.is_polling().await);
        assert_eq!(api(&client).count(&Call::Status), 2);
    }

    #[tokio::test]
    async fn test_check_replies_leaves_stages_alone() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);

        api(&client).set_replies(Some(3));
        assert_eq!(client.check_replies().await.unwrap(), 3);
        assert_eq!(
            client.snapshot().status_message,
            "✅ Inbox check complete. 3 new replies detected."
        );

        api(&client).set_replies(None);
        assert!(client.check_replies().await.is_err());
        let state = client.snapshot();
        assert_eq!(state.status_message, "❌ Failed to check inbox.");
        assert_eq!(state.statuses(), [StageStatus::Idle; 4]);
        assert!(!client.is_polling().await);
    }
}
