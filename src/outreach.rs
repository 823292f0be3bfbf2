// src/outreach.rs
//! Personalized outreach for analyzed candidates: draft, edit, send.
//!
//! Drafting never fails from the operator's point of view; a generic
//! greeting replaces any backend failure. Sending reports failure and
//! leaves the draft open for another attempt.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::{LocalStore, PipelineApi};
use crate::error::ApiError;
use crate::types::OutreachRequest;
use crate::utils::{normalize_input, outreach_role};

pub const FALLBACK_MESSAGE: &str = "Hi, I saw your profile and would love to chat about a role!";
pub const AUTO_CLOSE_DELAY: Duration = Duration::from_millis(2000);

pub const STATUS_GENERATING: &str = "Generating personalized message...";
pub const STATUS_SENDING: &str = "Launching Phantom...";
pub const STATUS_SENT: &str = "✅ Message Request Sent!";
pub const STATUS_SEND_FAILED: &str = "❌ Failed to send.";
pub const STATUS_UNREACHABLE: &str = "❌ Error connecting to backend.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutreachDraft {
    pub candidate_id: String,
    pub message_text: String,
    pub is_messaging: bool,
    pub is_sending: bool,
    pub status: Option<String>,
    /// Bumped on every open so a pending auto-close only closes the
    /// draft it was scheduled for.
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Rejected,
    Unreachable,
}

pub struct Outreach<A: PipelineApi> {
    api: Arc<A>,
    store: LocalStore,
    draft: Arc<Mutex<OutreachDraft>>,
    closer: Mutex<Option<JoinHandle<()>>>,
    close_delay: Duration,
}

impl<A: PipelineApi> Outreach<A> {
    pub fn new(api: Arc<A>, store: LocalStore) -> Self {
        Self {
            api,
            store,
            draft: Arc::new(Mutex::new(OutreachDraft::default())),
            closer: Mutex::new(None),
            close_delay: AUTO_CLOSE_DELAY,
        }
    }

    pub async fn draft(&self) -> OutreachDraft {
        self.draft.lock().await.clone()
    }

    /// Open the drafting view for `candidate_id` and fill it with a
    /// generated message. `role` defaults to the last search role.
    pub async fn open(&self, candidate_id: &str, role: Option<&str>) -> OutreachDraft {
        self.cancel_auto_close().await;
        {
            let mut draft = self.draft.lock().await;
            draft.generation += 1;
            draft.candidate_id = candidate_id.to_string();
            draft.message_text.clear();
            draft.is_messaging = true;
            draft.is_sending = false;
            draft.status = Some(STATUS_GENERATING.to_string());
        }

        let explicit = role.and_then(normalize_input);
        let retained = match explicit {
            Some(_) => None,
            None => self.store.last_role().await,
        };
        let role = outreach_role(explicit.as_deref(), retained.as_deref());

        let message = match self.api.generate_message(candidate_id, &role).await {
            Ok(message) => message,
            Err(e) => {
                warn!("Outreach draft for {} fell back to greeting: {}", candidate_id, e);
                FALLBACK_MESSAGE.to_string()
            }
        };

        let mut draft = self.draft.lock().await;
        draft.message_text = message;
        draft.status = None;
        draft.clone()
    }

    /// Open a draft with a message written by the operator, skipping
    /// generation.
    pub async fn compose(&self, candidate_id: &str, message: &str) {
        self.cancel_auto_close().await;
        let mut draft = self.draft.lock().await;
        draft.generation += 1;
        draft.candidate_id = candidate_id.to_string();
        draft.message_text = message.to_string();
        draft.is_messaging = true;
        draft.is_sending = false;
        draft.status = None;
    }

    pub async fn edit(&self, text: &str) {
        self.draft.lock().await.message_text = text.to_string();
    }

    /// Close the drafting view without sending.
    pub async fn cancel(&self) {
        self.cancel_auto_close().await;
        let mut draft = self.draft.lock().await;
        draft.is_messaging = false;
        draft.status = None;
    }

    /// Send the current draft. No automatic retry on failure.
    pub async fn send(&self) -> SendOutcome {
        let (request, generation) = {
            let mut draft = self.draft.lock().await;
            draft.is_sending = true;
            draft.status = Some(STATUS_SENDING.to_string());
            (
                OutreachRequest {
                    candidate_id: draft.candidate_id.clone(),
                    personalized_message: draft.message_text.clone(),
                },
                draft.generation,
            )
        };

        let outcome = match self.api.send_outreach(&request).await {
            Ok(()) => SendOutcome::Sent,
            Err(ApiError::Rejected { status, detail }) => {
                warn!("Outreach to {} rejected ({}): {}", request.candidate_id, status, detail);
                SendOutcome::Rejected
            }
            Err(e) => {
                warn!("Outreach to {} failed: {}", request.candidate_id, e);
                SendOutcome::Unreachable
            }
        };

        {
            let mut draft = self.draft.lock().await;
            draft.is_sending = false;
            draft.status = Some(
                match outcome {
                    SendOutcome::Sent => STATUS_SENT,
                    SendOutcome::Rejected => STATUS_SEND_FAILED,
                    SendOutcome::Unreachable => STATUS_UNREACHABLE,
                }
                .to_string(),
            );
        }

        if outcome == SendOutcome::Sent {
            info!("Outreach request sent to {}", request.candidate_id);
            self.schedule_auto_close(generation).await;
        }
        outcome
    }

    async fn schedule_auto_close(&self, generation: u64) {
        let draft = Arc::clone(&self.draft);
        let delay = self.close_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut draft = draft.lock().await;
            if draft.generation == generation {
                draft.is_messaging = false;
                draft.status = None;
            }
        });

        if let Some(previous) = self.closer.lock().await.replace(handle) {
            previous.abort();
        }
    }

    async fn cancel_auto_close(&self) {
        if let Some(handle) = self.closer.lock().await.take() {
            handle.abort();
        }
    }
}
