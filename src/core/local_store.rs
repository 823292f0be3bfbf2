// src/core/local_store.rs
//! Small durable client-side state, kept between sessions

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    /// Role of the most recent sourcing submission.
    #[serde(default)]
    pub last_search_role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load stored state; a missing file is an empty state
    pub async fn load(&self) -> Result<StoredState> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(StoredState::default());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read file: {}", self.path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// Write stored state, creating the parent directory when needed
    pub async fn save(&self, state: &StoredState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string(state).context("Failed to serialize client state")?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", self.path.display()))?;

        debug!("Written client state: {}", self.path.display());
        Ok(())
    }

    /// Last role submitted for sourcing. Unreadable state counts as none.
    pub async fn last_role(&self) -> Option<String> {
        match self.load().await {
            Ok(state) => state.last_search_role,
            Err(e) => {
                warn!("Ignoring unreadable client state: {:#}", e);
                None
            }
        }
    }

    pub async fn remember_role(&self, role: &str) -> Result<()> {
        let mut state = self.load().await.unwrap_or_default();
        state.last_search_role = Some(role.to_string());
        self.save(&state).await
    }
}
