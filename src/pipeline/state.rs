// src/pipeline/state.rs
//! Local mirror of the four-stage server job.
//!
//! `PipelineState` is a plain value; every user action and every poll
//! result goes through one of its transition methods. Nothing here
//! performs I/O.

use serde::Serialize;
use std::fmt;

use crate::types::{
    count_promoted, AnalysisResult, DeepScrapedCandidate, RankedCandidate, SourcedCandidate,
    StatusResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Sourcing,
    Ranking,
    DeepScrape,
    Analyze,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Sourcing,
        Stage::Ranking,
        Stage::DeepScrape,
        Stage::Analyze,
    ];

    pub fn index(self) -> usize {
        match self {
            Stage::Sourcing => 0,
            Stage::Ranking => 1,
            Stage::DeepScrape => 2,
            Stage::Analyze => 3,
        }
    }

    /// Position shown to the operator, 1-based.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    /// Stages invalidated when this one is (re-)started.
    pub fn downstream(self) -> &'static [Stage] {
        match self {
            Stage::Sourcing => &[Stage::Ranking, Stage::DeepScrape, Stage::Analyze],
            Stage::Ranking => &[Stage::DeepScrape, Stage::Analyze],
            Stage::DeepScrape => &[Stage::Analyze],
            Stage::Analyze => &[],
        }
    }

    pub fn prerequisite(self) -> Option<Stage> {
        match self {
            Stage::Sourcing => None,
            Stage::Ranking => Some(Stage::Sourcing),
            Stage::DeepScrape => Some(Stage::Ranking),
            Stage::Analyze => Some(Stage::DeepScrape),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Sourcing => "Source Candidates",
            Stage::Ranking => "AI Ranking",
            Stage::DeepScrape => "Deep Profile Search",
            Stage::Analyze => "AI Analysis",
        }
    }

    pub fn start_endpoint(self) -> &'static str {
        match self {
            Stage::Sourcing => "/start-sourcing",
            Stage::Ranking => "/start-ranking",
            Stage::DeepScrape => "/start-deep-scrape",
            Stage::Analyze => "/start-analyze",
        }
    }

    /// Status line shown while the start command is in flight.
    pub fn start_message(self) -> &'static str {
        match self {
            Stage::Sourcing => "Starting sourcing...",
            Stage::Ranking => "AI is ranking candidates...",
            Stage::DeepScrape => "Deep scraping top candidate profiles...",
            Stage::Analyze => "Running final AI assessment...",
        }
    }

    /// Action label for the given status, as offered to the operator.
    pub fn action_label(self, status: StageStatus) -> &'static str {
        match (self, status) {
            (Stage::Sourcing, StageStatus::Running) => "Sourcing...",
            (Stage::Sourcing, StageStatus::Done) => "Re-Source",
            (Stage::Sourcing, _) => "Start Sourcing",
            (Stage::Ranking, StageStatus::Running) => "Ranking...",
            (Stage::Ranking, StageStatus::Done) => "Re-Rank",
            (Stage::Ranking, _) => "Start AI Ranking",
            (Stage::DeepScrape, StageStatus::Running) => "Scraping...",
            (Stage::DeepScrape, StageStatus::Done) => "Re-Scrape",
            (Stage::DeepScrape, _) => "Start Deep Scrape",
            (Stage::Analyze, StageStatus::Running) => "Analyzing...",
            (Stage::Analyze, StageStatus::Done) => "Re-Analyze",
            (Stage::Analyze, _) => "Start AI Analysis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageStatus::Idle => "idle",
            StageStatus::Running => "running",
            StageStatus::Done => "done",
            StageStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Stage names the backend reports on `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSignal {
    Running(Stage),
    Finished(Stage),
    Failed,
}

impl StageSignal {
    /// Exact, case-insensitive match. Unknown names (including `idle`)
    /// yield `None`.
    pub fn parse(stage: &str) -> Option<Self> {
        let signal = match stage.to_lowercase().as_str() {
            "sourcing" => Self::Running(Stage::Sourcing),
            "sourcing_done" => Self::Finished(Stage::Sourcing),
            "ranking" => Self::Running(Stage::Ranking),
            "ranking_done" => Self::Finished(Stage::Ranking),
            "deep_scraping" => Self::Running(Stage::DeepScrape),
            "deep_scrape_done" => Self::Finished(Stage::DeepScrape),
            "analyzing" => Self::Running(Stage::Analyze),
            "done" => Self::Finished(Stage::Analyze),
            "error" => Self::Failed,
            _ => return None,
        };
        Some(signal)
    }
}

/// One of the four data snapshots served by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Sourced(Vec<SourcedCandidate>),
    Ranked(Vec<RankedCandidate>),
    DeepScraped(Vec<DeepScrapedCandidate>),
    Results(Vec<AnalysisResult>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    statuses: [StageStatus; 4],
    pub status_message: String,
    pub sourced: Vec<SourcedCandidate>,
    pub ranked: Vec<RankedCandidate>,
    pub deep_scraped: Vec<DeepScrapedCandidate>,
    pub results: Vec<AnalysisResult>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.statuses[stage.index()]
    }

    pub fn statuses(&self) -> [StageStatus; 4] {
        self.statuses
    }

    pub fn any_running(&self) -> bool {
        self.statuses.contains(&StageStatus::Running)
    }

    pub fn promoted_count(&self) -> usize {
        count_promoted(&self.ranked)
    }

    /// Whether the operator may start `stage` now. Mirrors the dashboard
    /// gates: the previous stage finished and produced data.
    pub fn can_start(&self, stage: Stage) -> Result<(), String> {
        if self.status(stage) == StageStatus::Running {
            return Err(format!("{} is already running.", stage.title()));
        }
        let Some(prev) = stage.prerequisite() else {
            return Ok(());
        };
        if self.status(prev) != StageStatus::Done {
            return Err(format!("Finish {} before starting {}.", prev.title(), stage.title()));
        }
        let has_input = match stage {
            Stage::DeepScrape => !self.ranked.is_empty(),
            Stage::Analyze => !self.deep_scraped.is_empty(),
            _ => true,
        };
        if !has_input {
            return Err(format!("{} produced no candidates yet.", prev.title()));
        }
        Ok(())
    }

    /// Mark `stage` running and invalidate its own data and everything
    /// downstream of it.
    pub fn begin(&mut self, stage: Stage) {
        self.statuses[stage.index()] = StageStatus::Running;
        self.clear_data(stage);
        for later in stage.downstream() {
            self.statuses[later.index()] = StageStatus::Idle;
            self.clear_data(*later);
        }
        self.status_message = stage.start_message().to_string();
    }

    /// Start command was rejected or never reached the backend.
    pub fn fail(&mut self, stage: Stage, message: impl Into<String>) {
        self.statuses[stage.index()] = StageStatus::Error;
        self.status_message = message.into();
    }

    /// Apply a `/status` poll result. Returns true when a stage status
    /// changed.
    pub fn apply_status(&mut self, status: &StatusResponse) -> bool {
        self.status_message = status.message.clone();
        let before = self.statuses;
        match StageSignal::parse(&status.stage) {
            Some(StageSignal::Running(stage)) => {
                self.statuses[stage.index()] = StageStatus::Running;
            }
            Some(StageSignal::Finished(stage)) => {
                self.statuses[stage.index()] = StageStatus::Done;
            }
            Some(StageSignal::Failed) => {
                for slot in self.statuses.iter_mut() {
                    if *slot == StageStatus::Running {
                        *slot = StageStatus::Error;
                    }
                }
            }
            None => {}
        }
        before != self.statuses
    }

    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        match snapshot {
            Snapshot::Sourced(list) => self.sourced = list,
            Snapshot::Ranked(list) => self.ranked = list,
            Snapshot::DeepScraped(list) => self.deep_scraped = list,
            Snapshot::Results(list) => self.results = list,
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn clear_data(&mut self, stage: Stage) {
        match stage {
            Stage::Sourcing => self.sourced.clear(),
            Stage::Ranking => self.ranked.clear(),
            Stage::DeepScrape => self.deep_scraped.clear(),
            Stage::Analyze => self.results.clear(),
        }
    }

    pub fn set_status(&mut self, stage: Stage, status: StageStatus) {
        self.statuses[stage.index()] = status;
    }

    /// Number of records the backend currently reports for `stage`.
    pub fn count(&self, stage: Stage) -> usize {
        match stage {
            Stage::Sourcing => self.sourced.len(),
            Stage::Ranking => self.ranked.len(),
            Stage::DeepScrape => self.deep_scraped.len(),
            Stage::Analyze => self.results.len(),
        }
    }
}
