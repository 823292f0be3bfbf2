// src/lib.rs
//! TalentScout client: drives a four-stage recruiting pipeline on a remote
//! backend (source, rank, deep scrape, analyze) and handles outreach to
//! analyzed candidates.

pub mod cli;
pub mod core;
pub mod error;
pub mod outreach;
pub mod pipeline;
pub mod render;
pub mod shell;
pub mod types;
pub mod utils;

#[cfg(test)]
mod testing;

pub use crate::core::{ConfigManager, LocalStore, PipelineApi, ServiceClient};
pub use error::{ApiError, ControlError};
pub use outreach::{Outreach, OutreachDraft, SendOutcome};
pub use pipeline::{PipelineClient, PipelineState, SearchForm, Stage, StageStatus};
