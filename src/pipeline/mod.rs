// src/pipeline/mod.rs
//! Four-stage recruiting pipeline: local state, backend sync, stage control

pub mod client;
pub mod state;
pub mod sync;

pub use client::{PipelineClient, SearchForm};
pub use state::{PipelineState, Snapshot, Stage, StageSignal, StageStatus};
pub use sync::Synchronizer;
