// src/types/mod.rs
//! Wire types shared with the pipeline backend

pub mod candidates;
pub mod response;

pub use candidates::{
    count_promoted, AnalysisResult, DeepScrapedCandidate, RankedCandidate, RecommendedAction,
    RoleFitAnalysis, SourcedCandidate, PROMOTION_THRESHOLD,
};
pub use response::{
    OutreachRequest, SourcingRequest, StageRequest, StartRequest, StatusResponse,
    DEFAULT_SEARCH_DEPTH,
};
