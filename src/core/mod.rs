// src/core/mod.rs
//! Core services: configuration, backend client, local state

pub mod config_manager;
pub mod local_store;
pub mod service_client;

pub use config_manager::ConfigManager;
pub use local_store::LocalStore;
pub use service_client::{PipelineApi, ServiceClient};
