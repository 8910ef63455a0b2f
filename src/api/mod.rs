mod client;
mod dispatch;
mod wire;

use crate::model::{DatasetStats, Enrichment, FilterSpec, SearchCandidate, View};

pub use client::HttpApi;
pub use dispatch::Dispatcher;
pub use wire::Health;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected response payload: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("base url cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}

/// Read-only queries against the network backend.
pub trait NetworkApi: Send + Sync {
    fn network(&self, spec: &FilterSpec) -> Result<View, ApiError>;
    fn stats(&self) -> Result<DatasetStats, ApiError>;
    fn search(&self, keyword: &str, limit: usize) -> Result<Vec<SearchCandidate>, ApiError>;
    fn edge_detail(&self, edge_id: &str) -> Result<Enrichment, ApiError>;
    fn health(&self) -> Result<Health, ApiError>;
}
