use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::{DatasetStats, Enrichment, FilterSpec, SearchCandidate, View};

use super::wire::{EdgeDetailResponse, ErrorBody, Health, NetworkResponse, SearchResponse};
use super::{ApiError, NetworkApi};

/// Blocking HTTP client for the network backend.
#[derive(Clone, Debug)]
pub struct HttpApi {
    http: Client,
    base_url: Url,
}

impl HttpApi {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, ?query, "api request");

        let response = self.http.get(url.clone()).query(query).send()?;
        let status = response.status();
        debug!(%url, %status, "api response");

        if !status.is_success() {
            return Err(status_error(response));
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(ApiError::Decode)
    }
}

fn status_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let detail = response
        .text()
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
        .and_then(|body| body.detail)
        .unwrap_or_else(|| "Request failed".to_owned());

    ApiError::Status { status, detail }
}

impl NetworkApi for HttpApi {
    fn network(&self, spec: &FilterSpec) -> Result<View, ApiError> {
        let response: NetworkResponse = self.get(&["network"], &spec.query_params())?;
        Ok(response.into_view(*spec))
    }

    fn stats(&self) -> Result<DatasetStats, ApiError> {
        self.get(&["stats"], &[])
    }

    fn search(&self, keyword: &str, limit: usize) -> Result<Vec<SearchCandidate>, ApiError> {
        let response: SearchResponse = self.get(&["search"], &[("keyword", keyword.to_owned())])?;
        Ok(response.into_candidates(limit))
    }

    fn edge_detail(&self, edge_id: &str) -> Result<Enrichment, ApiError> {
        let response: EdgeDetailResponse = self.get(&["edge", edge_id], &[])?;
        Ok(response.into_enrichment())
    }

    fn health(&self) -> Result<Health, ApiError> {
        self.get(&["health"], &[])
    }
}
