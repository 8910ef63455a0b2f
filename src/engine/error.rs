use crate::api::ApiError;

/// Failures surfaced by the engine, classified by how the UI reacts.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    /// No view has ever been shown; the UI switches to a full error state.
    #[error("failed to load the network: {0}")]
    InitialLoad(#[source] ApiError),
    /// A refresh failed while a view is on screen; the view is kept.
    #[error("failed to apply filters: {0}")]
    FilteredFetch(#[source] ApiError),
    /// Typeahead or fallback lookup failed; treated as an empty result.
    #[error("search failed: {0}")]
    Search(#[source] ApiError),
}

impl FetchFailure {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InitialLoad(_))
    }
}
