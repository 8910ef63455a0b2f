use std::fmt;

use crate::api::{ApiError, NetworkApi};
use crate::model::{DatasetStats, Enrichment, FilterSpec, SearchCandidate, View};

/// Generation token attached to an outbound request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub(crate) u64);

impl Ticket {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of [`Ticket`]s. Only the most recently issued ticket
/// is current.
#[derive(Debug, Default)]
pub(crate) struct Generation {
    issued: u64,
}

impl Generation {
    pub(crate) fn next(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub(crate) fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Network { ticket: Ticket, spec: FilterSpec },
    Fallback { job: Ticket, step: usize, spec: FilterSpec },
    Search { ticket: Ticket, query: String, limit: usize },
    Stats,
    EdgeDetail { edge_id: String },
}

#[derive(Debug)]
pub enum Response {
    Network {
        ticket: Ticket,
        result: Result<View, ApiError>,
    },
    Fallback {
        job: Ticket,
        step: usize,
        result: Result<View, ApiError>,
    },
    Search {
        ticket: Ticket,
        result: Result<Vec<SearchCandidate>, ApiError>,
    },
    Stats(Result<DatasetStats, ApiError>),
    EdgeDetail {
        edge_id: String,
        result: Result<Enrichment, ApiError>,
    },
}

impl Request {
    /// Runs the request against `api`. Blocks for the duration of the call.
    pub fn execute(self, api: &dyn NetworkApi) -> Response {
        match self {
            Self::Network { ticket, spec } => Response::Network {
                ticket,
                result: api.network(&spec),
            },
            Self::Fallback { job, step, spec } => Response::Fallback {
                job,
                step,
                result: api.network(&spec),
            },
            Self::Search {
                ticket,
                query,
                limit,
            } => Response::Search {
                ticket,
                result: api.search(&query, limit),
            },
            Self::Stats => Response::Stats(api.stats()),
            Self::EdgeDetail { edge_id } => {
                let result = api.edge_detail(&edge_id);
                Response::EdgeDetail { edge_id, result }
            }
        }
    }

    pub fn is_network_fetch(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Fallback { .. })
    }
}
