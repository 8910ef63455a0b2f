use tracing::{debug, info};

use crate::api::ApiError;
use crate::model::{FilterPatch, FilterSpec, View};

use super::cache::{PendingFocus, ViewCache};
use super::error::FetchFailure;
use super::request::{Generation, Request, Ticket};

/// What a filter change asks the caller to do next.
#[derive(Debug)]
pub enum FilterOutcome {
    /// The active spec did not change; nothing to fetch.
    Unchanged,
    /// Send this request; its response goes to [`FilterController::apply`].
    Fetch(Request),
    /// A pre-fetched view matched the new spec and replaces the current one.
    Reused(PendingFocus),
}

#[derive(Debug)]
pub enum Applied {
    Replace(View),
    /// The response belongs to a superseded request and was dropped.
    Stale,
    Failed(FetchFailure),
}

/// Owns the active [`FilterSpec`] and orders fetch results by issue time.
#[derive(Debug)]
pub struct FilterController {
    active: FilterSpec,
    defaults: FilterSpec,
    cap: usize,
    generation: Generation,
    outstanding: Option<Ticket>,
    has_view: bool,
    /// Spec of the view currently on screen.
    applied: Option<FilterSpec>,
}

impl FilterController {
    pub fn new(defaults: FilterSpec, cap: usize) -> Self {
        let defaults = defaults.clamped(cap);
        Self {
            active: defaults,
            defaults,
            cap,
            generation: Generation::default(),
            outstanding: None,
            has_view: false,
            applied: None,
        }
    }

    pub fn active(&self) -> FilterSpec {
        self.active
    }

    pub fn defaults(&self) -> FilterSpec {
        self.defaults
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Lowers the dataset cap once the real edge count is known. Never
    /// raises it past the configured value. Active and default limits are
    /// clamped in place without a refetch.
    pub fn restrict_cap(&mut self, total_edges: usize) {
        if total_edges > 0 && total_edges < self.cap {
            info!(cap = total_edges, "dataset cap lowered to the reported edge count");
            self.cap = total_edges;
            self.active = self.active.clamped(total_edges);
            self.defaults = self.defaults.clamped(total_edges);
            self.applied = self.applied.map(|spec| spec.clamped(total_edges));
        }
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn has_view(&self) -> bool {
        self.has_view
    }

    /// Request for the active spec, used for the first load and retries.
    pub fn refresh(&mut self) -> Request {
        self.issue()
    }

    pub fn set_filter(&mut self, patch: &FilterPatch, cache: &mut ViewCache) -> FilterOutcome {
        let next = self.active.merge(patch, self.cap);

        if let Some(pending) = cache.take_matching(&next) {
            debug!(?next, entity = %pending.focus_entity_id, "reusing pre-fetched view");
            self.active = next;
            self.applied = Some(next);
            self.supersede_outstanding();
            self.has_view = true;
            return FilterOutcome::Reused(pending);
        }

        if let Some(dropped) = cache.invalidate() {
            debug!(target = ?dropped.target, "pending focus invalidated by filter change");
        }

        if next == self.active {
            return FilterOutcome::Unchanged;
        }

        self.active = next;
        FilterOutcome::Fetch(self.issue())
    }

    pub fn reset(&mut self, cache: &mut ViewCache) -> FilterOutcome {
        let defaults = self.defaults;
        self.set_filter(&FilterPatch::replace(defaults), cache)
    }

    pub fn apply(&mut self, ticket: Ticket, result: Result<View, ApiError>) -> Applied {
        if !self.generation.is_current(ticket) || self.outstanding != Some(ticket) {
            debug!(%ticket, "discarding stale network response");
            return Applied::Stale;
        }

        self.outstanding = None;
        match result {
            Ok(view) => {
                self.has_view = true;
                self.applied = Some(view.produced_by());
                Applied::Replace(view)
            }
            Err(error) if self.has_view => {
                // Active tracks the view on screen.
                if let Some(applied) = self.applied {
                    debug!(failed = ?self.active, restored = ?applied, "reverting active filter");
                    self.active = applied;
                }
                Applied::Failed(FetchFailure::FilteredFetch(error))
            }
            Err(error) => Applied::Failed(FetchFailure::InitialLoad(error)),
        }
    }

    fn issue(&mut self) -> Request {
        let ticket = self.generation.next();
        self.outstanding = Some(ticket);
        debug!(%ticket, spec = ?self.active, "issuing network fetch");
        Request::Network {
            ticket,
            spec: self.active,
        }
    }

    fn supersede_outstanding(&mut self) {
        if self.outstanding.take().is_some() {
            // Bumping the generation makes any in-flight response stale.
            self.generation.next();
        }
    }
}
