//! Headless exploration engine.
//!
//! [`Explorer`] owns the displayed [`View`] and every piece of interaction
//! state. It never performs I/O: outbound work is queued as [`Request`]s
//! (see [`Explorer::take_requests`]) and results come back through
//! [`Explorer::handle`]. Timers are deadlines checked by [`Explorer::tick`].

mod cache;
mod error;
mod filter;
mod request;
mod search;
mod stats;
mod view;

use std::collections::HashSet;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::ExplorerConfig;
use crate::layout::{LayoutEntry, LayoutRegistry};
use crate::model::{FilterPatch, FilterSpec, SearchCandidate, Selection, View};

pub use cache::{PendingFocus, ViewCache};
pub use error::FetchFailure;
pub use filter::{Applied, FilterController, FilterOutcome};
pub use request::{Request, Response, Ticket};
pub use search::{
    ResolveStep, SearchResolver, TYPEAHEAD_DEBOUNCE, Typeahead, fallback_specs, rank_candidates,
};
pub use stats::{ShareRow, StatRow, StatisticsPresenter, StatsSummary};
pub use view::{GraphViewController, InteractionState, Marks, RenderSurface, SurfaceEvent};

#[cfg(test)]
pub(crate) use view::recording;

/// Wait between installing a search-driven view and focusing the target:
/// the layout animation plus a margin for the final fit.
pub const SETTLE_DELAY: Duration = Duration::from_millis(650);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No view has been shown yet.
    Loading,
    Ready,
    /// The first load failed; only a retry leaves this state.
    Failed(String),
}

#[derive(Debug)]
struct ScheduledFocus {
    at: Instant,
    entity_id: String,
}

pub struct Explorer {
    filter: FilterController,
    cache: ViewCache,
    typeahead: Typeahead,
    resolver: SearchResolver,
    graph: GraphViewController,
    stats: StatisticsPresenter,
    view: Option<View>,
    phase: Phase,
    banner: Option<String>,
    focus: Option<ScheduledFocus>,
    enrichment_requested: HashSet<String>,
    outbox: Vec<Request>,
}

impl Explorer {
    pub fn new(config: &ExplorerConfig) -> Self {
        let mut layouts = LayoutRegistry::default();
        if !layouts.activate(&config.layout) {
            warn!(layout = %config.layout, "unknown layout, using {}", layouts.active().name);
        }

        Self {
            filter: FilterController::new(config.defaults, config.edge_cap),
            cache: ViewCache::new(),
            typeahead: Typeahead::new(config.search_limit),
            resolver: SearchResolver::new(),
            graph: GraphViewController::new(layouts),
            stats: StatisticsPresenter::default(),
            view: None,
            phase: Phase::Loading,
            banner: None,
            focus: None,
            enrichment_requested: HashSet::new(),
            outbox: Vec::new(),
        }
    }

    /// Queues the dataset statistics and the first network fetch.
    pub fn start(&mut self) {
        info!(spec = ?self.filter.active(), "starting explorer");
        self.outbox.push(Request::Stats);
        let request = self.filter.refresh();
        self.outbox.push(request);
    }

    pub fn retry(&mut self) {
        info!("retrying network load");
        if self.view.is_none() {
            self.phase = Phase::Loading;
        }
        if !self.stats.is_loaded() {
            self.outbox.push(Request::Stats);
        }
        let request = self.filter.refresh();
        self.outbox.push(request);
    }

    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    /// Earliest pending timer, so the UI loop knows when to wake up.
    pub fn next_deadline(&self) -> Option<Instant> {
        let focus = self.focus.as_ref().map(|focus| focus.at);
        match (self.typeahead.next_deadline(), focus) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// A filter change made by the user. Cancels any search resolution in
    /// progress.
    pub fn set_filter(&mut self, patch: FilterPatch, surface: &mut dyn RenderSurface) {
        self.resolver.cancel();
        self.focus = None;
        self.apply_filter(&patch, surface);
    }

    pub fn reset_filters(&mut self, surface: &mut dyn RenderSurface) {
        self.resolver.cancel();
        self.focus = None;
        let outcome = self.filter.reset(&mut self.cache);
        self.apply_outcome(outcome, surface);
    }

    fn apply_filter(&mut self, patch: &FilterPatch, surface: &mut dyn RenderSurface) {
        let outcome = self.filter.set_filter(patch, &mut self.cache);
        self.apply_outcome(outcome, surface);
    }

    fn apply_outcome(&mut self, outcome: FilterOutcome, surface: &mut dyn RenderSurface) {
        match outcome {
            FilterOutcome::Unchanged => debug!("filter unchanged, nothing to fetch"),
            FilterOutcome::Fetch(request) => self.outbox.push(request),
            FilterOutcome::Reused(pending) => self.install(pending.view, surface),
        }
    }

    pub fn set_query(&mut self, query: &str, now: Instant) {
        self.typeahead.set_query(query, now);
    }

    /// Jumps to `entity_id`, widening the filter when it is not visible.
    pub fn choose_candidate(&mut self, entity_id: &str, surface: &mut dyn RenderSurface) {
        self.typeahead.clear();
        self.focus = None;

        match self.resolver.resolve(
            entity_id,
            self.view.as_ref(),
            self.filter.active(),
            self.filter.cap(),
        ) {
            ResolveStep::FocusNow(id) => self.focus_now(&id, surface),
            ResolveStep::Fetch(request) => self.outbox.push(request),
            other => debug!(?other, "unexpected resolve step"),
        }
    }

    pub fn set_layout(&mut self, name: &str, surface: &mut dyn RenderSurface) -> bool {
        self.graph.set_layout(name, self.view.as_ref(), surface)
    }

    pub fn fit_view(&self, surface: &mut dyn RenderSurface) {
        self.graph.fit_view(surface);
    }

    pub fn reset_zoom(&self, surface: &mut dyn RenderSurface) {
        self.graph.reset_zoom(surface);
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn handle(&mut self, response: Response, now: Instant, surface: &mut dyn RenderSurface) {
        match response {
            Response::Network { ticket, result } => match self.filter.apply(ticket, result) {
                Applied::Replace(view) => self.install(view, surface),
                Applied::Stale => {}
                Applied::Failed(failure) => self.fail(failure),
            },
            Response::Fallback { job, step, result } => {
                let step = self.resolver.on_fallback(job, step, result, &mut self.cache);
                self.advance_resolve(step, now, surface);
            }
            Response::Search { ticket, result } => {
                self.typeahead.apply(ticket, result);
            }
            Response::Stats(Ok(stats)) => {
                if let Some(total) = stats.total_edges {
                    self.filter
                        .restrict_cap(usize::try_from(total).unwrap_or(usize::MAX));
                }
                self.stats.update(stats);
            }
            Response::Stats(Err(error)) => warn!(%error, "failed to load dataset statistics"),
            Response::EdgeDetail { edge_id, result } => match result {
                Ok(enrichment) => {
                    if let Some(view) = self.view.as_mut() {
                        self.graph.merge_enrichment(view, &edge_id, enrichment);
                    }
                }
                Err(error) => warn!(edge = %edge_id, %error, "failed to load edge details"),
            },
        }
    }

    fn advance_resolve(&mut self, step: ResolveStep, now: Instant, surface: &mut dyn RenderSurface) {
        match step {
            ResolveStep::Fetch(request) => self.outbox.push(request),
            ResolveStep::Hit { target, entity_id } => {
                self.apply_filter(&FilterPatch::replace(target), surface);
                self.focus = Some(ScheduledFocus {
                    at: now + SETTLE_DELAY,
                    entity_id,
                });
            }
            ResolveStep::GiveUp(entity_id) => self.focus_now(&entity_id, surface),
            ResolveStep::FocusNow(entity_id) => self.focus_now(&entity_id, surface),
            ResolveStep::Ignored => {}
        }
    }

    /// Advances timers and applies queued surface events.
    pub fn tick(&mut self, now: Instant, surface: &mut dyn RenderSurface) {
        if let Some(request) = self.typeahead.poll(now) {
            self.outbox.push(request);
        }

        if self.focus.as_ref().is_some_and(|focus| now >= focus.at) {
            if let Some(focus) = self.focus.take() {
                self.focus_now(&focus.entity_id, surface);
            }
        }

        if self.graph.drain_events(self.view.as_ref(), surface) {
            self.request_enrichment();
        }
    }

    fn focus_now(&mut self, entity_id: &str, surface: &mut dyn RenderSurface) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        if self.graph.focus(view, entity_id, surface) {
            info!(entity = %entity_id, "focused entity");
        }
    }

    fn install(&mut self, view: View, surface: &mut dyn RenderSurface) {
        info!(
            nodes = view.entities().len(),
            relations = view.relations().len(),
            spec = ?view.produced_by(),
            "view replaced"
        );
        self.graph.view_replaced(&view, surface);
        self.view = Some(view);
        self.enrichment_requested.clear();
        self.phase = Phase::Ready;
        self.banner = None;
    }

    fn fail(&mut self, failure: FetchFailure) {
        warn!(error = %failure, "network fetch failed");
        if failure.is_terminal() {
            self.phase = Phase::Failed(failure.to_string());
        } else {
            self.banner = Some(failure.to_string());
        }
    }

    /// Asks for edge annotations the first time an unannotated edge is
    /// selected.
    fn request_enrichment(&mut self) {
        let Selection::Edge(edge) = self.graph.selection() else {
            return;
        };
        if !edge.relation.enrichment.is_empty() {
            return;
        }
        let edge_id = edge.relation.id.clone();
        if self.enrichment_requested.insert(edge_id.clone()) {
            self.outbox.push(Request::EdgeDetail { edge_id });
        }
    }

    pub fn event_sender(&self) -> Sender<SurfaceEvent> {
        self.graph.event_sender()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        self.graph.selection()
    }

    pub fn marks(&self) -> &Marks {
        self.graph.marks()
    }

    pub fn interaction(&self) -> InteractionState {
        self.graph.state()
    }

    pub fn active_filter(&self) -> FilterSpec {
        self.filter.active()
    }

    pub fn default_filter(&self) -> FilterSpec {
        self.filter.defaults()
    }

    pub fn edge_cap(&self) -> usize {
        self.filter.cap()
    }

    pub fn is_loading(&self) -> bool {
        self.filter.is_loading() || self.resolver.is_resolving()
    }

    pub fn pending_focus(&self) -> Option<&PendingFocus> {
        self.cache.peek()
    }

    pub fn query(&self) -> &str {
        self.typeahead.query()
    }

    pub fn search_results(&self) -> &[SearchCandidate] {
        self.typeahead.results()
    }

    pub fn is_searching(&self) -> bool {
        self.typeahead.is_searching()
    }

    pub fn statistics(&self) -> &StatisticsPresenter {
        &self.stats
    }

    pub fn layouts(&self) -> &LayoutRegistry {
        self.graph.layouts()
    }

    pub fn active_layout(&self) -> &LayoutEntry {
        self.graph.active_layout()
    }
}

#[cfg(test)]
mod tests {
    use super::recording::RecordingSurface;
    use super::*;
    use crate::api::ApiError;
    use crate::config::RawConfig;
    use crate::model::fixtures::{entity, relation};
    use crate::model::{DatasetStats, Enrichment};

    fn explorer() -> Explorer {
        let config = RawConfig::default().validate().expect("default config is valid");
        Explorer::new(&config)
    }

    fn network_ticket(requests: &[Request]) -> (Ticket, FilterSpec) {
        requests
            .iter()
            .find_map(|request| match request {
                Request::Network { ticket, spec } => Some((*ticket, *spec)),
                _ => None,
            })
            .expect("a network request was queued")
    }

    #[test]
    fn initial_failure_is_terminal_and_retry_recovers() {
        let mut explorer = explorer();
        let mut surface = RecordingSurface::default();
        let now = Instant::now();
        explorer.start();
        let (ticket, _) = network_ticket(&explorer.take_requests());

        explorer.handle(
            Response::Network {
                ticket,
                result: Err(ApiError::Status {
                    status: 503,
                    detail: "Network data not loaded".into(),
                }),
            },
            now,
            &mut surface,
        );
        assert!(matches!(explorer.phase(), Phase::Failed(message) if message.contains("Network data not loaded")));

        explorer.retry();
        assert_eq!(explorer.phase(), &Phase::Loading);
        let requests = explorer.take_requests();
        assert!(requests.contains(&Request::Stats));
        let (ticket, spec) = network_ticket(&requests);
        explorer.handle(
            Response::Network {
                ticket,
                result: Ok(View::new(vec![entity("A")], Vec::new(), spec)),
            },
            now,
            &mut surface,
        );
        assert_eq!(explorer.phase(), &Phase::Ready);
    }

    #[test]
    fn stats_lower_the_edge_cap() {
        let mut explorer = explorer();
        let mut surface = RecordingSurface::default();
        explorer.handle(
            Response::Stats(Ok(DatasetStats {
                total_edges: Some(1500),
                ..DatasetStats::default()
            })),
            Instant::now(),
            &mut surface,
        );

        assert_eq!(explorer.edge_cap(), 1500);
        assert!(explorer.statistics().is_loaded());
    }

    #[test]
    fn unannotated_edge_selection_requests_details_once() {
        let mut explorer = explorer();
        let mut surface = RecordingSurface::default();
        let now = Instant::now();
        explorer.start();
        let (ticket, spec) = network_ticket(&explorer.take_requests());
        let view = View::new(
            vec![entity("A"), entity("B")],
            vec![relation("A", "B", 9000.0, true)],
            spec,
        );
        explorer.handle(Response::Network { ticket, result: Ok(view) }, now, &mut surface);

        let events = explorer.event_sender();
        for _ in 0..2 {
            events
                .send(SurfaceEvent::TapEdge("A__B".into()))
                .expect("receiver alive");
            explorer.tick(now, &mut surface);
        }
        assert_eq!(
            explorer.take_requests(),
            vec![Request::EdgeDetail {
                edge_id: "A__B".into()
            }]
        );

        let enrichment = Enrichment {
            reason: Some("shared inflammatory pathway".into()),
            ..Enrichment::default()
        };
        explorer.handle(
            Response::EdgeDetail {
                edge_id: "A__B".into(),
                result: Ok(enrichment.clone()),
            },
            now,
            &mut surface,
        );
        let Selection::Edge(edge) = explorer.selection() else {
            panic!("edge still selected");
        };
        assert_eq!(edge.relation.enrichment, enrichment);
    }

    #[test]
    fn filtered_fetch_failure_keeps_the_view() {
        let mut explorer = explorer();
        let mut surface = RecordingSurface::default();
        let now = Instant::now();
        explorer.start();
        let (ticket, spec) = network_ticket(&explorer.take_requests());
        explorer.handle(
            Response::Network {
                ticket,
                result: Ok(View::new(vec![entity("A")], Vec::new(), spec)),
            },
            now,
            &mut surface,
        );

        explorer.set_filter(FilterPatch::limit(100), &mut surface);
        let (ticket, _) = network_ticket(&explorer.take_requests());
        assert!(explorer.is_loading());
        explorer.handle(
            Response::Network {
                ticket,
                result: Err(ApiError::InvalidBaseUrl("x".into())),
            },
            now,
            &mut surface,
        );

        assert!(!explorer.is_loading());
        assert_eq!(explorer.phase(), &Phase::Ready);
        assert!(explorer.banner().is_some());
        assert!(explorer.view().is_some_and(|view| view.contains("A")));
        explorer.dismiss_banner();
        assert!(explorer.banner().is_none());
    }
}
