use std::time::{Duration, Instant};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::model::{FilterSpec, SearchCandidate, View};

use super::cache::{PendingFocus, ViewCache};
use super::error::FetchFailure;
use super::request::{Generation, Request, Ticket};

pub const TYPEAHEAD_DEBOUNCE: Duration = Duration::from_millis(300);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Orders candidates by how well their label matches `query`. Candidates
/// that do not match at all keep their server order after the matches.
pub fn rank_candidates(candidates: &mut [SearchCandidate], query: &str) {
    let matcher = SkimMatcherV2::default();
    candidates.sort_by_cached_key(|candidate| {
        let score = fuzzy_match_score(&matcher, &candidate.label, query)
            .or_else(|| fuzzy_match_score(&matcher, &candidate.id, query));
        std::cmp::Reverse(score)
    });
}

/// Debounced typeahead. Each keystroke restarts the debounce window and
/// invalidates any search already in flight.
#[derive(Debug)]
pub struct Typeahead {
    query: String,
    limit: usize,
    deadline: Option<Instant>,
    generation: Generation,
    outstanding: Option<Ticket>,
    results: Vec<SearchCandidate>,
}

impl Typeahead {
    pub fn new(limit: usize) -> Self {
        Self {
            query: String::new(),
            limit: limit.max(1),
            deadline: None,
            generation: Generation::default(),
            outstanding: None,
            results: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchCandidate] {
        &self.results
    }

    pub fn is_searching(&self) -> bool {
        self.deadline.is_some() || self.outstanding.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn set_query(&mut self, query: &str, now: Instant) {
        if query.trim() == self.query.trim() {
            self.query = query.to_owned();
            return;
        }
        self.query = query.to_owned();
        self.generation.next();
        self.outstanding = None;

        if query.trim().is_empty() {
            self.deadline = None;
            self.results.clear();
        } else {
            self.deadline = Some(now + TYPEAHEAD_DEBOUNCE);
        }
    }

    /// Drops the query, its results and anything pending.
    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.deadline = None;
        self.outstanding = None;
        self.generation.next();
    }

    /// Issues the search once the debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Request> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;

        let ticket = self.generation.next();
        self.outstanding = Some(ticket);
        debug!(%ticket, query = %self.query, "typeahead search");
        Some(Request::Search {
            ticket,
            query: self.query.trim().to_owned(),
            limit: self.limit,
        })
    }

    /// Returns `false` when the response was stale and ignored.
    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<SearchCandidate>, ApiError>,
    ) -> bool {
        if self.outstanding != Some(ticket) || !self.generation.is_current(ticket) {
            debug!(%ticket, "discarding stale search response");
            return false;
        }
        self.outstanding = None;

        match result {
            Ok(mut candidates) => {
                candidates.truncate(self.limit);
                rank_candidates(&mut candidates, self.query.trim());
                self.results = candidates;
            }
            Err(error) => {
                warn!(error = %FetchFailure::Search(error), "typeahead failed");
                self.results.clear();
            }
        }
        true
    }
}

/// Filter specs tried in order when a chosen entity is not on screen.
pub fn fallback_specs(current: FilterSpec, cap: usize) -> [FilterSpec; 3] {
    [
        FilterSpec { limit: cap, ..current }.clamped(cap),
        FilterSpec {
            min_weight: 0.0,
            limit: cap,
            ..current
        }
        .clamped(cap),
        FilterSpec::permissive(cap),
    ]
}

#[derive(Debug, PartialEq)]
pub enum ResolveStep {
    /// The entity is already visible.
    FocusNow(String),
    /// Fetch the next fallback candidate.
    Fetch(Request),
    /// A candidate view contains the entity; adopt `target` as the active
    /// filter. The view itself was stored in the [`ViewCache`].
    Hit { target: FilterSpec, entity_id: String },
    /// Every candidate was tried without a match.
    GiveUp(String),
    /// The response belongs to a cancelled or superseded job.
    Ignored,
}

#[derive(Debug)]
struct ResolveJob {
    ticket: Ticket,
    entity_id: String,
    candidates: [FilterSpec; 3],
    step: usize,
}

/// Walks the fallback list one fetch at a time until some candidate view
/// contains the requested entity.
#[derive(Debug, Default)]
pub struct SearchResolver {
    generation: Generation,
    job: Option<ResolveJob>,
}

impl SearchResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resolving(&self) -> bool {
        self.job.is_some()
    }

    pub fn target(&self) -> Option<&str> {
        self.job.as_ref().map(|job| job.entity_id.as_str())
    }

    pub fn cancel(&mut self) {
        if let Some(job) = self.job.take() {
            debug!(entity = %job.entity_id, "resolve cancelled");
            self.generation.next();
        }
    }

    pub fn resolve(
        &mut self,
        entity_id: &str,
        view: Option<&View>,
        current: FilterSpec,
        cap: usize,
    ) -> ResolveStep {
        self.cancel();

        if view.is_some_and(|view| view.contains(entity_id)) {
            return ResolveStep::FocusNow(entity_id.to_owned());
        }

        let ticket = self.generation.next();
        let candidates = fallback_specs(current, cap);
        info!(entity = %entity_id, "entity not in view, trying wider filters");
        let job = ResolveJob {
            ticket,
            entity_id: entity_id.to_owned(),
            candidates,
            step: 0,
        };
        let request = Request::Fallback {
            job: ticket,
            step: 0,
            spec: candidates[0],
        };
        self.job = Some(job);
        ResolveStep::Fetch(request)
    }

    pub fn on_fallback(
        &mut self,
        ticket: Ticket,
        step: usize,
        result: Result<View, ApiError>,
        cache: &mut ViewCache,
    ) -> ResolveStep {
        let Some(job) = self.job.as_mut() else {
            return ResolveStep::Ignored;
        };
        if job.ticket != ticket || job.step != step {
            debug!(%ticket, step, "discarding stale fallback response");
            return ResolveStep::Ignored;
        }

        let target = job.candidates[step];
        match result {
            Ok(view) if view.contains(&job.entity_id) => {
                let entity_id = job.entity_id.clone();
                debug!(entity = %entity_id, step, ?target, "fallback hit");
                cache.store(PendingFocus {
                    target,
                    view,
                    focus_entity_id: entity_id.clone(),
                });
                self.job = None;
                return ResolveStep::Hit { target, entity_id };
            }
            Ok(_) => debug!(entity = %job.entity_id, step, "fallback miss"),
            Err(error) => {
                warn!(error = %FetchFailure::Search(error), step, "fallback fetch failed");
            }
        }

        job.step += 1;
        match job.candidates.get(job.step) {
            Some(&spec) => ResolveStep::Fetch(Request::Fallback {
                job: ticket,
                step: job.step,
                spec,
            }),
            None => {
                let entity_id = job.entity_id.clone();
                info!(entity = %entity_id, "entity not found under any filter");
                self.job = None;
                ResolveStep::GiveUp(entity_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InterpretabilityFilter;
    use crate::model::fixtures::{entity, spec};

    const CAP: usize = 20_000;

    fn candidate(id: &str, label: &str) -> SearchCandidate {
        SearchCandidate {
            id: id.to_owned(),
            label: label.to_owned(),
            relation_count: 1,
        }
    }

    fn view_with(spec: FilterSpec, ids: &[&str]) -> View {
        View::new(ids.iter().map(|id| entity(id)).collect(), Vec::new(), spec)
    }

    fn search_ticket(request: Option<Request>) -> Ticket {
        match request {
            Some(Request::Search { ticket, .. }) => ticket,
            other => panic!("expected a search request, got {other:?}"),
        }
    }

    #[test]
    fn debounce_restarts_on_every_keystroke() {
        let start = Instant::now();
        let mut typeahead = Typeahead::new(10);

        typeahead.set_query("as", start);
        typeahead.set_query("ast", start + Duration::from_millis(200));
        assert!(typeahead.poll(start + Duration::from_millis(350)).is_none());

        let request = typeahead.poll(start + Duration::from_millis(500));
        assert!(matches!(request, Some(Request::Search { ref query, .. }) if query == "ast"));
        assert!(typeahead.poll(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn trailing_whitespace_keeps_the_pending_search() {
        let start = Instant::now();
        let mut typeahead = Typeahead::new(10);

        typeahead.set_query("asthma", start);
        typeahead.set_query("asthma ", start + Duration::from_millis(200));
        let ticket = search_ticket(typeahead.poll(start + TYPEAHEAD_DEBOUNCE));

        typeahead.set_query("asthma  ", start + Duration::from_millis(400));
        assert!(typeahead.next_deadline().is_none());
        assert!(typeahead.apply(ticket, Ok(vec![candidate("a", "Asthma")])));
        assert_eq!(typeahead.results().len(), 1);
    }

    #[test]
    fn stale_search_response_does_not_overwrite_newer_query() {
        let start = Instant::now();
        let mut typeahead = Typeahead::new(10);

        typeahead.set_query("asth", start);
        let first = search_ticket(typeahead.poll(start + TYPEAHEAD_DEBOUNCE));
        typeahead.set_query("asthma", start + Duration::from_millis(400));

        assert!(!typeahead.apply(first, Ok(vec![candidate("x", "Asthenia")])));
        assert!(typeahead.results().is_empty());

        let second = search_ticket(typeahead.poll(start + Duration::from_secs(1)));
        assert!(typeahead.apply(second, Ok(vec![candidate("a", "Asthma")])));
        assert_eq!(typeahead.results().len(), 1);
    }

    #[test]
    fn blank_query_clears_results_and_cancels() {
        let start = Instant::now();
        let mut typeahead = Typeahead::new(10);
        typeahead.set_query("flu", start);
        let ticket = search_ticket(typeahead.poll(start + TYPEAHEAD_DEBOUNCE));

        typeahead.set_query("  ", start + Duration::from_millis(310));
        assert!(!typeahead.is_searching());
        assert!(!typeahead.apply(ticket, Ok(vec![candidate("f", "Influenza")])));
        assert!(typeahead.results().is_empty());
    }

    #[test]
    fn results_are_truncated_and_failures_are_empty() {
        let start = Instant::now();
        let mut typeahead = Typeahead::new(2);
        typeahead.set_query("itis", start);
        let ticket = search_ticket(typeahead.poll(start + TYPEAHEAD_DEBOUNCE));
        let many = vec![
            candidate("1", "Arthritis"),
            candidate("2", "Bronchitis"),
            candidate("3", "Colitis"),
        ];
        assert!(typeahead.apply(ticket, Ok(many)));
        assert_eq!(typeahead.results().len(), 2);

        typeahead.set_query("itis x", start + Duration::from_secs(1));
        let ticket = search_ticket(typeahead.poll(start + Duration::from_secs(2)));
        assert!(typeahead.apply(ticket, Err(ApiError::InvalidBaseUrl("x".into()))));
        assert!(typeahead.results().is_empty());
    }

    #[test]
    fn ranking_prefers_closer_labels() {
        let mut candidates = vec![
            candidate("1", "Zygomycosis"),
            candidate("2", "Diabetes mellitus"),
            candidate("3", "Diabetes insipidus"),
        ];
        rank_candidates(&mut candidates, "diabetes m");
        let order = candidates.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["2", "1", "3"]);
    }

    #[test]
    fn fallback_order_widens_step_by_step() {
        let current = FilterSpec::new(8400.0, InterpretabilityFilter::Yes, 500);
        let [first, second, third] = fallback_specs(current, CAP);

        assert_eq!(first, FilterSpec::new(8400.0, InterpretabilityFilter::Yes, CAP));
        assert_eq!(second, FilterSpec::new(0.0, InterpretabilityFilter::Yes, CAP));
        assert_eq!(third, FilterSpec::new(0.0, InterpretabilityFilter::All, CAP));
    }

    #[test]
    fn visible_entity_focuses_without_fetch() {
        let mut resolver = SearchResolver::new();
        let view = view_with(spec(), &["A", "B"]);

        let step = resolver.resolve("B", Some(&view), spec(), CAP);
        assert_eq!(step, ResolveStep::FocusNow("B".into()));
        assert!(!resolver.is_resolving());
    }

    #[test]
    fn miss_everywhere_uses_exactly_three_fetches() {
        let mut resolver = SearchResolver::new();
        let mut cache = ViewCache::new();
        let view = view_with(spec(), &["A"]);

        let mut step = resolver.resolve("Z", Some(&view), spec(), CAP);
        let mut fetches = 0;
        while let ResolveStep::Fetch(Request::Fallback { job, step: index, spec }) = step {
            fetches += 1;
            step = resolver.on_fallback(job, index, Ok(view_with(spec, &["A"])), &mut cache);
        }

        assert_eq!(fetches, 3);
        assert_eq!(step, ResolveStep::GiveUp("Z".into()));
        assert!(!cache.is_live());
    }

    #[test]
    fn failed_candidate_counts_as_a_miss() {
        let mut resolver = SearchResolver::new();
        let mut cache = ViewCache::new();

        let ResolveStep::Fetch(Request::Fallback { job, .. }) =
            resolver.resolve("D", None, spec(), CAP)
        else {
            panic!("expected the first fallback fetch");
        };
        let next = resolver.on_fallback(
            job,
            0,
            Err(ApiError::InvalidBaseUrl("x".into())),
            &mut cache,
        );
        let ResolveStep::Fetch(Request::Fallback { step: 1, spec: second, .. }) = next else {
            panic!("expected the second fallback fetch");
        };

        let hit = resolver.on_fallback(job, 1, Ok(view_with(second, &["D"])), &mut cache);
        assert_eq!(
            hit,
            ResolveStep::Hit {
                target: second,
                entity_id: "D".into()
            }
        );
        assert_eq!(cache.peek().map(|p| p.target), Some(second));
    }

    #[test]
    fn newer_resolve_supersedes_older() {
        let mut resolver = SearchResolver::new();
        let mut cache = ViewCache::new();

        let ResolveStep::Fetch(Request::Fallback { job: old, spec: old_spec, .. }) =
            resolver.resolve("X", None, spec(), CAP)
        else {
            panic!("expected a fetch");
        };
        let _ = resolver.resolve("Y", None, spec(), CAP);

        let step = resolver.on_fallback(old, 0, Ok(view_with(old_spec, &["X"])), &mut cache);
        assert_eq!(step, ResolveStep::Ignored);
        assert_eq!(resolver.target(), Some("Y"));
        assert!(!cache.is_live());
    }
}
