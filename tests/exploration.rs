mod common;

use std::time::{Duration, Instant};

use disease_explorer::engine::{Phase, Request, Response, SETTLE_DELAY, SurfaceEvent};
use disease_explorer::model::{FilterPatch, FilterSpec, InterpretabilityFilter, Selection, View};
use pretty_assertions::assert_eq;

use common::{
    FakeBackend, RecordingSurface, entity, explorer, network_requests, pump, relation, tap,
};

fn backend() -> FakeBackend {
    FakeBackend::new(vec![
        relation("A", "B", 9100.0, true),
        relation("A", "C", 8800.0, false),
        relation("B", "C", 8500.0, true),
        relation("C", "D", 50.0, false),
    ])
}

#[test]
fn selecting_a_node_reports_adjacent_relation_stats() {
    let mut explorer = explorer();
    let mut surface = RecordingSurface::default();
    let now = Instant::now();
    explorer.start();

    let requests = explorer.take_requests();
    let (ticket, spec) = requests
        .iter()
        .find_map(|request| match request {
            Request::Network { ticket, spec } => Some((*ticket, *spec)),
            _ => None,
        })
        .expect("initial fetch queued");
    assert_eq!(spec, FilterSpec::new(8400.0, InterpretabilityFilter::All, 500));

    let view = View::new(
        vec![entity("A"), entity("B"), entity("C"), entity("D")],
        vec![
            relation("A", "B", 100.0, true),
            relation("A", "C", 200.0, true),
            relation("A", "D", 300.0, false),
        ],
        spec,
    );
    explorer.handle(Response::Network { ticket, result: Ok(view) }, now, &mut surface);
    assert_eq!(explorer.phase(), &Phase::Ready);

    tap(&mut explorer, &mut surface, SurfaceEvent::TapNode("A".into()), now);

    let Selection::Node(node) = explorer.selection() else {
        panic!("node A should be selected");
    };
    assert_eq!(node.stats.total_edges, 3);
    assert_eq!(node.stats.interpretable_edges, 2);
    assert_eq!(node.stats.avg_weight, 200.0);
    assert_eq!(node.degree, 3);

    let marks = explorer.marks();
    assert_eq!(marks.selected_node.as_deref(), Some("A"));
    assert_eq!(marks.highlighted_nodes.len(), 4);
    assert_eq!(marks.highlighted_relations.len(), 3);
}

#[test]
fn same_filter_twice_does_not_refetch() {
    let api = backend();
    let mut explorer = explorer();
    let mut surface = RecordingSurface::default();
    let now = Instant::now();
    explorer.start();
    pump(&mut explorer, &api, &mut surface, now);
    let calls = api.network_calls();

    explorer.set_filter(FilterPatch::min_weight(8400.0), &mut surface);
    explorer.set_filter(FilterPatch::interpretability(InterpretabilityFilter::All), &mut surface);

    assert_eq!(network_requests(&explorer.take_requests()), 0);
    assert_eq!(api.network_calls(), calls);
}

#[test]
fn resolving_a_hidden_entity_reuses_the_fallback_view() {
    let api = backend();
    let mut explorer = explorer();
    let mut surface = RecordingSurface::default();
    let now = Instant::now();
    explorer.start();
    pump(&mut explorer, &api, &mut surface, now);
    assert!(!explorer.view().is_some_and(|view| view.contains("D")));
    surface.take();
    let initial_calls = api.network_calls();

    explorer.choose_candidate("D", &mut surface);
    pump(&mut explorer, &api, &mut surface, now);

    // One miss at the current weight, one hit with the weight relaxed.
    assert_eq!(api.network_calls(), initial_calls + 2);
    let active = explorer.active_filter();
    assert_eq!(active.min_weight, 0.0);
    assert_eq!(active.limit, explorer.edge_cap());
    assert!(explorer.view().is_some_and(|view| view.contains("D")));
    assert_eq!(explorer.view().map(View::produced_by), Some(active));
    assert!(explorer.pending_focus().is_none());
    assert!(explorer.selection().is_none());

    explorer.tick(now + SETTLE_DELAY - Duration::from_millis(1), &mut surface);
    assert!(explorer.selection().is_none());

    explorer.tick(now + SETTLE_DELAY, &mut surface);
    assert_eq!(explorer.selection().node_id(), Some("D"));
    assert!(surface.take().ends_with(&["fit 50".to_owned(), "center D".to_owned()]));
    assert_eq!(network_requests(&explorer.take_requests()), 0);
}

#[test]
fn unknown_entity_stops_after_three_fallbacks() {
    let api = backend();
    let mut explorer = explorer();
    let mut surface = RecordingSurface::default();
    let now = Instant::now();
    explorer.start();
    pump(&mut explorer, &api, &mut surface, now);
    let before = api.network_calls();
    let view_spec = explorer.view().map(View::produced_by);

    explorer.choose_candidate("Z", &mut surface);
    pump(&mut explorer, &api, &mut surface, now);

    assert_eq!(api.network_calls(), before + 3);
    assert!(!explorer.is_loading());
    assert_eq!(explorer.view().map(View::produced_by), view_spec);
    assert!(explorer.selection().is_none());
}

#[test]
fn filter_change_cancels_resolution_in_flight() {
    let api = backend();
    let mut explorer = explorer();
    let mut surface = RecordingSurface::default();
    let now = Instant::now();
    explorer.start();
    pump(&mut explorer, &api, &mut surface, now);

    explorer.choose_candidate("D", &mut surface);
    let fallback = explorer.take_requests();
    assert_eq!(network_requests(&fallback), 1);

    explorer.set_filter(FilterPatch::limit(2), &mut surface);
    for request in fallback {
        explorer.handle(request.execute(&api), now, &mut surface);
    }
    pump(&mut explorer, &api, &mut surface, now);

    assert_eq!(explorer.active_filter().limit, 2);
    assert_eq!(explorer.view().map(|view| view.produced_by().limit), Some(2));
    explorer.tick(now + SETTLE_DELAY * 2, &mut surface);
    assert!(explorer.selection().is_none());
}

#[test]
fn typeahead_waits_for_the_debounce_window() {
    let api = backend();
    let mut explorer = explorer();
    let mut surface = RecordingSurface::default();
    let now = Instant::now();

    explorer.set_query("dis", now);
    explorer.tick(now + Duration::from_millis(100), &mut surface);
    explorer.set_query("disease c", now + Duration::from_millis(100));
    explorer.tick(now + Duration::from_millis(350), &mut surface);
    assert!(explorer.take_requests().is_empty());

    explorer.tick(now + Duration::from_millis(400), &mut surface);
    let requests = explorer.take_requests();
    assert!(matches!(
        requests.as_slice(),
        [Request::Search { query, .. }] if query == "disease c"
    ));
    for request in requests {
        explorer.handle(request.execute(&api), now, &mut surface);
    }

    let ids = explorer
        .search_results()
        .iter()
        .map(|candidate| candidate.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["C"]);
}
