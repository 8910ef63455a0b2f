use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, trace};

use crate::layout::{LayoutEntry, LayoutRegistry};
use crate::model::{Enrichment, Selection, View};
use crate::style::MarkState;

/// Drawing backend driven by the [`GraphViewController`].
pub trait RenderSurface {
    fn stop_layout(&mut self);
    /// Replaces every drawn element with the contents of `view`.
    fn install(&mut self, view: &View);
    /// Starts moving elements towards `layout`'s positions. The surface
    /// reports [`SurfaceEvent::LayoutStopped`] once they arrive.
    fn run_layout(&mut self, view: &View, layout: &LayoutEntry);
    fn fit(&mut self, padding: f32);
    fn center_on(&mut self, entity_id: &str);
    fn reset_zoom(&mut self);
}

/// Pointer-level events reported by the surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
    TapNode(String),
    TapEdge(String),
    TapBackground,
    LayoutStopped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    NodeFocused,
    EdgeFocused,
}

/// Highlight and selection marks on the drawn elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Marks {
    pub highlighted_nodes: HashSet<String>,
    pub highlighted_relations: HashSet<String>,
    pub selected_node: Option<String>,
    pub selected_relation: Option<String>,
}

impl Marks {
    pub fn clear(&mut self) {
        self.highlighted_nodes.clear();
        self.highlighted_relations.clear();
        self.selected_node = None;
        self.selected_relation = None;
    }

    pub fn is_empty(&self) -> bool {
        self.highlighted_nodes.is_empty()
            && self.highlighted_relations.is_empty()
            && self.selected_node.is_none()
            && self.selected_relation.is_none()
    }

    fn has_highlight(&self) -> bool {
        !self.highlighted_nodes.is_empty()
    }

    pub fn node_state(&self, entity_id: &str) -> MarkState {
        if self.selected_node.as_deref() == Some(entity_id) {
            MarkState::Selected
        } else if self.highlighted_nodes.contains(entity_id) {
            MarkState::Highlighted
        } else if self.has_highlight() {
            MarkState::Dimmed
        } else {
            MarkState::Plain
        }
    }

    pub fn edge_state(&self, relation_id: &str) -> MarkState {
        if self.selected_relation.as_deref() == Some(relation_id) {
            MarkState::Selected
        } else if self.highlighted_relations.contains(relation_id) {
            MarkState::Highlighted
        } else if self.has_highlight() {
            MarkState::Dimmed
        } else {
            MarkState::Plain
        }
    }
}

/// Interaction state machine over the drawn element set.
#[derive(Debug)]
pub struct GraphViewController {
    layouts: LayoutRegistry,
    state: InteractionState,
    marks: Marks,
    selection: Selection,
    events_tx: Sender<SurfaceEvent>,
    events_rx: Receiver<SurfaceEvent>,
    fit_pending: bool,
}

impl GraphViewController {
    pub fn new(layouts: LayoutRegistry) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            layouts,
            state: InteractionState::Idle,
            marks: Marks::default(),
            selection: Selection::None,
            events_tx,
            events_rx,
            fit_pending: false,
        }
    }

    /// Sender the surface pushes its events into. Stays valid for the
    /// lifetime of the controller, across view replacements.
    pub fn event_sender(&self) -> Sender<SurfaceEvent> {
        self.events_tx.clone()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    pub fn active_layout(&self) -> &LayoutEntry {
        self.layouts.active()
    }

    /// Applies every queued surface event. Returns `true` when the
    /// selection changed.
    pub fn drain_events(&mut self, view: Option<&View>, surface: &mut dyn RenderSurface) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            trace!(?event, "surface event");
            changed |= match event {
                SurfaceEvent::TapNode(id) => view.is_some_and(|view| self.tap_node(view, &id)),
                SurfaceEvent::TapEdge(id) => view.is_some_and(|view| self.tap_edge(view, &id)),
                SurfaceEvent::TapBackground => {
                    self.tap_background();
                    true
                }
                SurfaceEvent::LayoutStopped => {
                    self.layout_stopped(surface);
                    false
                }
            };
        }
        changed
    }

    fn reset_marks(&mut self) {
        self.marks.clear();
        self.selection = Selection::None;
        self.state = InteractionState::Idle;
    }

    /// Highlights the node and its 1-hop neighborhood. Ignored for ids the
    /// view does not contain.
    pub fn tap_node(&mut self, view: &View, entity_id: &str) -> bool {
        let (Some(neighborhood), Some(selection)) =
            (view.neighborhood(entity_id), Selection::node(view, entity_id))
        else {
            debug!(entity = %entity_id, "tap on unknown node ignored");
            return false;
        };

        self.reset_marks();
        self.marks.highlighted_nodes = neighborhood.nodes;
        self.marks.highlighted_relations = neighborhood.relations;
        self.marks.selected_node = Some(entity_id.to_owned());
        self.selection = selection;
        self.state = InteractionState::NodeFocused;
        true
    }

    pub fn tap_edge(&mut self, view: &View, relation_id: &str) -> bool {
        let Some(selection) = Selection::edge(view, relation_id) else {
            debug!(relation = %relation_id, "tap on unknown edge ignored");
            return false;
        };

        self.reset_marks();
        self.marks.selected_relation = Some(relation_id.to_owned());
        self.selection = selection;
        self.state = InteractionState::EdgeFocused;
        true
    }

    pub fn tap_background(&mut self) {
        self.reset_marks();
    }

    pub fn view_replaced(&mut self, view: &View, surface: &mut dyn RenderSurface) {
        surface.stop_layout();
        self.reset_marks();
        surface.install(view);
        self.run_active_layout(view, surface);
    }

    /// Fits the surface, then selects and centers on `entity_id`. Returns
    /// `false` (and does nothing) when the view lacks the entity.
    pub fn focus(&mut self, view: &View, entity_id: &str, surface: &mut dyn RenderSurface) -> bool {
        if !view.contains(entity_id) {
            debug!(entity = %entity_id, "focus target not in view");
            return false;
        }

        surface.fit(self.layouts.active().padding);
        let focused = self.tap_node(view, entity_id);
        surface.center_on(entity_id);
        focused
    }

    /// Switches layout and re-runs it; selection and view are untouched.
    pub fn set_layout(
        &mut self,
        name: &str,
        view: Option<&View>,
        surface: &mut dyn RenderSurface,
    ) -> bool {
        if !self.layouts.activate(name) {
            return false;
        }
        if let Some(view) = view {
            surface.stop_layout();
            self.run_active_layout(view, surface);
        }
        true
    }

    fn run_active_layout(&mut self, view: &View, surface: &mut dyn RenderSurface) {
        let layout = self.layouts.active();
        debug!(layout = layout.name, nodes = view.entities().len(), "running layout");
        surface.run_layout(view, layout);
        self.fit_pending = true;
    }

    pub fn layout_stopped(&mut self, surface: &mut dyn RenderSurface) {
        if std::mem::take(&mut self.fit_pending) {
            surface.fit(self.layouts.active().padding);
        }
    }

    pub fn fit_view(&self, surface: &mut dyn RenderSurface) {
        surface.fit(self.layouts.active().padding);
    }

    pub fn reset_zoom(&self, surface: &mut dyn RenderSurface) {
        surface.reset_zoom();
    }

    /// Merges lazily fetched enrichment into the view and, if the edge is
    /// still selected, into the selection.
    pub fn merge_enrichment(&mut self, view: &mut View, relation_id: &str, enrichment: Enrichment) {
        let Some(relation) = view.relation_mut(relation_id) else {
            return;
        };
        relation.enrichment = enrichment;

        if let Selection::Edge(edge) = &mut self.selection {
            if edge.relation.id == relation_id {
                edge.relation.enrichment = relation.enrichment.clone();
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::recording::RecordingSurface;
    use super::*;
    use crate::model::fixtures::{entity, relation, spec};

    fn sample_view() -> View {
        View::new(
            vec![entity("A"), entity("B"), entity("C"), entity("E")],
            vec![
                relation("A", "B", 100.0, true),
                relation("B", "C", 300.0, false),
            ],
            spec(),
        )
    }

    #[test]
    fn node_tap_highlights_the_neighborhood() {
        let view = sample_view();
        let mut controller = GraphViewController::new(LayoutRegistry::default());

        assert!(controller.tap_node(&view, "B"));
        assert_eq!(controller.state(), InteractionState::NodeFocused);
        assert_eq!(controller.marks().node_state("B"), MarkState::Selected);
        assert_eq!(controller.marks().node_state("A"), MarkState::Highlighted);
        assert_eq!(controller.marks().node_state("E"), MarkState::Dimmed);
        assert_eq!(controller.marks().edge_state("A__B"), MarkState::Highlighted);

        let Selection::Node(node) = controller.selection() else {
            panic!("expected a node selection");
        };
        assert_eq!(node.stats.total_edges, 2);
        assert_eq!(node.stats.interpretable_edges, 1);
        assert_eq!(node.stats.avg_weight, 200.0);
    }

    #[test]
    fn edge_tap_clears_previous_highlight() {
        let view = sample_view();
        let mut controller = GraphViewController::new(LayoutRegistry::default());
        controller.tap_node(&view, "B");

        assert!(controller.tap_edge(&view, "B__C"));
        assert_eq!(controller.state(), InteractionState::EdgeFocused);
        assert!(controller.marks().highlighted_nodes.is_empty());
        assert_eq!(controller.marks().edge_state("B__C"), MarkState::Selected);
        assert_eq!(controller.marks().edge_state("A__B"), MarkState::Plain);
        assert_eq!(controller.selection().edge_id(), Some("B__C"));
    }

    #[test]
    fn queued_events_drive_the_state_machine() {
        let view = sample_view();
        let mut surface = RecordingSurface::default();
        let mut controller = GraphViewController::new(LayoutRegistry::default());
        let events = controller.event_sender();

        events.send(SurfaceEvent::TapNode("A".into())).expect("receiver alive");
        events.send(SurfaceEvent::TapBackground).expect("receiver alive");
        assert!(controller.drain_events(Some(&view), &mut surface));

        assert!(controller.selection().is_none());
        assert!(controller.marks().is_empty());
        assert_eq!(controller.state(), InteractionState::Idle);
    }

    #[test]
    fn view_replacement_runs_layout_and_fits_after_it_stops() {
        let view = sample_view();
        let mut surface = RecordingSurface::default();
        let mut controller = GraphViewController::new(LayoutRegistry::default());
        controller.tap_node(&view, "A");

        controller.view_replaced(&view, &mut surface);
        assert!(controller.selection().is_none());
        assert_eq!(surface.take(), vec!["stop", "install 4", "layout circle"]);

        controller.layout_stopped(&mut surface);
        controller.layout_stopped(&mut surface);
        assert_eq!(surface.take(), vec!["fit 50"]);
    }

    #[test]
    fn switching_layout_keeps_the_selection() {
        let view = sample_view();
        let mut surface = RecordingSurface::default();
        let mut controller = GraphViewController::new(LayoutRegistry::default());
        controller.tap_edge(&view, "A__B");

        assert!(controller.set_layout("grid", Some(&view), &mut surface));
        assert_eq!(controller.selection().edge_id(), Some("A__B"));
        assert_eq!(surface.take(), vec!["stop", "layout grid"]);
        assert!(!controller.set_layout("cose", Some(&view), &mut surface));
    }

    #[test]
    fn focus_fits_then_centers() {
        let view = sample_view();
        let mut surface = RecordingSurface::default();
        let mut controller = GraphViewController::new(LayoutRegistry::default());

        assert!(controller.focus(&view, "C", &mut surface));
        assert_eq!(surface.take(), vec!["fit 50", "center C"]);
        assert_eq!(controller.selection().node_id(), Some("C"));

        assert!(!controller.focus(&view, "missing", &mut surface));
        assert!(surface.take().is_empty());
        assert_eq!(controller.selection().node_id(), Some("C"));
    }

    #[test]
    fn enrichment_reaches_the_current_edge_selection() {
        let mut view = sample_view();
        let mut controller = GraphViewController::new(LayoutRegistry::default());
        controller.tap_edge(&view, "A__B");

        let enrichment = Enrichment {
            shared_genes: ["IL6".to_owned()].into_iter().collect(),
            shared_pathways: vec!["Cytokine signaling".into()],
            reason: Some("inflammation".into()),
        };
        controller.merge_enrichment(&mut view, "A__B", enrichment.clone());

        let Selection::Edge(edge) = controller.selection() else {
            panic!("expected an edge selection");
        };
        assert_eq!(edge.relation.enrichment, enrichment);
        assert_eq!(
            view.relation("A__B").map(|r| &r.enrichment),
            Some(&enrichment)
        );
    }
}
