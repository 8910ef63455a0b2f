//! Immediate-mode drawing surface driven by the explorer engine.
//!
//! The canvas keeps its own copy of what is drawn (ids, positions, degree)
//! so painting never needs the engine's view. Pointer events go back to the
//! engine through the [`SurfaceEvent`] channel.

mod build;
mod interaction;
mod view;

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use eframe::egui::{Rect, Vec2};

use disease_explorer::engine::SurfaceEvent;
use disease_explorer::model::Interpretability;

const MIN_ZOOM: f32 = 0.005;
const MAX_ZOOM: f32 = 10.0;

pub(in crate::app) struct Canvas {
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
    index_by_id: HashMap<String, usize>,
    pan: Vec2,
    zoom: f32,
    animation: Option<LayoutAnimation>,
    /// Fit requested before the canvas had a size.
    pending_fit: Option<f32>,
    last_rect: Option<Rect>,
    events: Sender<SurfaceEvent>,
}

struct CanvasNode {
    id: String,
    label: String,
    interpretable: Interpretability,
    degree: usize,
    position: Vec2,
    from: Vec2,
    to: Vec2,
}

struct CanvasEdge {
    id: String,
    source: usize,
    target: usize,
    weight: f64,
    interpretable: Interpretability,
}

#[derive(Clone, Copy)]
struct LayoutAnimation {
    started: Instant,
    duration: Duration,
}

impl Canvas {
    pub(in crate::app) fn new(events: Sender<SurfaceEvent>) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index_by_id: HashMap::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            animation: None,
            pending_fit: None,
            last_rect: None,
            events,
        }
    }

    pub(in crate::app) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(in crate::app) fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(in crate::app) fn last_rect(&self) -> Option<Rect> {
        self.last_rect
    }

    pub(in crate::app) fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Queues an event as if it came from the pointer, for example a click
    /// on a relation in the details panel.
    pub(in crate::app) fn emit(&self, event: SurfaceEvent) {
        let _ = self.events.send(event);
    }
}
