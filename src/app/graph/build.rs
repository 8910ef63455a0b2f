use std::collections::HashMap;
use std::time::Instant;

use eframe::egui::{Rect, Vec2};
use tracing::trace;

use disease_explorer::engine::{RenderSurface, SurfaceEvent};
use disease_explorer::layout::LayoutEntry;
use disease_explorer::model::View;

use super::{Canvas, CanvasEdge, CanvasNode, LayoutAnimation, MAX_ZOOM, MIN_ZOOM};

/// World-space diameter reserved around each node when fitting.
const NODE_EXTENT: f32 = 50.0;

impl Canvas {
    /// Where a node ends up once any running layout finishes.
    fn resting_position(&self, node: &CanvasNode) -> Vec2 {
        if self.animation.is_some() {
            node.to
        } else {
            node.position
        }
    }

    fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut positions = self.nodes.iter().map(|node| self.resting_position(node));
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), position| {
            (min.min(position), max.max(position))
        }))
    }

    pub(super) fn apply_fit(&mut self, rect: Rect, padding: f32) {
        let Some((min, max)) = self.bounds() else {
            self.pan = Vec2::ZERO;
            self.zoom = 1.0;
            return;
        };

        let extent = (max - min) + Vec2::splat(NODE_EXTENT);
        let available = (rect.size() - Vec2::splat(padding * 2.0)).max(Vec2::splat(1.0));
        self.zoom = (available.x / extent.x)
            .min(available.y / extent.y)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = -((min + max) * 0.5) * self.zoom;
    }

    /// Moves nodes along the running layout. Returns `true` while it is still
    /// running.
    pub(super) fn step_animation(&mut self, now: Instant) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };

        let t = if animation.duration.is_zero() {
            1.0
        } else {
            now.saturating_duration_since(animation.started).as_secs_f32()
                / animation.duration.as_secs_f32()
        }
        .clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - t).powi(3);

        for node in &mut self.nodes {
            node.position = node.from + (node.to - node.from) * eased;
        }

        if t < 1.0 {
            return true;
        }
        self.animation = None;
        self.emit(SurfaceEvent::LayoutStopped);
        false
    }
}

impl RenderSurface for Canvas {
    fn stop_layout(&mut self) {
        if self.animation.take().is_some() {
            trace!("layout interrupted");
        }
    }

    fn install(&mut self, view: &View) {
        let previous = self
            .nodes
            .drain(..)
            .map(|node| (node.id, node.position))
            .collect::<HashMap<_, _>>();

        self.index_by_id.clear();
        for (index, entity) in view.entities().iter().enumerate() {
            let position = previous.get(&entity.id).copied().unwrap_or(Vec2::ZERO);
            self.index_by_id.insert(entity.id.clone(), index);
            self.nodes.push(CanvasNode {
                id: entity.id.clone(),
                label: entity.label.clone(),
                interpretable: entity.interpretable,
                degree: view.degree(&entity.id),
                position,
                from: position,
                to: position,
            });
        }

        self.edges = view
            .relations()
            .iter()
            .filter_map(|relation| {
                Some(CanvasEdge {
                    id: relation.id.clone(),
                    source: *self.index_by_id.get(&relation.source)?,
                    target: *self.index_by_id.get(&relation.target)?,
                    weight: relation.weight,
                    interpretable: relation.interpretable,
                })
            })
            .collect();

        trace!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            reused = previous.len(),
            "canvas installed"
        );
    }

    fn run_layout(&mut self, view: &View, layout: &LayoutEntry) {
        let targets = layout.positions(view);
        for (entity, target) in view.entities().iter().zip(targets) {
            if let Some(&index) = self.index_by_id.get(&entity.id) {
                let node = &mut self.nodes[index];
                node.from = node.position;
                node.to = target;
            }
        }

        self.animation = Some(LayoutAnimation {
            started: Instant::now(),
            duration: layout.animation,
        });
        if self.nodes.is_empty() || layout.animation.is_zero() {
            self.step_animation(Instant::now());
        }
    }

    fn fit(&mut self, padding: f32) {
        match self.last_rect {
            Some(rect) => self.apply_fit(rect, padding),
            None => self.pending_fit = Some(padding),
        }
    }

    fn center_on(&mut self, entity_id: &str) {
        let Some(&index) = self.index_by_id.get(entity_id) else {
            return;
        };
        let position = self.resting_position(&self.nodes[index]);
        self.pan = -position * self.zoom;
    }

    fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.pan = match self.bounds() {
            Some((min, max)) => -((min + max) * 0.5),
            None => Vec2::ZERO,
        };
    }
}
