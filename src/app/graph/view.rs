use std::time::Instant;

use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, vec2};

use disease_explorer::engine::{Marks, SurfaceEvent};
use disease_explorer::style::{ElementKind, ElementStyle, MarkState, Theme, element_style, legend};

use super::super::render_utils::{blend_color, circle_visible, draw_background, edge_visible, world_to_screen};
use super::interaction::Hit;
use super::Canvas;

fn draw_legend(painter: &Painter, rect: Rect, theme: Theme) {
    let font = FontId::proportional(12.0);
    let mut origin = rect.left_bottom() + vec2(14.0, -14.0 - 18.0 * 2.0);
    for (label, color) in legend(theme) {
        painter.circle_filled(origin + vec2(6.0, 8.0), 6.0, color);
        painter.text(
            origin + vec2(18.0, 8.0),
            Align2::LEFT_CENTER,
            label,
            font.clone(),
            theme.text(),
        );
        origin.y += 18.0;
    }
}

fn outlined_text(painter: &Painter, position: Pos2, text: &str, color: Color32, outline: Color32) {
    let font = FontId::proportional(12.0);
    for offset in [vec2(-1.0, 0.0), vec2(1.0, 0.0), vec2(0.0, -1.0), vec2(0.0, 1.0)] {
        painter.text(position + offset, Align2::CENTER_TOP, text, font.clone(), outline);
    }
    painter.text(position, Align2::CENTER_TOP, text, font, color);
}

impl Canvas {
    pub(in crate::app) fn draw(&mut self, ui: &mut Ui, marks: &Marks, theme: Theme) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.last_rect = Some(rect);
        if let Some(padding) = self.pending_fit.take() {
            self.apply_fit(rect, padding);
        }

        draw_background(&painter, rect, self.pan, self.zoom, theme);
        self.handle_zoom(ui, rect, &response);
        self.handle_pan(&response);
        if self.step_animation(Instant::now()) {
            ui.ctx().request_repaint();
        }

        if self.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No relations match the current filters.",
                FontId::proportional(14.0),
                theme.text(),
            );
            if response.clicked_by(egui::PointerButton::Primary) {
                self.emit(SurfaceEvent::TapBackground);
            }
            return;
        }

        let zoom_scale = self.zoom.powf(0.40);
        let screen_positions = self
            .nodes
            .iter()
            .map(|node| world_to_screen(rect, self.pan, self.zoom, node.position))
            .collect::<Vec<_>>();
        let node_styles = self
            .nodes
            .iter()
            .map(|node| {
                element_style(
                    ElementKind::Node,
                    node.interpretable,
                    marks.node_state(&node.id),
                    theme,
                )
            })
            .collect::<Vec<_>>();
        let screen_radii = node_styles
            .iter()
            .map(|style| (style.size * 0.5 * zoom_scale).clamp(2.5, 40.0))
            .collect::<Vec<_>>();

        let hovered = self.hit_test(ui, rect, &screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            self.emit(match hovered {
                Some(Hit::Node(index)) => SurfaceEvent::TapNode(self.nodes[index].id.clone()),
                Some(Hit::Edge(index)) => SurfaceEvent::TapEdge(self.edges[index].id.clone()),
                None => SurfaceEvent::TapBackground,
            });
        }

        let mut edge_order = self
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| {
                let style = element_style(
                    ElementKind::Edge {
                        weight: edge.weight,
                    },
                    edge.interpretable,
                    marks.edge_state(&edge.id),
                    theme,
                );
                (index, style)
            })
            .collect::<Vec<(usize, ElementStyle)>>();
        edge_order.sort_by_key(|(_, style)| style.z);

        for (index, style) in edge_order {
            let edge = &self.edges[index];
            let start = screen_positions[edge.source];
            let end = screen_positions[edge.target];
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let mut color = style.stroke_color();
            if hovered == Some(Hit::Edge(index)) {
                color = blend_color(color, theme.text(), 0.35);
            }
            let width = (style.stroke_width * self.zoom.sqrt()).clamp(0.5, 8.0);
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        let mut node_order = (0..self.nodes.len()).collect::<Vec<_>>();
        node_order.sort_by_key(|&index| node_styles[index].z);

        for index in node_order {
            let position = screen_positions[index];
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let node = &self.nodes[index];
            let style = &node_styles[index];
            let is_hovered = hovered == Some(Hit::Node(index));

            let mut fill = style.fill_color();
            if is_hovered {
                fill = blend_color(fill, theme.text(), 0.18);
            }
            painter.circle_filled(position, radius, fill);
            if style.stroke_width > 0.0 {
                painter.circle_stroke(
                    position,
                    radius,
                    Stroke::new(style.stroke_width, style.stroke_color()),
                );
            }

            let marked = matches!(
                marks.node_state(&node.id),
                MarkState::Highlighted | MarkState::Selected
            );
            if marked || is_hovered || radius >= 14.0 {
                outlined_text(
                    &painter,
                    position + vec2(0.0, radius + 4.0),
                    &node.label,
                    theme.text().gamma_multiply(style.opacity),
                    theme.text_outline().gamma_multiply(style.opacity * 0.8),
                );
            }
        }

        draw_legend(&painter, rect, theme);

        let hover_text = match hovered {
            Some(Hit::Node(index)) => {
                let node = &self.nodes[index];
                Some(format!(
                    "{}  |  interpretable: {}  |  {} relations",
                    node.label,
                    node.interpretable.label(),
                    node.degree
                ))
            }
            Some(Hit::Edge(index)) => {
                let edge = &self.edges[index];
                Some(format!(
                    "{} <-> {}  |  weight {:.4}",
                    self.nodes[edge.source].label, self.nodes[edge.target].label, edge.weight
                ))
            }
            None => None,
        };
        if let Some(text) = hover_text {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                theme.text(),
            );
        }
    }
}
