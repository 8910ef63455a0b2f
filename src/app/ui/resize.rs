use eframe::egui::{self, Context, CursorIcon, Rangef, Rect, Sense};

use disease_explorer::resize::{CaptureTarget, PanelResize, PointerSample};

/// Cursor and text-selection override held by a panel drag.
pub(in crate::app) struct EguiCapture {
    ctx: Context,
    selectable_labels: bool,
}

impl EguiCapture {
    fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            selectable_labels: true,
        }
    }
}

impl CaptureTarget for EguiCapture {
    fn begin_capture(&mut self) {
        self.selectable_labels = self.ctx.style().interaction.selectable_labels;
        self.ctx
            .style_mut(|style| style.interaction.selectable_labels = false);
        self.ctx.output_mut(|output| {
            output.cursor_icon = CursorIcon::ResizeHorizontal;
        });
    }

    fn end_capture(&mut self) {
        let selectable = self.selectable_labels;
        self.ctx
            .style_mut(|style| style.interaction.selectable_labels = selectable);
        self.ctx.output_mut(|output| {
            output.cursor_icon = CursorIcon::Default;
        });
    }
}

fn pointer_sample(ctx: &Context) -> PointerSample {
    ctx.input(|input| PointerSample {
        x: input.pointer.latest_pos().map_or(0.0, |pos| pos.x),
        primary_down: input.pointer.primary_down(),
        window_focused: input.focused,
        pointer_in_window: input.pointer.hover_pos().is_some(),
    })
}

/// Thin drag handle straddling a panel edge at `edge_x`.
pub(in crate::app) fn resize_handle(
    ctx: &Context,
    id: &'static str,
    panel: &mut PanelResize<EguiCapture>,
    edge_x: f32,
    y_range: Rangef,
) {
    let rect = Rect::from_x_y_ranges(edge_x - 3.0..=edge_x + 3.0, y_range);
    let response = egui::Area::new(egui::Id::new(id))
        .fixed_pos(rect.min)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| ui.allocate_response(rect.size(), Sense::drag()))
        .inner;

    if response.drag_started()
        && let Some(pos) = response.interact_pointer_pos()
    {
        panel.begin(pos.x, EguiCapture::new(ctx));
    }

    if panel.is_dragging() {
        if panel.update(pointer_sample(ctx)) {
            ctx.output_mut(|output| {
                output.cursor_icon = CursorIcon::ResizeHorizontal;
            });
            ctx.request_repaint();
        }
    } else if response.hovered() {
        ctx.output_mut(|output| {
            output.cursor_icon = CursorIcon::ResizeHorizontal;
        });
    }
}
