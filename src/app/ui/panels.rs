use eframe::egui::{self, Align, Context, Layout, RichText};

use disease_explorer::style::{Theme, WARNING};

use super::super::ExplorerApp;
use super::resize::resize_handle;

impl ExplorerApp {
    pub(in crate::app) fn show(&mut self, ctx: &Context, theme: Theme) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Disease Network");
                    ui.separator();
                    for row in self.explorer.statistics().summary().header {
                        ui.label(format!("{}: {}", row.label, row.value));
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "shown: {} nodes / {} edges",
                            self.canvas.node_count(),
                            self.canvas.edge_count()
                        ));
                        if self.explorer.is_loading() {
                            ui.spinner();
                            ui.label("Loading...");
                        }
                    });
                });
            });

        let mut dismissed = false;
        if let Some(message) = self.explorer.banner() {
            egui::TopBottomPanel::top("banner")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(message).color(WARNING));
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            dismissed = ui.button("Dismiss").clicked();
                        });
                    });
                });
        }
        if dismissed {
            self.explorer.dismiss_banner();
        }

        let controls = egui::SidePanel::left("controls")
            .resizable(false)
            .exact_width(self.left_panel.width())
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .show(ui, |ui| self.draw_controls(ui));
            })
            .response
            .rect;

        let details = egui::SidePanel::right("details")
            .resizable(false)
            .exact_width(self.right_panel.width())
            .show(ctx, |ui| self.draw_details(ui))
            .response
            .rect;

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas_toolbar(ui);
            ui.separator();
            let marks = self.explorer.marks();
            self.canvas.draw(ui, marks, theme);
        });

        resize_handle(
            ctx,
            "controls_resize",
            &mut self.left_panel,
            controls.right(),
            controls.y_range(),
        );
        resize_handle(
            ctx,
            "details_resize",
            &mut self.right_panel,
            details.left(),
            details.y_range(),
        );
    }
}
