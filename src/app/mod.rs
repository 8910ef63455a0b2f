use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{self, Context};

use disease_explorer::api::{Dispatcher, NetworkApi};
use disease_explorer::config::ExplorerConfig;
use disease_explorer::engine::{Explorer, Phase};
use disease_explorer::export;
use disease_explorer::resize::{PanelResize, PanelSide};
use disease_explorer::style::Theme;
use tracing::{info, warn};

use self::graph::Canvas;
use self::ui::EguiCapture;

mod graph;
mod render_utils;
mod ui;

pub struct ExplorerApp {
    explorer: Explorer,
    dispatcher: Dispatcher,
    canvas: Canvas,
    search_input: String,
    /// Slider value while the user is still dragging it.
    weight_draft: Option<f64>,
    left_panel: PanelResize<EguiCapture>,
    right_panel: PanelResize<EguiCapture>,
    export_path: PathBuf,
    /// A viewport screenshot was requested for export.
    export_requested: bool,
    export_status: Option<String>,
}

impl ExplorerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &ExplorerConfig,
        api: Arc<dyn NetworkApi>,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let dispatcher = Dispatcher::new(api).with_waker(move || ctx.request_repaint());

        let mut explorer = Explorer::new(config);
        explorer.start();
        let canvas = Canvas::new(explorer.event_sender());

        Self {
            explorer,
            dispatcher,
            canvas,
            search_input: String::new(),
            weight_draft: None,
            left_panel: PanelResize::new(PanelSide::Left, 340.0, 240.0, 560.0),
            right_panel: PanelResize::new(PanelSide::Right, 360.0, 260.0, 620.0),
            export_path: config.export_path.clone(),
            export_requested: false,
            export_status: None,
        }
    }

    fn pump(&mut self, now: Instant) {
        for response in self.dispatcher.try_collect() {
            self.explorer.handle(response, now, &mut self.canvas);
        }
        self.explorer.tick(now, &mut self.canvas);
    }

    fn request_export(&mut self, ctx: &Context) {
        self.export_requested = true;
        self.export_status = None;
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
    }

    fn finish_export(&mut self, ctx: &Context) {
        if !self.export_requested {
            return;
        }
        let Some(frame) = ctx.input(|input| {
            input.raw.events.iter().find_map(|event| match event {
                egui::Event::Screenshot { image, .. } => Some(Arc::clone(image)),
                _ => None,
            })
        }) else {
            return;
        };
        self.export_requested = false;

        let Some(canvas) = self.canvas.last_rect() else {
            warn!("canvas export requested before the canvas was drawn");
            return;
        };
        let result = export::canvas_image(&frame, canvas, ctx.pixels_per_point())
            .and_then(|image| export::save_png(&image, &self.export_path));
        self.export_status = Some(match result {
            Ok(()) => {
                info!(path = %self.export_path.display(), "canvas exported");
                format!("Saved {}", self.export_path.display())
            }
            Err(error) => {
                warn!(%error, "canvas export failed");
                error.to_string()
            }
        });
    }

    fn schedule_repaint(&self, ctx: &Context, now: Instant) {
        if self.canvas.is_animating() {
            ctx.request_repaint();
        } else if let Some(deadline) = self.explorer.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.pump(Instant::now());
        self.finish_export(ctx);

        let theme = Theme::from_dark_mode(ctx.style().visuals.dark_mode);
        match self.explorer.phase().clone() {
            Phase::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading disease network...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            Phase::Failed(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the disease network");
                    ui.add_space(6.0);
                    ui.label(error);
                    ui.add_space(10.0);
                    let retry = ui.add_enabled(
                        !self.explorer.is_loading(),
                        egui::Button::new("Retry"),
                    );
                    if retry.clicked() {
                        self.explorer.retry();
                    }
                });
            }
            Phase::Ready => self.show(ctx, theme),
        }

        // Taps recorded while drawing are applied before the next frame.
        let now = Instant::now();
        self.explorer.tick(now, &mut self.canvas);
        self.dispatcher.submit_all(self.explorer.take_requests());
        self.schedule_repaint(ctx, now);
    }
}
